pub mod finding;
pub mod history;
pub mod target;

pub use finding::{Finding, SessionResult, Severity};
pub use history::ScanHistoryEntry;
pub use target::{Chain, DispatchRecord, ScanTarget, TargetSource};

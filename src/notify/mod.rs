pub mod channel;
pub mod ledger;
pub mod notifier;

pub use channel::{NotificationChannel, StdoutChannel, WebhookChannel};
pub use ledger::SentLedger;
pub use notifier::{finding_hash, FindingsNotifier};

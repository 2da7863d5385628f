pub mod backend;
pub mod prompt;

pub use backend::{AgentBackend, HttpAgentBackend, SessionOutput, SessionSummary};
pub use prompt::{audit_prompt, batch_audit_prompt};

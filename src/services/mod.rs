pub mod agent;
pub mod anthropic;
pub mod charts;
pub mod loader;
pub mod orchestrator;
pub mod profile;
pub mod prompts;
pub mod query;
pub mod render;
pub mod session;
pub mod tools;

pub use agent::{AgentFactory, AgentOutput, AnalystAgent};
pub use anthropic::AnthropicAgentFactory;
pub use orchestrator::{Orchestrator, Reply};
pub use session::{Session, SessionStore};

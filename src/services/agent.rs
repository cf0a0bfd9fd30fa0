use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AgentError;
use crate::models::dataset::Dataset;

/// Final answer of one agent run, plus the charts its tool calls produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentOutput {
    pub output: String,
    pub charts: Vec<PathBuf>,
}

impl AgentOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            charts: Vec::new(),
        }
    }
}

/// An agent bound to one dataset
#[async_trait]
pub trait AnalystAgent: Send + Sync {
    async fn invoke(&self, input: &str) -> Result<AgentOutput, AgentError>;
}

/// Builds a fresh agent whenever a dataset is loaded
pub trait AgentFactory: Send + Sync {
    fn bind(&self, dataset: Arc<Dataset>) -> Arc<dyn AnalystAgent>;
}

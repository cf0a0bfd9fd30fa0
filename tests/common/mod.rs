#![allow(dead_code)]

use andy_analyst::error::AgentError;
use andy_analyst::models::dataset::Dataset;
use andy_analyst::services::{AgentFactory, AgentOutput, AnalystAgent, Orchestrator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const SALES_CSV: &str = "date,category,amount\n\
    2024-01-01,Books,12.5\n\
    2024-01-02,Games,40\n\
    2024-01-03,Books,7.25\n\
    2024-01-04,Music,19.99\n\
    2024-01-05,Games,55\n\
    2024-01-06,Books,3\n\
    2024-01-07,Music,11\n\
    2024-01-08,Games,23.5\n\
    2024-01-09,Books,8\n\
    2024-01-10,Music,14\n";

/// Answers with a canned reply naming the dataset; can be switched to fail
pub struct ScriptedFactory {
    pub calls: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct ScriptedAgent {
    filename: String,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl AnalystAgent for ScriptedAgent {
    async fn invoke(&self, _input: &str) -> Result<AgentOutput, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentError::Malformed("connection reset".to_string()));
        }
        Ok(AgentOutput::text(format!("Books lead in {}", self.filename)))
    }
}

impl AgentFactory for ScriptedFactory {
    fn bind(&self, dataset: Arc<Dataset>) -> Arc<dyn AnalystAgent> {
        Arc::new(ScriptedAgent {
            filename: dataset.filename().to_string(),
            calls: self.calls.clone(),
            fail: self.fail.clone(),
        })
    }
}

pub fn orchestrator(factory: ScriptedFactory) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(Arc::new(factory), 10, 3))
}

use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::models::conversation::MemoryWindow;
use crate::models::dataset::Dataset;
use crate::services::agent::{AgentFactory, AnalystAgent};
use crate::services::prompts::{
    initial_analysis, CONTEXT_HEADER, EMPTY_ANSWER_MESSAGE, NO_DATA_MESSAGE, QUICK_ACTIONS,
};
use crate::services::session::Session;

/// What the user sees after asking something
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub charts: Vec<PathBuf>,
    /// The agent call failed; nothing was recorded
    pub failed: bool,
}

impl Reply {
    fn notice(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            charts: Vec::new(),
            failed: false,
        }
    }

    fn failure(text: String) -> Self {
        Self {
            text,
            charts: Vec::new(),
            failed: true,
        }
    }
}

/// Turns questions into agent calls and keeps session memory consistent
pub struct Orchestrator {
    factory: Arc<dyn AgentFactory>,
    memory_window: usize,
    context_pairs: usize,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn AgentFactory>, memory_window: usize, context_pairs: usize) -> Self {
        Self {
            factory,
            memory_window,
            context_pairs,
        }
    }

    pub fn from_config(config: &Config, factory: Arc<dyn AgentFactory>) -> Self {
        Self::new(factory, config.memory_window, config.context_pairs)
    }

    pub fn memory_window(&self) -> usize {
        self.memory_window
    }

    pub fn bind(&self, dataset: Arc<Dataset>) -> Arc<dyn AnalystAgent> {
        self.factory.bind(dataset)
    }

    /// The question, followed by the newest exchanges when there are any
    pub fn build_context(&self, memory: &MemoryWindow, question: &str) -> String {
        if memory.is_empty() || self.context_pairs == 0 {
            return question.to_string();
        }
        format!(
            "{}{}{}",
            question,
            CONTEXT_HEADER,
            memory.render_tail(self.context_pairs)
        )
    }

    pub async fn ask(&self, session: &mut Session, question: &str) -> Reply {
        let agent = match session.agent() {
            Some(agent) => agent,
            None => return Reply::notice(NO_DATA_MESSAGE),
        };

        let context = self.build_context(session.memory(), question);
        info!("💬 Session {} asking: {}", session.id(), question);

        match agent.invoke(&context).await {
            Ok(output) => {
                let answer = if output.output.trim().is_empty() {
                    warn!("⚠️ Agent returned an empty answer");
                    EMPTY_ANSWER_MESSAGE.to_string()
                } else {
                    output.output
                };
                session.record_exchange(question, &answer, output.charts.clone());
                Reply {
                    text: answer,
                    charts: output.charts,
                    failed: false,
                }
            }
            Err(e) => {
                error!("❌ Agent call failed for session {}: {}", session.id(), e);
                Reply::failure(format!("🚨 Oops! I encountered an error: {}", e))
            }
        }
    }

    /// First look at newly loaded data; `None` once it has already run
    pub async fn initial_analysis(&self, session: &mut Session) -> Option<Reply> {
        if session.initial_analysis_done() {
            return None;
        }
        let (agent, dataset) = match (session.agent(), session.dataset()) {
            (Some(agent), Some(dataset)) => (agent, dataset),
            _ => return Some(Reply::notice(NO_DATA_MESSAGE)),
        };

        let prompt = initial_analysis(&dataset);
        info!("🔎 Running initial analysis of {}", dataset.filename());

        match agent.invoke(&prompt).await {
            Ok(output) => {
                let answer = if output.output.trim().is_empty() {
                    EMPTY_ANSWER_MESSAGE.to_string()
                } else {
                    output.output
                };
                session.record_initial_analysis(&prompt, &answer, output.charts.clone());
                Some(Reply {
                    text: answer,
                    charts: output.charts,
                    failed: false,
                })
            }
            Err(e) => {
                error!("❌ Initial analysis failed: {}", e);
                Some(Reply::failure(format!(
                    "🚨 Oops! I encountered an error: {}",
                    e
                )))
            }
        }
    }

    /// Ask one of the fixed shortcut questions; `None` for an unknown index
    pub async fn quick_action(&self, session: &mut Session, index: usize) -> Option<Reply> {
        let (_, question) = QUICK_ACTIONS.get(index)?;
        Some(self.ask(session, question).await)
    }
}

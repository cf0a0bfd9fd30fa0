//! Anthropic Messages API agent with a tool-use loop.
//!
//! Each `invoke` starts a fresh exchange: the question goes out with the
//! dataset-bound system prompt and tool definitions; while the model stops
//! with `tool_use`, the requested tools run locally and their results are
//! sent back. Conversation memory is carried in the question text by the
//! orchestrator, not here.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AgentError;
use crate::models::dataset::Dataset;
use crate::services::agent::{AgentFactory, AgentOutput, AnalystAgent};
use crate::services::charts::ChartTemplates;
use crate::services::prompts::system_prompt;
use crate::services::render::ChartRenderer;
use crate::services::tools::Toolbox;

pub const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.0;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [Message],
    tools: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: Content,
}

impl Message {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Content::Text(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

impl MessagesResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn wants_tools(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use")
            && self
                .content
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// Agent bound to one dataset
pub struct AnthropicAgent {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    system: String,
    toolbox: Toolbox,
    max_iterations: usize,
}

impl AnthropicAgent {
    fn request<'a>(&'a self, messages: &'a [Message]) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: &self.system,
            messages,
            tools: self.toolbox.definitions(),
        }
    }

    async fn send(
        &self,
        api_key: &str,
        messages: &[Message],
    ) -> Result<MessagesResponse, AgentError> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        debug!("Sending {} messages to {}", messages.len(), url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.request(messages))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("❌ Anthropic API error: Status {}, Details: {}", status, body);
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("❌ Failed to parse Anthropic response: {}", e);
            AgentError::Malformed(e.to_string())
        })
    }

    /// Run every requested tool, collecting produced charts
    fn run_tools(&self, blocks: &[ContentBlock], charts: &mut Vec<PathBuf>) -> Vec<ContentBlock> {
        blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    let outcome = self.toolbox.dispatch(name, input);
                    charts.extend(outcome.chart);
                    Some(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: outcome.content,
                        is_error: outcome.is_error,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AnalystAgent for AnthropicAgent {
    async fn invoke(&self, input: &str) -> Result<AgentOutput, AgentError> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                error!("❌ ANTHROPIC_API_KEY is not available. Cannot contact the model.");
                return Err(AgentError::MissingCredential);
            }
        };

        let mut messages = vec![Message::user(input)];
        let mut charts = Vec::new();

        for iteration in 1..=self.max_iterations {
            let response = self.send(api_key, &messages).await?;

            if !response.wants_tools() {
                info!(
                    "✅ Agent answered after {} call(s), {} chart(s)",
                    iteration,
                    charts.len()
                );
                return Ok(AgentOutput {
                    output: response.text(),
                    charts,
                });
            }

            let results = self.run_tools(&response.content, &mut charts);
            let assistant_blocks: Vec<ContentBlock> = response
                .content
                .into_iter()
                .filter(|block| !matches!(block, ContentBlock::Unsupported))
                .collect();
            messages.push(Message {
                role: "assistant".to_string(),
                content: Content::Blocks(assistant_blocks),
            });
            messages.push(Message {
                role: "user".to_string(),
                content: Content::Blocks(results),
            });
        }

        warn!("⚠️ Agent hit the iteration limit ({})", self.max_iterations);
        Err(AgentError::IterationLimit(self.max_iterations))
    }
}

/// Binds [`AnthropicAgent`]s to freshly loaded datasets
pub struct AnthropicAgentFactory {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    chart_output_dir: PathBuf,
    head_rows: usize,
    max_iterations: usize,
    renderer: Arc<dyn ChartRenderer>,
}

impl AnthropicAgentFactory {
    pub fn new(config: &Config, renderer: Arc<dyn ChartRenderer>) -> Self {
        if config.anthropic_api_key.is_some() {
            info!("🤖 Agent factory ready with model {}", config.anthropic_model);
        } else {
            warn!("⚠️ ANTHROPIC_API_KEY not set; questions will fail until it is configured");
        }

        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: config.anthropic_api_key.clone(),
            model: config.anthropic_model.clone(),
            base_url: config.anthropic_base_url.clone(),
            chart_output_dir: config.chart_output_dir.clone(),
            head_rows: config.head_rows,
            max_iterations: config.max_iterations,
            renderer,
        }
    }

    fn agent(&self, dataset: Arc<Dataset>) -> AnthropicAgent {
        AnthropicAgent {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            system: system_prompt(&dataset, self.head_rows),
            toolbox: Toolbox::new(
                dataset,
                ChartTemplates::new(self.chart_output_dir.clone()),
                self.renderer.clone(),
            ),
            max_iterations: self.max_iterations,
        }
    }
}

impl AgentFactory for AnthropicAgentFactory {
    fn bind(&self, dataset: Arc<Dataset>) -> Arc<dyn AnalystAgent> {
        info!("🔗 Binding agent to {}", dataset.filename());
        Arc::new(self.agent(dataset))
    }
}

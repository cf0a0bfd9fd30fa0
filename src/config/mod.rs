use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub server_port: u16,
    pub chart_output_dir: PathBuf,
    pub sample_data_path: PathBuf,
    pub avatar_path: Option<PathBuf>,
    /// Exchanges retained in the memory window
    pub memory_window: usize,
    /// Exchanges replayed into each question's context
    pub context_pairs: usize,
    pub max_iterations: usize,
    pub head_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            anthropic_model: DEFAULT_MODEL.to_string(),
            anthropic_base_url: DEFAULT_BASE_URL.to_string(),
            server_port: 8501,
            chart_output_dir: PathBuf::from("data/processed"),
            sample_data_path: PathBuf::from("data/sample_sales_data.csv"),
            avatar_path: None,
            memory_window: 10,
            context_pairs: 3,
            max_iterations: 20,
            head_rows: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            anthropic_model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or(defaults.anthropic_base_url),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            chart_output_dir: env::var("CHART_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.chart_output_dir),
            sample_data_path: env::var("SAMPLE_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sample_data_path),
            avatar_path: env::var("ANDY_AVATAR_PATH").ok().map(PathBuf::from),
            memory_window: parse_var("ANDY_MEMORY_WINDOW", defaults.memory_window)?,
            context_pairs: parse_var("ANDY_CONTEXT_PAIRS", defaults.context_pairs)?,
            max_iterations: parse_var("ANDY_MAX_ITERATIONS", defaults.max_iterations)?,
            head_rows: parse_var("ANDY_HEAD_ROWS", defaults.head_rows)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_window_and_context_independent() {
        let config = Config::default();
        assert_eq!(config.memory_window, 10);
        assert_eq!(config.context_pairs, 3);
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.chart_output_dir, PathBuf::from("data/processed"));
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("ANDY_TEST_PARSE_VAR", "ten");
        let parsed: Result<usize> = parse_var("ANDY_TEST_PARSE_VAR", 10);
        assert!(parsed.is_err());
        env::remove_var("ANDY_TEST_PARSE_VAR");
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        let parsed: usize = parse_var("ANDY_TEST_UNSET_VAR", 7).unwrap();
        assert_eq!(parsed, 7);
    }
}

//! Structured error types for the schedule engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("config: {section}: {reason}")]
  Config { section: String, reason: String },

  #[error("time: cannot parse {0:?}")]
  TimeParse(String),

  #[error("yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl EngineError {
  pub fn config(section: &str, reason: &str) -> Self {
    Self::Config {
      section: section.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn time_parse(raw: impl Into<String>) -> Self {
    Self::TimeParse(raw.into())
  }
}

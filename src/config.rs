use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Passes allowed for a growing root list or expression set before the run is
    /// considered stuck in a generation loop.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Record the call site of `report_error` on each error.
    #[serde(default = "default_true")]
    pub capture_locations: bool,

    /// Emit a trace event for every executed expression.
    #[serde(default)]
    pub trace_expressions: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            capture_locations: default_true(),
            trace_expressions: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl EvalConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_iterations".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn default_max_iterations() -> usize {
    100
}

fn default_true() -> bool {
    true
}

use serde::{Deserialize, Serialize};

use crate::Result;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

/// Knobs for the shape of emitted code. None of them change the meaning of
/// the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerConfig {
    /// One level of indentation.
    pub indent: String,
    pub line_ending: String,
    /// Wrap every switch in a break target, even when no clause breaks.
    pub always_wrap_switch: bool,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            line_ending: "\n".to_string(),
            always_wrap_switch: false,
        }
    }
}

impl LowerConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Defaults overlaid with `GOJS_INDENT` (a width in spaces) and
    /// `GOJS_WRAP_SWITCH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(width) = std::env::var("GOJS_INDENT")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
        {
            config.indent = " ".repeat(width);
        }
        if let Some(wrap) = env_true("GOJS_WRAP_SWITCH") {
            config.always_wrap_switch = wrap;
        }
        tracing::debug!("lowering config from environment: {:?}", config);
        config
    }
}

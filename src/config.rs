use dialoglens_timeline::TimelinePolicyView;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

pub const ENV_POSITION_INCREMENT_MS: &str = "DIALOGLENS_POSITION_INCREMENT_MS";
pub const ENV_SUMMARY_MAX_CHARS: &str = "DIALOGLENS_SUMMARY_MAX_CHARS";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub timeline: TimelinePolicyView,
    /// File stem for reports written in batch mode.
    pub report_name: String,
    /// Batch reports land here instead of next to their inputs.
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeline: TimelinePolicyView::default(),
            report_name: "timeline".to_string(),
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Applies environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(increment) = env_number::<i64>(ENV_POSITION_INCREMENT_MS) {
            self.timeline.position_increment_ms = increment;
            info!(increment, "position increment overridden from environment");
        }
        if let Some(max_chars) = env_number::<usize>(ENV_SUMMARY_MAX_CHARS) {
            self.timeline.summary_max_chars = max_chars;
            info!(max_chars, "summary length overridden from environment");
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring non-numeric environment override");
            None
        }
    }
}

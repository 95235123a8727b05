use std::path::{Path, PathBuf};
use std::sync::Arc;

use dialoglens_timeline::{TimelinePolicyHandle, TimelineService, TopicResolver};

use crate::cli::output::OutputFormat;
use crate::config::AppConfig;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// A fresh service per input, reading the loaded timeline policy.
    pub fn timeline_service(&self, topics: TopicResolver) -> TimelineService {
        let policy = TimelinePolicyHandle::new_with(self.config.timeline.clone());
        TimelineService::with_policy(policy).with_topics(topics)
    }

    /// Where a batch report for `input_dir` goes.
    pub fn report_dir(&self, input_dir: &Path) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => input_dir.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialoglens_timeline::{SourceKind, Timeline, TimelinePolicyView};
    use serde_json::json;

    fn context(position_increment_ms: i64) -> CliContext {
        let config = AppConfig {
            timeline: TimelinePolicyView {
                position_increment_ms,
                ..TimelinePolicyView::default()
            },
            ..AppConfig::default()
        };
        CliContext::new(config, PathBuf::from("dialoglens.yaml"), OutputFormat::Json)
    }

    #[test]
    fn each_context_runs_with_its_own_policy() {
        let transcript = json!([
            {"type": "message", "from": {"role": 1}, "text": "hi"},
            {"type": "message", "from": {"role": 0}, "text": "hello"},
            {"type": "message", "from": {"role": 1}, "text": "bye"}
        ]);
        let tuned = context(250);
        let plain = context(1000);
        let elapsed = |ctx: &CliContext| {
            ctx.timeline_service(TopicResolver::new())
                .build(SourceKind::Transcript, &transcript)
                .unwrap()
                .timeline
                .total_elapsed_ms
        };
        assert_eq!(elapsed(&tuned), 500);
        assert_eq!(elapsed(&plain), 2000);
        assert_eq!(elapsed(&tuned), 500);
    }
}

use crate::errors::TlError;
use crate::model::{PipelineStage, SourceKind};
use crate::ports::EventsPort;
use tracing::{debug, info, warn};

#[derive(Default)]
pub struct NoopEventsPort;

impl EventsPort for NoopEventsPort {
    fn timeline_build_started(&self, _source: SourceKind, _records: usize) {}

    fn timeline_stage_completed(&self, _stage: PipelineStage, _count: usize) {}

    fn timeline_build_finished(&self, _ok: bool, _latency_ms: u128, _err: Option<&TlError>) {}
}

/// Reports pipeline progress through `tracing`.
#[derive(Default)]
pub struct TracingEventsPort;

impl EventsPort for TracingEventsPort {
    fn timeline_build_started(&self, source: SourceKind, records: usize) {
        debug!(source = source.as_str(), records, "timeline build started");
    }

    fn timeline_stage_completed(&self, stage: PipelineStage, count: usize) {
        debug!(stage = stage.as_str(), count, "timeline stage completed");
    }

    fn timeline_build_finished(&self, ok: bool, latency_ms: u128, err: Option<&TlError>) {
        match err {
            Some(err) => warn!(ok, latency_ms, %err, "timeline build failed"),
            None => info!(ok, latency_ms, "timeline build finished"),
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use parking_lot::Mutex;

    /// Captures port calls for assertions.
    #[derive(Default)]
    pub struct RecordingEventsPort {
        pub calls: Mutex<Vec<String>>,
    }

    impl EventsPort for RecordingEventsPort {
        fn timeline_build_started(&self, source: SourceKind, records: usize) {
            self.calls
                .lock()
                .push(format!("started:{}:{records}", source.as_str()));
        }

        fn timeline_stage_completed(&self, stage: PipelineStage, count: usize) {
            self.calls
                .lock()
                .push(format!("stage:{}:{count}", stage.as_str()));
        }

        fn timeline_build_finished(&self, ok: bool, _latency_ms: u128, _err: Option<&TlError>) {
            self.calls.lock().push(format!("finished:{ok}"));
        }
    }
}

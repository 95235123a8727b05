use crate::adapters::{NoopEventsPort, TracingEventsPort};
use crate::errors::{TlError, TlResult};
use crate::export::jsonl::{build_lines, serialize_lines};
use crate::model::{SourceKind, TimelineReport};
use crate::normalize::TopicResolver;
use crate::policy::{TimelinePolicyHandle, TimelinePolicyView};
use crate::ports::{EventsPort, PolicyPort};
use crate::stitch::run_pipeline;
use serde_json::{to_value, Value as JsonValue};
use std::sync::Arc;
use std::time::Instant;

pub trait Timeline: Send + Sync {
    fn build(&self, source: SourceKind, input: &JsonValue) -> TlResult<TimelineReport>;
    fn export_jsonl(&self, report: &TimelineReport) -> TlResult<Vec<String>>;
}

pub struct TimelineService {
    policy: Arc<dyn PolicyPort>,
    events: Arc<dyn EventsPort>,
    topics: TopicResolver,
}

impl TimelineService {
    pub fn new(policy: Arc<dyn PolicyPort>, events: Arc<dyn EventsPort>) -> Self {
        Self {
            policy,
            events,
            topics: TopicResolver::new(),
        }
    }

    /// Service reporting through `tracing` and reading `policy_handle`.
    pub fn with_policy(policy_handle: TimelinePolicyHandle) -> Self {
        Self::new(
            Arc::new(policy_handle) as Arc<dyn PolicyPort>,
            Arc::new(TracingEventsPort) as Arc<dyn EventsPort>,
        )
    }

    pub fn quiet(policy: TimelinePolicyView) -> Self {
        Self::new(
            Arc::new(TimelinePolicyHandle::new_with(policy)) as Arc<dyn PolicyPort>,
            Arc::new(NoopEventsPort) as Arc<dyn EventsPort>,
        )
    }

    pub fn with_topics(mut self, topics: TopicResolver) -> Self {
        self.topics = topics;
        self
    }

    /// Runs the pipeline on already-extracted records. Never fails.
    pub fn build_records(&self, source: SourceKind, records: &[JsonValue]) -> TimelineReport {
        let started_at = Instant::now();
        let policy = self.policy.view();
        self.events.timeline_build_started(source, records.len());
        let report = run_pipeline(records, source, &self.topics, &policy, self.events.as_ref());
        self.events
            .timeline_build_finished(true, started_at.elapsed().as_millis(), None);
        report
    }
}

/// Accepts a bare record array or an object wrapping one under `activities`.
pub fn extract_records(input: &JsonValue) -> TlResult<&[JsonValue]> {
    match input {
        JsonValue::Array(records) => Ok(records.as_slice()),
        JsonValue::Object(map) => match map.get("activities") {
            Some(JsonValue::Array(records)) => Ok(records.as_slice()),
            Some(_) => Err(TlError::InvalidInput(
                "`activities` is not an array".to_string(),
            )),
            None => Err(TlError::InvalidInput(
                "object has no `activities` array".to_string(),
            )),
        },
        other => Err(TlError::InvalidInput(format!(
            "expected a record sequence, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

impl Timeline for TimelineService {
    fn build(&self, source: SourceKind, input: &JsonValue) -> TlResult<TimelineReport> {
        match extract_records(input) {
            Ok(records) => Ok(self.build_records(source, records)),
            Err(err) => {
                self.events.timeline_build_started(source, 0);
                self.events.timeline_build_finished(false, 0, Some(&err));
                Err(err)
            }
        }
    }

    fn export_jsonl(&self, report: &TimelineReport) -> TlResult<Vec<String>> {
        let policy = self.policy.view();
        let snapshot = to_value(&policy).map_err(|err| TlError::Internal(err.to_string()))?;
        serialize_lines(&build_lines(report, snapshot), policy.max_payload_bytes)
    }
}

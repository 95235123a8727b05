use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tunables for one reconstruction run. Every field has a default so a
/// partial config section deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelinePolicyView {
    pub summary_max_chars: usize,
    pub sequence_label_max_chars: usize,
    pub bar_label_max_chars: usize,
    pub card_text_max_chars: usize,
    pub variable_value_max_chars: usize,
    pub redirect_target_max_chars: usize,
    /// Raw position units that make up one synthetic step.
    pub position_stride: i64,
    /// Milliseconds added per synthetic step.
    pub position_increment_ms: i64,
    pub min_bar_ms: i64,
    pub fold_noise: bool,
    /// Step categories that open their own lane in the sequence diagram.
    pub external_step_kinds: Vec<String>,
    pub max_payload_bytes: usize,
}

impl Default for TimelinePolicyView {
    fn default() -> Self {
        Self {
            summary_max_chars: 120,
            sequence_label_max_chars: 80,
            bar_label_max_chars: 40,
            card_text_max_chars: 150,
            variable_value_max_chars: 80,
            redirect_target_max_chars: 40,
            position_stride: 1000,
            position_increment_ms: 1000,
            min_bar_ms: 50,
            fold_noise: true,
            external_step_kinds: vec![
                "Action".into(),
                "Connector".into(),
                "Flow".into(),
                "Tool".into(),
                "Agent".into(),
            ],
            max_payload_bytes: 64 * 1024,
        }
    }
}

impl TimelinePolicyView {
    pub fn effective_stride(&self) -> i64 {
        self.position_stride.max(1)
    }

    pub fn effective_increment_ms(&self) -> i64 {
        self.position_increment_ms.max(0)
    }

    pub fn is_external_kind(&self, kind: &str) -> bool {
        let kind = kind.to_ascii_lowercase();
        self.external_step_kinds
            .iter()
            .any(|candidate| kind.contains(&candidate.to_ascii_lowercase()))
    }
}

/// Shared by one service and its callers; each run reads a snapshot.
#[derive(Clone)]
pub struct TimelinePolicyHandle {
    inner: Arc<RwLock<TimelinePolicyView>>,
}

impl TimelinePolicyHandle {
    pub fn new_with(view: TimelinePolicyView) -> Self {
        Self {
            inner: Arc::new(RwLock::new(view)),
        }
    }

    pub fn snapshot(&self) -> TimelinePolicyView {
        self.inner.read().clone()
    }

    pub fn update(&self, view: TimelinePolicyView) {
        *self.inner.write() = view;
    }
}

impl crate::ports::PolicyPort for TimelinePolicyHandle {
    fn view(&self) -> TimelinePolicyView {
        self.snapshot()
    }
}

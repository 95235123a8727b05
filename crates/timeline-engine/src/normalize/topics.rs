use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema name to display name lookup. Unknown schema names fall back to
/// their last dot-separated segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResolver {
    names: BTreeMap<String, String>,
}

impl TopicResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema_name: impl Into<String>, display_name: impl Into<String>) {
        let schema_name = schema_name.into();
        let display_name = display_name.into();
        if schema_name.is_empty() || display_name.is_empty() {
            return;
        }
        self.names.insert(schema_name, display_name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn resolve(&self, schema_name: &str) -> String {
        if let Some(display) = self.names.get(schema_name) {
            return display.clone();
        }
        match schema_name.rsplit_once('.') {
            Some((_, last)) => last.to_string(),
            None => schema_name.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TopicResolver {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut resolver = TopicResolver::new();
        for (schema, display) in iter {
            resolver.insert(schema, display);
        }
        resolver
    }
}

//! Minimal reader for `botContent.yml`: only the bot display name and the
//! schema-name to display-name table used to label topics.

use anyhow::{Context, Result};
use dialoglens_timeline::TopicResolver;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

static BARE_AT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\s*)(@[a-zA-Z0-9_.]+)(\s*:)").expect("at-key regex"));
static BARE_AT_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(:\s+)(@[^\n]+)$").expect("at-value regex"));

const GPT_COMPONENT: &str = "GptComponent";
const UNKNOWN_BOT: &str = "Unknown Bot";

#[derive(Debug, Clone, Default)]
pub struct BotContent {
    pub display_name: String,
    pub component_count: usize,
    pub topics: TopicResolver,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawBotContent {
    entity: Option<RawEntity>,
    components: Option<Vec<RawComponent>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawEntity {
    display_name: Option<String>,
    schema_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawComponent {
    kind: Option<String>,
    display_name: Option<String>,
    schema_name: Option<String>,
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMetadata {
    display_name: Option<String>,
}

impl RawComponent {
    fn resolved_display_name(&self) -> Option<String> {
        let direct = self.display_name.clone().filter(|name| !name.is_empty());
        if direct.is_some() || self.kind.as_deref() != Some(GPT_COMPONENT) {
            return direct;
        }
        self.metadata
            .as_ref()
            .and_then(|m| m.display_name.clone())
            .or_else(|| self.schema_name.clone())
            .filter(|name| !name.is_empty())
    }
}

/// Authoring exports contain tabs and bare `@` keys or values that a strict
/// YAML parser rejects.
pub fn sanitize_yaml(text: &str) -> String {
    let text = text.replace('\t', "    ");
    let text = BARE_AT_KEY.replace_all(&text, "${1}\"${2}\"${3}");
    BARE_AT_VALUE
        .replace_all(&text, "${1}\"${2}\"")
        .into_owned()
}

pub fn parse_bot_content(text: &str) -> Result<BotContent> {
    let raw: RawBotContent =
        serde_yaml::from_str(&sanitize_yaml(text)).context("Failed to parse bot content YAML")?;
    let components = raw.components.unwrap_or_default();
    let entity = raw.entity.unwrap_or_default();

    let mut topics = TopicResolver::new();
    for component in &components {
        if let (Some(schema), Some(display)) =
            (component.schema_name.as_deref(), component.resolved_display_name())
        {
            topics.insert(schema, display);
        }
    }

    let display_name = entity
        .display_name
        .filter(|name| !name.is_empty())
        .or_else(|| {
            components
                .iter()
                .filter(|c| c.kind.as_deref() == Some(GPT_COMPONENT))
                .find_map(RawComponent::resolved_display_name)
        })
        .or_else(|| entity.schema_name.filter(|name| !name.is_empty()))
        .unwrap_or_else(|| UNKNOWN_BOT.to_string());

    Ok(BotContent {
        display_name,
        component_count: components.len(),
        topics,
    })
}

pub async fn load_bot_content(path: &Path) -> Result<BotContent> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_bot_content(&content)
        .with_context(|| format!("Invalid bot content in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_tabs_and_bare_at_tokens() {
        let raw = "kind: X\n@odata.type: String\ndisplayName: @mention tag\nnote:\tvalue";
        let clean = sanitize_yaml(raw);
        assert!(clean.contains("\"@odata.type\": String"));
        assert!(clean.contains("displayName: \"@mention tag\""));
        assert!(!clean.contains('\t'));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&clean).unwrap();
        assert_eq!(parsed["displayName"].as_str(), Some("@mention tag"));
    }

    #[test]
    fn builds_topic_table_and_bot_name() {
        let yaml = r#"
entity:
  schemaName: cr_helper
components:
  - kind: DialogComponent
    schemaName: cr_helper.topic.Greeting
    displayName: Greeting
  - kind: GptComponent
    schemaName: cr_helper.gpt.default
    metadata:
      displayName: Helper Bot
  - kind: DialogComponent
    schemaName: cr_helper.topic.Unnamed
"#;
        let content = parse_bot_content(yaml).unwrap();
        assert_eq!(content.display_name, "Helper Bot");
        assert_eq!(content.component_count, 3);
        assert_eq!(content.topics.resolve("cr_helper.topic.Greeting"), "Greeting");
        assert_eq!(content.topics.resolve("cr_helper.topic.Unnamed"), "Unnamed");
        assert_eq!(content.topics.len(), 2);
    }

    #[test]
    fn falls_back_to_schema_then_unknown() {
        let content = parse_bot_content("entity:\n  schemaName: cr_plain\n").unwrap();
        assert_eq!(content.display_name, "cr_plain");
        let content = parse_bot_content("components: []\n").unwrap();
        assert_eq!(content.display_name, UNKNOWN_BOT);
    }
}

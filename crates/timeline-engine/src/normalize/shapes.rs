//! Fixed lookup from record shape to event kind, plus the per-kind summary
//! and payload extraction.

use super::fields::{flatten_lines, title_case, truncate_chars, value_text, RecordView};
use super::topics::TopicResolver;
use crate::model::{EventDetail, EventKind, StepMarker, StepStatus, TracedAction};
use crate::policy::TimelinePolicyView;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

const MAX_CARD_BLOCKS: usize = 2;
const TRACED_ACTIONS_SHOWN: usize = 4;
const KNOWLEDGE_SOURCES_SHOWN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    Other,
}

impl Role {
    /// Dialog traces carry `"user"` / `"bot"`; transcripts use `1` / `0`.
    pub fn of(from: RecordView<'_>) -> Role {
        match from.get("role") {
            Some(JsonValue::String(role)) => match role.to_ascii_lowercase().as_str() {
                "user" => Role::User,
                "bot" => Role::Bot,
                _ => Role::Other,
            },
            Some(JsonValue::Number(n)) => match n.as_i64() {
                Some(0) => Role::Bot,
                Some(1) => Role::User,
                _ => Role::Other,
            },
            _ => Role::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shaped {
    pub kind: EventKind,
    pub summary: String,
    pub detail: EventDetail,
}

impl Shaped {
    fn new(kind: EventKind, summary: String, detail: EventDetail) -> Self {
        Self {
            kind,
            summary,
            detail,
        }
    }

    fn other(summary: String) -> Self {
        Self::new(EventKind::Other, summary, EventDetail::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeOutcome {
    Event(Shaped),
    Noise,
}

pub struct ShapeContext<'a> {
    pub topics: &'a TopicResolver,
    pub policy: &'a TimelinePolicyView,
}

pub fn value_type<'a>(view: RecordView<'a>) -> &'a str {
    view.opt_str("valueType")
        .or_else(|| view.opt_str("name"))
        .unwrap_or("")
}

pub fn shape_record(view: RecordView<'_>, ctx: &ShapeContext<'_>) -> ShapeOutcome {
    if !view.is_object() {
        return ShapeOutcome::Event(Shaped::other(String::new()));
    }
    let act_type = view.str("type");
    let value_type = value_type(view);
    let value = view.child("value");

    let shaped = match act_type {
        "typing" if ctx.policy.fold_noise => return ShapeOutcome::Noise,
        "message" => match Role::of(view.child("from")) {
            Role::User => user_message(view),
            Role::Bot => bot_message(view, ctx),
            Role::Other => Shaped::other(flatten_lines(view.str("text"))),
        },
        "event" => match value_type {
            "DynamicPlanReceived" => plan_received(value, ctx),
            "DynamicPlanReceivedDebug" => plan_received_debug(value),
            "DynamicPlanStepTriggered" => step_triggered(value, ctx),
            "DynamicPlanStepFinished" => step_finished(value, ctx),
            "DynamicPlanFinished" => plan_finished(value),
            "DialogTracingInfo" => dialog_tracing(value, ctx),
            "UniversalSearchToolTraceData" => knowledge_search(value),
            "ErrorCode" => error_code(value.get("ErrorCode")),
            _ => Shaped::other(value_type.to_string()),
        },
        "trace" => match value_type {
            "VariableAssignment" => variable_assignment(value, ctx),
            "DialogRedirect" => dialog_redirect(value, ctx),
            _ if value.has("ErrorCode") => error_code(value.get("ErrorCode")),
            _ => Shaped::other(value_type.to_string()),
        },
        _ => Shaped::other(value_type.to_string()),
    };
    ShapeOutcome::Event(shaped)
}

fn user_message(view: RecordView<'_>) -> Shaped {
    let text = view.str("text").to_string();
    let summary = if text.is_empty() {
        "User message".to_string()
    } else {
        format!("User: \"{}\"", flatten_lines(&text))
    };
    Shaped::new(EventKind::UserMessage, summary, EventDetail::Message { text })
}

fn bot_message(view: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let mut text = view.str("text").to_string();
    let attachments = view.array("attachments");
    if text.is_empty() && !attachments.is_empty() {
        text = adaptive_card_text(attachments, ctx.policy.card_text_max_chars);
    }
    let clean = flatten_lines(&text);
    let summary = if clean.is_empty() {
        "Bot message".to_string()
    } else {
        format!("Bot: {clean}")
    };
    Shaped::new(EventKind::BotMessage, summary, EventDetail::Message { text: clean })
}

/// Joins up to two TextBlock texts found anywhere in the card bodies.
pub fn adaptive_card_text(attachments: &[JsonValue], max_chars: usize) -> String {
    fn walk(elements: &[JsonValue], texts: &mut Vec<String>) {
        for element in elements {
            if texts.len() >= MAX_CARD_BLOCKS {
                return;
            }
            let view = RecordView::new(element);
            if view.str("type") == "TextBlock" {
                if let Some(text) = view.opt_str("text") {
                    texts.push(text.to_string());
                }
            }
            for key in ["items", "columns", "body"] {
                walk(view.array(key), texts);
            }
        }
    }

    let mut texts = Vec::new();
    for attachment in attachments {
        if texts.len() >= MAX_CARD_BLOCKS {
            break;
        }
        walk(
            RecordView::new(attachment).child("content").array("body"),
            &mut texts,
        );
    }
    if texts.is_empty() {
        return "[Adaptive Card]".to_string();
    }
    truncate_chars(&texts.join(" | "), max_chars)
}

fn plan_received(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let steps: Vec<String> = value
        .array("steps")
        .iter()
        .map(|step| ctx.topics.resolve(&value_text(Some(step))))
        .collect();
    let listed = if steps.is_empty() {
        "unknown".to_string()
    } else {
        steps.join(", ")
    };
    Shaped::new(
        EventKind::PlanReceived,
        format!("Plan: [{listed}]"),
        EventDetail::Plan {
            plan_id: value.opt_str("planIdentifier").map(str::to_string),
            steps,
        },
    )
}

fn plan_received_debug(value: RecordView<'_>) -> Shaped {
    Shaped::new(
        EventKind::PlanReceivedDebug,
        format!("Ask: \"{}\"", flatten_lines(value.str("ask"))),
        EventDetail::Plan {
            plan_id: value.opt_str("planIdentifier").map(str::to_string),
            steps: Vec::new(),
        },
    )
}

fn plan_finished(value: RecordView<'_>) -> Shaped {
    let cancelled = value.bool("wasCancelled").unwrap_or(false);
    Shaped::new(
        EventKind::PlanFinished,
        format!("Plan finished (cancelled={cancelled})"),
        EventDetail::Plan {
            plan_id: value.opt_str("planId").map(str::to_string),
            steps: Vec::new(),
        },
    )
}

fn step_identity(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> (String, String) {
    let name = ctx.topics.resolve(value.str("taskDialogId"));
    let key = value
        .opt_str("stepId")
        .map(str::to_string)
        .unwrap_or_else(|| name.clone());
    (key, name)
}

fn step_triggered(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let (key, name) = step_identity(value, ctx);
    let category = value.opt_str("type").map(str::to_string);
    let summary = format!(
        "Step start: {name} ({})",
        category.as_deref().unwrap_or_default()
    );
    Shaped::new(
        EventKind::StepTriggered,
        summary,
        EventDetail::Step(StepMarker {
            key,
            name,
            category,
            state: Some("inProgress".to_string()),
            status: StepStatus::Unknown,
            error: None,
        }),
    )
}

/// Explicit markers only: an error payload or a failure state fails the
/// step, a completion state succeeds it, anything else stays unknown.
pub fn finish_status(state: Option<&str>, has_error: bool) -> StepStatus {
    if has_error {
        return StepStatus::Failed;
    }
    match state.map(|s| s.to_ascii_lowercase()) {
        Some(state) => match state.as_str() {
            "completed" | "succeeded" | "success" => StepStatus::Succeeded,
            "failed" | "faulted" | "error" => StepStatus::Failed,
            _ => StepStatus::Unknown,
        },
        None => StepStatus::Unknown,
    }
}

fn step_finished(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let (key, name) = step_identity(value, ctx);
    let state = value.opt_str("state").map(str::to_string);
    let error = match value.get("error") {
        Some(JsonValue::Object(obj)) => Some(
            obj.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| JsonValue::Object(obj.clone()).to_string()),
        ),
        Some(JsonValue::String(msg)) if !msg.is_empty() => Some(msg.clone()),
        _ => None,
    };
    let status = finish_status(state.as_deref(), error.is_some());
    let summary = format!(
        "Step end: {name} [{}]",
        state.as_deref().unwrap_or_default()
    );
    Shaped::new(
        EventKind::StepFinished,
        summary,
        EventDetail::Step(StepMarker {
            key,
            name,
            category: value.opt_str("type").map(str::to_string),
            state,
            status,
            error,
        }),
    )
}

fn dialog_tracing(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let actions: Vec<TracedAction> = value
        .array("actions")
        .iter()
        .map(|action| {
            let action = RecordView::new(action);
            TracedAction {
                topic: ctx.topics.resolve(action.str("topicId")),
                action_type: action.str("actionType").to_string(),
                exception: action.opt_str("exception").map(str::to_string),
            }
        })
        .collect();

    let types: Vec<&str> = actions.iter().map(|a| a.action_type.as_str()).collect();
    let mut summary = format!(
        "Actions: {}",
        types
            .iter()
            .take(TRACED_ACTIONS_SHOWN)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    );
    if types.len() > TRACED_ACTIONS_SHOWN {
        summary.push_str(&format!(" (+{} more)", types.len() - TRACED_ACTIONS_SHOWN));
    }
    let topics: BTreeSet<&str> = actions
        .iter()
        .map(|a| a.topic.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    if !topics.is_empty() {
        summary.push_str(" in ");
        summary.push_str(&topics.into_iter().collect::<Vec<_>>().join(", "));
    }

    Shaped::new(EventKind::DialogTracing, summary, EventDetail::Tracing { actions })
}

fn knowledge_search(value: RecordView<'_>) -> Shaped {
    let sources: Vec<String> = value
        .array("knowledgeSources")
        .iter()
        .map(|s| {
            let name = value_text(Some(s));
            match name.rsplit_once('.') {
                Some((_, last)) => last.to_string(),
                None => name,
            }
        })
        .collect();
    let mut summary = format!(
        "Knowledge search: [{}]",
        sources
            .iter()
            .take(KNOWLEDGE_SOURCES_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    if sources.len() > KNOWLEDGE_SOURCES_SHOWN {
        summary.push_str(&format!(" (+{})", sources.len() - KNOWLEDGE_SOURCES_SHOWN));
    }
    Shaped::new(EventKind::KnowledgeSearch, summary, EventDetail::None)
}

fn error_code(code: Option<&JsonValue>) -> Shaped {
    let code = match value_text(code) {
        text if text.is_empty() => "Unknown".to_string(),
        text => text,
    };
    Shaped::new(EventKind::Error, format!("Error: {code}"), EventDetail::Error { code })
}

fn variable_assignment(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let id = value.str("id").to_string();
    let scope = value.str("type").to_string();
    let shown = truncate_chars(
        &flatten_lines(&value.text("newValue")),
        ctx.policy.variable_value_max_chars,
    );
    Shaped::new(
        EventKind::VariableAssignment,
        format!("{} {id} = {shown}", title_case(&scope)),
        EventDetail::Variable {
            id,
            scope,
            value: shown,
        },
    )
}

fn dialog_redirect(value: RecordView<'_>, ctx: &ShapeContext<'_>) -> Shaped {
    let target = value.str("targetDialogId").to_string();
    let shown = truncate_chars(&target, ctx.policy.redirect_target_max_chars);
    Shaped::new(
        EventKind::DialogRedirect,
        format!("Redirect → {shown}"),
        EventDetail::Redirect { target },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shape(record: &JsonValue) -> ShapeOutcome {
        let topics = TopicResolver::new();
        let policy = TimelinePolicyView::default();
        shape_record(
            RecordView::new(record),
            &ShapeContext {
                topics: &topics,
                policy: &policy,
            },
        )
    }

    fn shaped(record: JsonValue) -> Shaped {
        match shape(&record) {
            ShapeOutcome::Event(shaped) => shaped,
            ShapeOutcome::Noise => panic!("unexpected noise for {record}"),
        }
    }

    #[test]
    fn typing_is_noise() {
        assert_eq!(shape(&json!({"type": "typing"})), ShapeOutcome::Noise);
    }

    #[test]
    fn unknown_shapes_become_other() {
        assert_eq!(shaped(json!({"type": "conversationUpdate"})).kind, EventKind::Other);
        assert_eq!(shaped(json!([1, 2, 3])).kind, EventKind::Other);
        assert_eq!(
            shaped(json!({"type": "event", "valueType": "SomethingNew"})).summary,
            "SomethingNew"
        );
    }

    #[test]
    fn step_finished_carries_error_message() {
        let ev = shaped(json!({
            "type": "event",
            "valueType": "DynamicPlanStepFinished",
            "value": {
                "taskDialogId": "bot.topic.Lookup",
                "stepId": "s-1",
                "state": "failed",
                "error": {"message": "HTTP 500"}
            }
        }));
        assert_eq!(ev.kind, EventKind::StepFinished);
        assert_eq!(ev.summary, "Step end: Lookup [failed]");
        match ev.detail {
            EventDetail::Step(marker) => {
                assert_eq!(marker.key, "s-1");
                assert_eq!(marker.status, StepStatus::Failed);
                assert_eq!(marker.error.as_deref(), Some("HTTP 500"));
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn finish_status_needs_explicit_marker() {
        assert_eq!(finish_status(Some("completed"), false), StepStatus::Succeeded);
        assert_eq!(finish_status(Some("failed"), false), StepStatus::Failed);
        assert_eq!(finish_status(Some("completed"), true), StepStatus::Failed);
        assert_eq!(finish_status(Some("cancelled"), false), StepStatus::Unknown);
        assert_eq!(finish_status(None, false), StepStatus::Unknown);
    }

    #[test]
    fn name_stands_in_for_valuetype() {
        let ev = shaped(json!({
            "type": "event",
            "name": "DynamicPlanReceivedDebug",
            "value": {"ask": "where is my order"}
        }));
        assert_eq!(ev.kind, EventKind::PlanReceivedDebug);
        assert_eq!(ev.summary, "Ask: \"where is my order\"");
    }

    #[test]
    fn dialog_tracing_summary_lists_actions_and_topics() {
        let ev = shaped(json!({
            "type": "event",
            "valueType": "DialogTracingInfo",
            "value": {"actions": [
                {"topicId": "b.topic.Zeta", "actionType": "SendActivity"},
                {"topicId": "b.topic.Alpha", "actionType": "Question"},
                {"topicId": "b.topic.Alpha", "actionType": "SetVariable"},
                {"topicId": "b.topic.Alpha", "actionType": "HttpRequest", "exception": "timeout"},
                {"topicId": "b.topic.Alpha", "actionType": "EndDialog"}
            ]}
        }));
        assert_eq!(
            ev.summary,
            "Actions: SendActivity, Question, SetVariable, HttpRequest (+1 more) in Alpha, Zeta"
        );
    }

    #[test]
    fn bot_card_text_is_extracted() {
        let ev = shaped(json!({
            "type": "message",
            "from": {"role": "bot"},
            "attachments": [{"content": {"body": [
                {"type": "Container", "items": [{"type": "TextBlock", "text": "Order status"}]},
                {"type": "TextBlock", "text": "Shipped"},
                {"type": "TextBlock", "text": "ignored"}
            ]}}]
        }));
        assert_eq!(ev.kind, EventKind::BotMessage);
        assert_eq!(ev.summary, "Bot: Order status | Shipped");
    }

    #[test]
    fn transcript_numeric_roles() {
        assert_eq!(
            shaped(json!({"type": "message", "from": {"role": 1}, "text": "hi"})).kind,
            EventKind::UserMessage
        );
        assert_eq!(
            shaped(json!({"type": "message", "from": {"role": 0}, "text": "hello"})).kind,
            EventKind::BotMessage
        );
    }

    #[test]
    fn trace_error_code_and_variables() {
        let ev = shaped(json!({"type": "trace", "valueType": "Unrelated", "value": {"ErrorCode": "FlowActionBadRequest"}}));
        assert_eq!(ev.kind, EventKind::Error);
        assert_eq!(ev.summary, "Error: FlowActionBadRequest");

        let ev = shaped(json!({
            "type": "trace",
            "valueType": "VariableAssignment",
            "value": {"id": "Topic.OrderId", "type": "topic", "newValue": 42}
        }));
        assert_eq!(ev.summary, "Topic Topic.OrderId = 42");
    }
}

//! Agent trace model: how one reply was produced.
//!
//! A [`Trace`] is built from the `mcp_details` object of an agent reply.
//! Parsing never fails as a whole: every missing field resolves to a sentinel
//! and every structurally invalid field is reported as a [`TraceError`] and
//! then defaulted, so a reply with a broken trace still renders.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Sentinel for missing agent / model names.
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for missing timing / token metadata.
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Errors
// ============================================================================

/// A structural defect in a reply's `mcp_details` payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("mcp_details is not an object")]
    NotAnObject,

    #[error("`{field}` should be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("`{field}` has unknown status `{value}`")]
    UnknownStatus { field: String, value: String },
}

// ============================================================================
// Steps
// ============================================================================

/// Label of a processing step. Labels outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    MessageReceived,
    AgentInvocation,
    ToolExecution,
    ResponseGeneration,
    ResponseDelivery,
    ErrorOccurred,
    Other(String),
}

impl StepAction {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Message Received" => Self::MessageReceived,
            "Agent Invocation" => Self::AgentInvocation,
            "Tool Execution" => Self::ToolExecution,
            "Response Generation" => Self::ResponseGeneration,
            "Response Delivery" => Self::ResponseDelivery,
            "Error Occurred" => Self::ErrorOccurred,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::MessageReceived => "Message Received",
            Self::AgentInvocation => "Agent Invocation",
            Self::ToolExecution => "Tool Execution",
            Self::ResponseGeneration => "Response Generation",
            Self::ResponseDelivery => "Response Delivery",
            Self::ErrorOccurred => "Error Occurred",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for StepAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl StepStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One named stage of processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub action: StepAction,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 1-based ordinal as reported by the agent, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl Step {
    pub fn new(action: StepAction, status: StepStatus) -> Self {
        Self {
            action,
            status,
            description: None,
            number: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn parse(item: &Value, path: &str, defects: &mut Vec<TraceError>) -> Option<Self> {
        let Some(obj) = item.as_object() else {
            defects.push(TraceError::WrongType {
                field: path.to_string(),
                expected: "an object",
            });
            return None;
        };

        let action = text_field(obj, "action", path, defects)
            .map(|label| StepAction::from_label(&label))
            .unwrap_or_else(|| StepAction::Other(UNKNOWN.to_string()));

        let status = match obj.get("status") {
            None | Some(Value::Null) => StepStatus::default(),
            Some(Value::String(s)) => StepStatus::parse(s).unwrap_or_else(|| {
                defects.push(TraceError::UnknownStatus {
                    field: format!("{}.status", path),
                    value: s.clone(),
                });
                StepStatus::default()
            }),
            Some(_) => {
                defects.push(TraceError::WrongType {
                    field: format!("{}.status", path),
                    expected: "a string",
                });
                StepStatus::default()
            }
        };

        let number = obj
            .get("step")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());

        Some(Self {
            action,
            status,
            description: text_field(obj, "description", path, defects),
            number,
        })
    }
}

// ============================================================================
// Tools
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Failure,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failure => "failure",
        })
    }
}

/// One external tool call made while producing a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolInvocation {
    fn parse(item: &Value, path: &str, defects: &mut Vec<TraceError>) -> Option<Self> {
        let Some(obj) = item.as_object() else {
            defects.push(TraceError::WrongType {
                field: path.to_string(),
                expected: "an object",
            });
            return None;
        };

        // Anything that is not an explicit success is shown as a failure.
        let status = match obj.get("status").and_then(Value::as_str) {
            Some("success") => ToolStatus::Success,
            Some("failure") | Some("failed") | Some("error") => ToolStatus::Failure,
            Some(other) => {
                defects.push(TraceError::UnknownStatus {
                    field: format!("{}.status", path),
                    value: other.to_string(),
                });
                ToolStatus::Failure
            }
            None => ToolStatus::Failure,
        };

        Some(Self {
            name: text_field(obj, "name", path, defects).unwrap_or_else(|| UNKNOWN.to_string()),
            status,
            description: text_field(obj, "description", path, defects),
        })
    }
}

// ============================================================================
// Metadata values
// ============================================================================

/// Display-only metadata that agents report either as text or as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Number(serde_json::Number),
}

impl MetaValue {
    pub fn not_available() -> Self {
        Self::Text(NOT_AVAILABLE.to_string())
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Text(s) if s == NOT_AVAILABLE)
    }
}

impl Default for MetaValue {
    fn default() -> Self {
        Self::not_available()
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

// ============================================================================
// Trace
// ============================================================================

/// Structured record of how one agent reply was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub succeeded: bool,
    pub steps: Vec<Step>,
    pub tools_used: Vec<ToolInvocation>,
    pub agent_name: String,
    pub model_name: String,
    pub processing_time: MetaValue,
    pub tokens_used: MetaValue,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            succeeded: false,
            steps: Vec::new(),
            tools_used: Vec::new(),
            agent_name: UNKNOWN.to_string(),
            model_name: UNKNOWN.to_string(),
            processing_time: MetaValue::default(),
            tokens_used: MetaValue::default(),
        }
    }
}

impl Trace {
    /// Build a trace from `mcp_details`, logging and defaulting every defect.
    pub fn from_details(details: &Value) -> Self {
        let (trace, defects) = Self::parse(details);
        for defect in &defects {
            tracing::warn!(error = %defect, "Malformed trace field defaulted");
        }
        trace
    }

    /// Build a trace from `mcp_details`, returning the defects that were defaulted.
    pub fn parse(details: &Value) -> (Self, Vec<TraceError>) {
        let mut defects = Vec::new();
        let mut trace = Self::default();

        let Some(obj) = details.as_object() else {
            defects.push(TraceError::NotAnObject);
            return (trace, defects);
        };

        match obj.get("success") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => trace.succeeded = *b,
            Some(_) => defects.push(TraceError::WrongType {
                field: "success".to_string(),
                expected: "a boolean",
            }),
        }

        trace.steps = sequence_field(obj, "steps", Step::parse, &mut defects);
        trace.tools_used = sequence_field(obj, "tools_used", ToolInvocation::parse, &mut defects);

        if let Some(name) = text_field(obj, "agent_name", "", &mut defects) {
            trace.agent_name = name;
        }
        if let Some(model) = text_field(obj, "model", "", &mut defects) {
            trace.model_name = model;
        }
        if let Some(time) = meta_field(obj, "processing_time", &mut defects) {
            trace.processing_time = time;
        }
        if let Some(tokens) = meta_field(obj, "tokens_used", &mut defects) {
            trace.tokens_used = tokens;
        }

        (trace, defects)
    }

    /// The single-step trace attached to a reply whose request failed in transport.
    pub fn transport_failure(detail: impl Into<String>) -> Self {
        let mut step = Step::new(StepAction::ErrorOccurred, StepStatus::Error)
            .with_description(detail);
        step.number = Some(1);

        Self {
            succeeded: false,
            steps: vec![step],
            ..Self::default()
        }
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn qualified(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Non-empty string field. Empty strings count as absent.
fn text_field(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    defects: &mut Vec<TraceError>,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            defects.push(TraceError::WrongType {
                field: qualified(path, key),
                expected: "a string",
            });
            None
        }
    }
}

fn meta_field(
    obj: &Map<String, Value>,
    key: &str,
    defects: &mut Vec<TraceError>,
) -> Option<MetaValue> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(MetaValue::Text(s.clone())),
        Some(Value::Number(n)) => Some(MetaValue::Number(n.clone())),
        Some(_) => {
            defects.push(TraceError::WrongType {
                field: key.to_string(),
                expected: "a string or number",
            });
            None
        }
    }
}

fn sequence_field<T>(
    obj: &Map<String, Value>,
    key: &str,
    parse: fn(&Value, &str, &mut Vec<TraceError>) -> Option<T>,
    defects: &mut Vec<TraceError>,
) -> Vec<T> {
    match obj.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| parse(item, &format!("{}[{}]", key, i), defects))
            .collect(),
        Some(_) => {
            defects.push(TraceError::WrongType {
                field: key.to_string(),
                expected: "a sequence",
            });
            Vec::new()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_details() -> Value {
        json!({
            "success": true,
            "steps": [
                {"step": 1, "action": "Message Received", "description": "Processing user query: '2+2'", "status": "completed"},
                {"step": 2, "action": "Agent Invocation", "description": "Invoking demo-agent", "status": "completed"},
                {"step": 3, "action": "Tool Execution", "description": "Applied mathematical reasoning tool", "status": "completed"},
                {"step": 4, "action": "Response Delivery", "status": "completed"}
            ],
            "tools_used": [
                {"name": "mathematical_reasoning", "description": "Applied mathematical reasoning", "status": "success"}
            ],
            "agent_name": "demo-agent",
            "model": "gpt-4o-mini",
            "processing_time": "< 1s",
            "tokens_used": "~50-100"
        })
    }

    #[test]
    fn test_parse_full_details() {
        let (trace, defects) = Trace::parse(&full_details());

        assert!(defects.is_empty(), "unexpected defects: {:?}", defects);
        assert!(trace.succeeded);
        assert_eq!(trace.steps.len(), 4);
        assert_eq!(trace.steps[0].action, StepAction::MessageReceived);
        assert_eq!(trace.steps[2].action, StepAction::ToolExecution);
        assert_eq!(trace.steps[2].number, Some(3));
        assert_eq!(trace.steps[3].description, None);
        assert_eq!(trace.tools_used.len(), 1);
        assert_eq!(trace.tools_used[0].status, ToolStatus::Success);
        assert_eq!(trace.agent_name, "demo-agent");
        assert_eq!(trace.model_name, "gpt-4o-mini");
        assert_eq!(trace.processing_time.to_string(), "< 1s");
        assert_eq!(trace.tokens_used.to_string(), "~50-100");
    }

    #[test]
    fn test_missing_fields_resolve_to_sentinels() {
        let (trace, defects) = Trace::parse(&json!({}));

        assert!(defects.is_empty());
        assert!(!trace.succeeded);
        assert!(trace.steps.is_empty());
        assert!(trace.tools_used.is_empty());
        assert_eq!(trace.agent_name, UNKNOWN);
        assert_eq!(trace.model_name, UNKNOWN);
        assert_eq!(trace.processing_time.to_string(), NOT_AVAILABLE);
        assert!(!trace.processing_time.is_available());
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let trace = Trace::from_details(&json!({"agent_name": "", "processing_time": ""}));
        assert_eq!(trace.agent_name, UNKNOWN);
        assert_eq!(trace.processing_time, MetaValue::not_available());
    }

    #[test]
    fn test_numeric_processing_time_is_kept() {
        let trace = Trace::from_details(&json!({"processing_time": 1.25}));
        assert!(trace.processing_time.is_available());
        assert_eq!(trace.processing_time.to_string(), "1.25");
    }

    #[test]
    fn test_steps_not_a_sequence_is_defaulted() {
        let (trace, defects) = Trace::parse(&json!({
            "success": true,
            "steps": "oops",
            "agent_name": "demo-agent"
        }));

        assert!(trace.steps.is_empty());
        assert!(trace.succeeded, "other fields still parse");
        assert_eq!(trace.agent_name, "demo-agent");
        assert_eq!(
            defects,
            vec![TraceError::WrongType {
                field: "steps".to_string(),
                expected: "a sequence"
            }]
        );
    }

    #[test]
    fn test_non_object_details() {
        let (trace, defects) = Trace::parse(&json!([1, 2, 3]));
        assert_eq!(trace, Trace::default());
        assert_eq!(defects, vec![TraceError::NotAnObject]);
    }

    #[test]
    fn test_unknown_step_status_defaults_to_pending() {
        let (trace, defects) = Trace::parse(&json!({
            "steps": [{"action": "Agent Invocation", "status": "exploded"}]
        }));

        assert_eq!(trace.steps[0].status, StepStatus::Pending);
        assert_eq!(
            defects,
            vec![TraceError::UnknownStatus {
                field: "steps[0].status".to_string(),
                value: "exploded".to_string()
            }]
        );
    }

    #[test]
    fn test_non_object_step_is_skipped() {
        let (trace, defects) = Trace::parse(&json!({
            "steps": [42, {"action": "Message Received", "status": "completed"}]
        }));

        assert_eq!(trace.steps.len(), 1);
        assert_eq!(trace.steps[0].action, StepAction::MessageReceived);
        assert_eq!(defects.len(), 1);
    }

    #[test]
    fn test_unrecognized_action_is_legal() {
        let (trace, defects) = Trace::parse(&json!({
            "steps": [{"action": "Cache Lookup", "status": "completed"}]
        }));

        assert!(defects.is_empty());
        assert_eq!(trace.steps[0].action, StepAction::Other("Cache Lookup".to_string()));
        assert_eq!(trace.steps[0].action.label(), "Cache Lookup");
    }

    #[test]
    fn test_tool_status_other_than_success_is_failure() {
        let trace = Trace::from_details(&json!({
            "tools_used": [
                {"name": "calc", "status": "failed"},
                {"name": "search"}
            ]
        }));

        assert_eq!(trace.tools_used[0].status, ToolStatus::Failure);
        assert_eq!(trace.tools_used[1].status, ToolStatus::Failure);
    }

    #[test]
    fn test_transport_failure_trace() {
        let trace = Trace::transport_failure("timeout");

        assert!(!trace.succeeded);
        assert_eq!(trace.steps.len(), 1);
        assert_eq!(trace.steps[0].action, StepAction::ErrorOccurred);
        assert_eq!(trace.steps[0].status, StepStatus::Error);
        assert_eq!(trace.steps[0].description.as_deref(), Some("timeout"));
        assert!(trace.tools_used.is_empty());
        assert_eq!(trace.agent_name, UNKNOWN);
        assert_eq!(trace.model_name, UNKNOWN);
    }

    #[test]
    fn test_action_serializes_as_label() {
        let step = Step::new(StepAction::ResponseGeneration, StepStatus::Processing);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "Response Generation");
        assert_eq!(json["status"], "processing");
        assert!(json.get("description").is_none());
    }
}

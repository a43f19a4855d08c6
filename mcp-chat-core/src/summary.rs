//! Trace summarizer: derived display facts and per-message expand state.
//!
//! [`summarize`] is a pure function of a [`Trace`]. The expand/collapse flag
//! of each agent message lives in [`DisplayState`], a map keyed by message id
//! that the session owns, so nothing here depends on a rendering technology.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::message::MessageId;
use crate::trace::{StepStatus, Trace};

/// Overall badge shown on a trace panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    Success,
    Error,
    InProgress,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::InProgress => "in-progress",
        })
    }
}

/// Aggregate facts about one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub completed_count: usize,
    pub total_count: usize,
    pub has_error_step: bool,
    pub has_tools: bool,
    pub tool_count: usize,
    pub overall_badge: Badge,
}

impl TraceSummary {
    /// e.g. `"3/4 steps"`
    pub fn steps_label(&self) -> String {
        format!("{}/{} steps", self.completed_count, self.total_count)
    }

    /// e.g. `"1 tool"`, `"2 tools"`; `None` when no tool ran.
    pub fn tools_label(&self) -> Option<String> {
        if !self.has_tools {
            return None;
        }
        let plural = if self.tool_count == 1 { "" } else { "s" };
        Some(format!("{} tool{}", self.tool_count, plural))
    }
}

/// Derive the display facts of a trace.
///
/// An error step always wins. Otherwise the badge is `success` only when every
/// step completed, which makes an empty step list a vacuous success.
pub fn summarize(trace: &Trace) -> TraceSummary {
    let total_count = trace.steps.len();
    let completed_count = trace
        .steps
        .iter()
        .filter(|step| step.status == StepStatus::Completed)
        .count();
    let has_error_step = trace
        .steps
        .iter()
        .any(|step| step.status == StepStatus::Error);
    let tool_count = trace.tools_used.len();

    let overall_badge = if has_error_step {
        Badge::Error
    } else if completed_count == total_count {
        Badge::Success
    } else {
        Badge::InProgress
    };

    TraceSummary {
        completed_count,
        total_count,
        has_error_step,
        has_tools: tool_count > 0,
        tool_count,
        overall_badge,
    }
}

// ============================================================================
// DisplayState
// ============================================================================

/// Per-message `details expanded` flags. Absent means collapsed.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    expanded: HashMap<MessageId, bool>,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: MessageId) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    /// Flip the flag for `id` and return the new value.
    pub fn toggle(&mut self, id: MessageId) -> bool {
        let flag = self.expanded.entry(id).or_insert(false);
        *flag = !*flag;
        *flag
    }

    /// Drop every flag, e.g. when the conversation is cleared.
    pub fn reset(&mut self) {
        self.expanded.clear();
    }
}

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

use crate::ai::Usage;

/// Why the tool loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// The model answered with text.
    Ok,
    /// The model answered with neither text nor tool calls.
    Empty,
    /// The same batch of tool calls kept coming back.
    Loop,
    MaxRounds,
    ApiError,
}

impl StopReason {
    pub fn status_icon(self) -> &'static str {
        match self {
            StopReason::Ok => "✅",
            StopReason::MaxRounds | StopReason::Loop => "⚠️",
            StopReason::Empty | StopReason::ApiError => "❌",
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub label: String,
    pub stop: StopReason,
    pub rounds: usize,
    pub tool_calls: usize,
    /// Calls to operations that change the workbook.
    pub writes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub usage: Usage,
}

impl RunOutcome {
    pub fn new(label: impl Into<String>, stop: StopReason) -> Self {
        Self {
            label: label.into(),
            stop,
            rounds: 0,
            tool_calls: 0,
            writes: 0,
            response: None,
            error: None,
            usage: Usage::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.stop == StopReason::Ok
    }
}

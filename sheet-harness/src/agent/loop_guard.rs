use crate::ai::ToolCall;

/// How many consecutive repeats of an identical tool batch end the run.
pub const MAX_SAME_REPEATS: usize = 2;

/// Spots a model that keeps issuing the same batch of tool calls.
#[derive(Debug, Default)]
pub struct RepeatGuard {
    previous: Option<String>,
    repeats: usize,
}

impl RepeatGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name:arguments` of every call, joined by `|`.
    pub fn signature(calls: &[ToolCall]) -> String {
        calls
            .iter()
            .map(|c| format!("{}:{}", c.function.name, c.function.arguments))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Record this round's batch. Returns true once the same batch has come
    /// back `MAX_SAME_REPEATS` times in a row.
    pub fn observe(&mut self, calls: &[ToolCall]) -> bool {
        let signature = Self::signature(calls);
        if self.previous.as_deref() == Some(signature.as_str()) {
            self.repeats += 1;
        } else {
            self.repeats = 0;
        }
        self.previous = Some(signature);
        self.repeats >= MAX_SAME_REPEATS
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }
}

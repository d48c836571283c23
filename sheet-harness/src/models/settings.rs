use std::fmt;
use std::path::PathBuf;

/// Everything a run needs to talk to the chat-completion endpoint.
#[derive(Clone)]
pub struct HarnessSettings {
    /// API base, without the `/chat/completions` suffix.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_rounds: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub scenarios_path: PathBuf,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            max_rounds: default_max_rounds(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            scenarios_path: default_scenarios_path(),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for HarnessSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_rounds", &self.max_rounds)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("scenarios_path", &self.scenarios_path)
            .finish()
    }
}

pub fn default_endpoint() -> String {
    "https://api.z.ai/api/paas/v4".to_string()
}

pub fn default_model() -> String {
    "glm-4.7-flash".to_string()
}

pub fn default_max_rounds() -> usize {
    30
}

pub fn default_max_tokens() -> u32 {
    4096
}

pub fn default_temperature() -> f32 {
    0.7
}

pub fn default_timeout_secs() -> u64 {
    120
}

pub fn default_scenarios_path() -> PathBuf {
    PathBuf::from("config/scenarios.ron")
}

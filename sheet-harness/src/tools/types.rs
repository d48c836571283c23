use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One entry of the `tools` array in an OpenAI-compatible request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: ToolFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    /// A `function` tool whose parameters are an object schema.
    pub fn function(name: &str, description: &str, properties: Value, required: &[&str]) -> Self {
        ToolSpec {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: name.to_string(),
                description: description.to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn required(&self) -> Vec<&str> {
        self.function.parameters["required"]
            .as_array()
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

//! Result payloads for `tools/list` and `tools/call`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One block of tool output. Both tools answer with a single text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Tool output. Extraction never fails at this boundary, so there is no
/// error flag: degraded reads still produce data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Pretty-printed JSON of `value` as the only content block.
    pub fn json(value: &impl Serialize) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize tool output: {e}");
            String::from("null")
        });
        Self {
            content: vec![ToolContent::Text { text }],
        }
    }
}

/// Entry in the fixed tool list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The whole list fits in one page, so no cursor is ever sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListResult {
    pub tools: Vec<ToolDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_result_is_single_text_block() {
        let result = ToolCallResult::json(&json!({ "currentTime": "13:05:09" }));
        let wire = serde_json::to_value(&result).unwrap();

        assert_eq!(wire["content"].as_array().unwrap().len(), 1);
        assert_eq!(wire["content"][0]["type"], "text");
        let inner: Value =
            serde_json::from_str(wire["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(inner["currentTime"], "13:05:09");
        assert!(wire.get("isError").is_none());
    }
}

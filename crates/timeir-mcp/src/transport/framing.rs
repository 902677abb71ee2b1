//! Newline-delimited JSON framing.

use crate::types::{JsonRpcError, JsonRpcMessage, McpError, McpResult, RequestId};

/// Parse a single line of text as a JSON-RPC message.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Serialize a value to a JSON line (with trailing newline).
pub fn frame_message(value: &serde_json::Value) -> McpResult<String> {
    let mut json =
        serde_json::to_string(value).map_err(|e| McpError::InternalError(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

/// Error reply for a line that could not be parsed; the id is unknown.
pub fn parse_error_response(error: &McpError) -> McpResult<serde_json::Value> {
    let response: JsonRpcError = error.to_json_rpc_error(RequestId::Null);
    serde_json::to_value(response).map_err(|e| McpError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_and_notification() {
        let req = parse_message(r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#).unwrap();
        assert!(matches!(req, JsonRpcMessage::Request(_)));

        let notif = parse_message(r#"{"jsonrpc":"2.0","method":"initialized"}"#).unwrap();
        assert!(matches!(notif, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_message("").unwrap_err().code(), -32700);
        assert_eq!(parse_message(r#"{"broken":"#).unwrap_err().code(), -32700);
    }

    #[test]
    fn test_frame_and_error_response() {
        let framed = frame_message(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(framed, "{\"a\":1}\n");

        let err = McpError::ParseError("bad".to_string());
        let value = parse_error_response(&err).unwrap();
        assert_eq!(value["id"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], -32700);
    }
}

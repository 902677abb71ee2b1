//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use timeir_crawler::ExtractionSession;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{get_current_time_data, get_events_data};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            get_current_time_data::definition(),
            get_events_data::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        session: &Arc<Mutex<ExtractionSession>>,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));
        if !args.is_object() {
            return Err(McpError::InvalidParams(
                "Tool arguments must be an object".to_string(),
            ));
        }

        match name {
            get_current_time_data::NAME => get_current_time_data::execute(args, session).await,
            get_events_data::NAME => get_events_data::execute(args, session).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}

/// Input schema shared by the argument-less tools.
pub(super) fn empty_input_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

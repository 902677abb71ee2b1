//! Tool: get_current_time_data. Current time and today's date in three calendars.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use timeir_crawler::ExtractionSession;

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::registry::empty_input_schema;

pub const NAME: &str = "get_current_time_data";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Gets the current time.".to_string(),
        input_schema: empty_input_schema(),
    }
}

pub async fn execute(
    _args: Value,
    session: &Arc<Mutex<ExtractionSession>>,
) -> McpResult<ToolCallResult> {
    tracing::info!("Tool: {NAME} called");
    let snapshot = session.lock().await.current_time_data().await;
    tracing::info!("Tool: {NAME} completed");
    Ok(ToolCallResult::json(&snapshot))
}

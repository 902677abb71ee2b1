//! Tool: get_events_data. This month's events as listed on the page.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use timeir_crawler::ExtractionSession;

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::registry::empty_input_schema;

pub const NAME: &str = "get_events_data";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Gets the events of month.".to_string(),
        input_schema: empty_input_schema(),
    }
}

pub async fn execute(
    _args: Value,
    session: &Arc<Mutex<ExtractionSession>>,
) -> McpResult<ToolCallResult> {
    tracing::info!("Tool: {NAME} called");
    let events = session.lock().await.events_data().await;
    tracing::info!("Tool: {NAME} returned {} events", events.len());
    Ok(ToolCallResult::json(&events))
}

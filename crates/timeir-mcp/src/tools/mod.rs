//! MCP tool implementations.

pub mod get_current_time_data;
pub mod get_events_data;
pub mod registry;

pub use registry::ToolRegistry;

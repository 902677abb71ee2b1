//! TimeIr MCP Server: current time, calendar dates and monthly events from time.ir.

pub mod config;
pub mod protocol;
pub mod repl;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_target_url, session_config};
pub use protocol::ProtocolHandler;
pub use transport::StdioTransport;

//! TimeIr MCP Server: entry point.

use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use timeir_crawler::session::DEFAULT_WAIT_SECS;
use timeir_crawler::{open_session, DriverKind};
use timeir_mcp::config::session_config;
use timeir_mcp::protocol::ProtocolHandler;
use timeir_mcp::tools::ToolRegistry;
use timeir_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "timeir-mcp",
    about = "MCP server for TimeIr: current time, Persian/Hijri/Gregorian dates and monthly events",
    version
)]
struct Cli {
    /// Page to crawl. Also reads TIMEIR_URL.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Page driver (chromium, static).
    #[arg(long, default_value = "chromium", global = true)]
    driver: DriverKind,

    /// Seconds to wait for each page element.
    #[arg(long, default_value_t = DEFAULT_WAIT_SECS, global = true)]
    wait_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Read the page once and print both results as JSON.
    Fetch,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   timeir-mcp completions bash > ~/.local/share/bash-completion/completions/timeir-mcp
    ///   timeir-mcp completions zsh > ~/.zfunc/_timeir-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // Logs go to stderr; stdout carries protocol messages only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = session_config(cli.url.as_deref(), cli.wait_timeout_secs);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("TimeIr MCP server ({} driver)", cli.driver);
            let session = open_session(cli.driver, config).await;
            let session = Arc::new(Mutex::new(session));
            let handler = ProtocolHandler::new(Arc::clone(&session));
            let transport = StdioTransport::new(handler);

            tokio::select! {
                result = transport.run() => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, closing extraction session");
                    session.lock().await.close().await;
                }
            }
            tracing::info!("TimeIr MCP server stopped");
        }

        Commands::Fetch => {
            let mut session = open_session(cli.driver, config).await;
            let time = session.current_time_data().await;
            let events = session.events_data().await;
            let ready = session.is_ready();
            session.close().await;

            let output = serde_json::json!({
                "session_ready": ready,
                "time": time,
                "events": events,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Info => {
            let capabilities = timeir_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "timeir-mcp", &mut std::io::stdout());
        }

        Commands::Repl => {
            timeir_mcp::repl::run(cli.driver, config).await?;
        }
    }

    Ok(())
}

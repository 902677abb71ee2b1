//! Interactive REPL for the TimeIr MCP server.
//!
//! Launch with `timeir-mcp repl` to enter interactive mode.
//! Type `/help` for available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use timeir_crawler::{open_session, DriverKind, ExtractionSession, SessionConfig, SessionState};

use crate::tools::ToolRegistry;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/time", "Current time and dates"),
    ("/events", "Events of the current month"),
    ("/status", "Show session state"),
    ("/tools", "List available MCP tools"),
    ("/info", "Show server capabilities"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct TimeIrHelper;

impl Completer for TimeIrHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        if input.contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let matches: Vec<Pair> = COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(input))
            .map(|(cmd, desc)| Pair {
                display: format!("{cmd:<10} {desc}"),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for TimeIrHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for TimeIrHelper {}
impl Validator for TimeIrHelper {}
impl Helper for TimeIrHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run the interactive REPL against a freshly opened session.
pub async fn run(driver: DriverKind, config: SessionConfig) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mtimeir-mcp v{}\x1b[0m \x1b[90m· time.ir for AI agents\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!("  Opening {} ({driver} driver)...", config.target_url);

    let mut session = open_session(driver, config).await;
    print_status(&session);
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<TimeIrHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(rl_config)?;
    rl.set_helper(Some(TimeIrHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let hist_path = home_dir().join(".timeir_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mtimeir>\x1b[0m ";

    loop {
        // Line editing blocks; keep it off the async worker.
        let read = tokio::task::block_in_place(|| rl.readline(prompt));
        match read {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let cmd = input.split_whitespace().next().unwrap_or("");
                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "time" => cmd_time(&mut session).await,
                    "events" => cmd_events(&mut session).await,
                    "status" => print_status(&session),
                    "tools" => cmd_tools(),
                    "info" => cmd_info(),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);
    session.close().await;

    Ok(())
}

fn home_dir() -> std::path::PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    std::path::PathBuf::from(home)
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<12} {desc}");
    }
    eprintln!();
}

async fn cmd_time(session: &mut ExtractionSession) {
    let snapshot = session.current_time_data().await;
    eprintln!();
    eprintln!("  Time:      {}", snapshot.current_time);
    eprintln!("  Shamsi:    {}", snapshot.current_date);
    eprintln!("  Hijri:     {}", snapshot.hijri_date);
    eprintln!("  Gregorian: {}", snapshot.gregorian_date);
    if !session.is_ready() {
        eprintln!("  \x1b[90m(computed locally)\x1b[0m");
    }
    eprintln!();
}

async fn cmd_events(session: &mut ExtractionSession) {
    let events = session.events_data().await;
    eprintln!();
    if events.is_empty() {
        eprintln!("  No events.");
    }
    for event in &events {
        if event.extra.is_empty() {
            eprintln!("  {:<14} {}", event.date, event.title);
        } else {
            eprintln!("  {:<14} {} \x1b[90m{}\x1b[0m", event.date, event.title, event.extra);
        }
    }
    eprintln!();
}

fn print_status(session: &ExtractionSession) {
    match session.state() {
        SessionState::Ready => eprintln!("  Session:  \x1b[32mready\x1b[0m"),
        SessionState::Uninitialized => eprintln!("  Session:  not initialized"),
        SessionState::Degraded { reason } => {
            eprintln!("  Session:  \x1b[33mdegraded\x1b[0m ({reason})")
        }
    }
    eprintln!("  Target:   {}", session.config().target_url);
    eprintln!();
}

fn cmd_info() {
    let capabilities = crate::types::InitializeResult::default_result();
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!(
        "  Server:   {} v{}",
        capabilities.server_info.name, capabilities.server_info.version
    );
    eprintln!("  Protocol: {}", capabilities.protocol_version);
    eprintln!("  Tools:    {}", tools.len());
    eprintln!();
}

fn cmd_tools() {
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!("  {} MCP tools available:", tools.len());
    eprintln!();
    for tool in &tools {
        eprintln!("    {:<24} {}", tool.name, tool.description);
    }
    eprintln!();
}

//! Chunkchat CLI: split long documents into word chunks and chat with a hosted LLM.

mod commands;

use anyhow::{Context, Result};
use chunkchat_api::OpenAiCompatProvider;
use chunkchat_chunker::Chunker;
use chunkchat_config::{ChunkchatConfig, CliOverrides, RetrySettings};
use chunkchat_core::{ChatSession, RetryPolicy, SessionConfig};
use chunkchat_types::Role;
use clap::{Args, Parser, Subcommand};
use commands::SlashCommand;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "chunkchat",
    version,
    about = "Chunk long documents and chat with hosted LLMs"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Send a single prompt and print the response (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Model to use
    #[arg(long, global = true)]
    model: Option<String>,

    /// Maximum tokens in the response
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// API key (overrides DASHSCOPE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// System prompt for new sessions (empty string disables it)
    #[arg(long, global = true)]
    system_prompt: Option<String>,

    /// Maximum completion attempts per message
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Split a document into overlapping word chunks
    Chunk(ChunkArgs),
    /// Start an interactive chat (the default)
    Chat,
}

#[derive(Args)]
struct ChunkArgs {
    /// File to split (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Maximum words per chunk
    #[arg(long)]
    max_words: Option<usize>,

    /// Words shared by consecutive chunks
    #[arg(long)]
    overlap: Option<usize>,

    /// Print chunks as a JSON array
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Some(Command::Chunk(args)) = &cli.command {
        return run_chunk(args);
    }

    let config = ChunkchatConfig::load(CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        max_tokens: cli.max_tokens,
        system_prompt: cli.system_prompt,
        max_attempts: cli.max_attempts,
    })
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut session = create_session(&config)?;

    if let Some(prompt) = cli.print {
        // Print mode: single prompt, single reply
        let reply = session.send(prompt).await?;
        println!("{reply}");
        return Ok(());
    }

    repl(&mut session).await
}

fn run_chunk(args: &ChunkArgs) -> Result<()> {
    let settings =
        chunkchat_config::load_settings_file(&chunkchat_config::config_dir().join("config.toml"));
    let max_words = args.max_words.unwrap_or(settings.chunk.max_words);
    let overlap = args.overlap.unwrap_or(settings.chunk.overlap);
    let chunker = Chunker::new(max_words, overlap)?;

    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let chunks = chunker.split(&text);
    tracing::debug!(
        "Split into {} chunks (max_words {max_words}, overlap {overlap})",
        chunks.len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&chunks)?)?;
    } else {
        for (i, chunk) in chunks.iter().enumerate() {
            writeln!(out, "{i} {chunk}")?;
        }
    }
    Ok(())
}

fn create_session(config: &ChunkchatConfig) -> Result<ChatSession> {
    let provider = OpenAiCompatProvider::with_timeout(
        &config.api_key,
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("Failed to create API client")?;

    let mut session_config = SessionConfig::new(&config.model, config.max_tokens);
    session_config.system_prompt = config.system_prompt.clone();
    session_config.max_history_turns = config.max_history_turns;

    Ok(ChatSession::new(Arc::new(provider), session_config)
        .with_retry_policy(retry_policy(&config.retry)))
}

fn retry_policy(settings: &RetrySettings) -> RetryPolicy {
    RetryPolicy::new(
        Duration::from_millis(settings.min_delay_ms),
        Duration::from_millis(settings.max_delay_ms),
        settings.max_attempts,
    )
    .with_multiplier(Duration::from_millis(settings.multiplier_ms))
}

async fn repl(session: &mut ChatSession) -> Result<()> {
    let stdin = io::stdin();

    eprintln!(
        "chunkchat v{} (model: {})",
        env!("CARGO_PKG_VERSION"),
        session.config().model
    );
    eprintln!("Type your message. /help for commands, Ctrl+D to exit.\n");

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut input = String::new();
        let bytes_read = stdin.lock().read_line(&mut input)?;
        if bytes_read == 0 {
            eprintln!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = commands::parse(input) {
            match command {
                SlashCommand::Quit => break,
                SlashCommand::Help => eprintln!("{}", commands::help_text()),
                SlashCommand::Reset => {
                    session.reset();
                    eprintln!("Conversation cleared (system prompt dropped).");
                }
                SlashCommand::History => print_history(session),
                SlashCommand::Stats => print_stats(session),
                SlashCommand::Model => eprintln!("Current model: {}", session.config().model),
                SlashCommand::Unknown(cmd) => {
                    eprintln!("Unknown command: {cmd}. Type /help for available commands.")
                }
            }
            continue;
        }

        match session.send(input).await {
            Ok(reply) => println!("{reply}\n"),
            Err(e) => eprintln!("\nError: {e}"),
        }
    }

    print_stats(session);
    Ok(())
}

fn print_history(session: &ChatSession) {
    if session.history().is_empty() {
        eprintln!("(empty conversation)");
        return;
    }
    for turn in session.history() {
        let label = match turn.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        eprintln!("[{label}] {}", turn.content);
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    eprintln!(
        "Model: {}, turns: {}, exchanges: {}, failed: {}",
        stats.model, stats.turn_count, stats.exchanges, stats.failed_sends
    );
    eprintln!(
        "Tokens: prompt {}, completion {}, total {}",
        stats.usage.prompt_tokens, stats.usage.completion_tokens, stats.usage.total_tokens
    );
}

//! mcp-chat: terminal front end for an MCP agent endpoint
//!
//! Sends each message to the agent's `/chat` endpoint and shows the reply with
//! its processing trace (steps, tools, agent metadata).
//!
//! # Subcommands
//! - `chat` (default): interactive session
//! - `ask <message> [--json] [--details]`: send one message and print the reply
//! - `config`: print the effective configuration

mod render;

use clap::{Parser, Subcommand};
use mcp_chat_core::config::DEFAULT_CONFIG_PATH;
use mcp_chat_core::{ChatCommand, ChatConfig, ChatSession, Message, Outcome, Screen};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "mcp-chat",
    version,
    about = "Chat with an MCP agent and inspect how each reply was produced"
)]
struct Cli {
    /// Path to the TOML config file (optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Agent base URL (overrides agent.base_url and the MCP_CHAT_URL env var)
    #[arg(long, env = "MCP_CHAT_URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat,

    /// Send a single message and print the reply
    Ask {
        /// Message text
        message: String,

        /// Print the reply and its trace summary as JSON
        #[arg(long)]
        json: bool,

        /// Show the expanded processing details
        #[arg(long)]
        details: bool,
    },

    /// Print the effective configuration
    Config,
}

// ============================================================================
// Chat input parsing
// ============================================================================

#[derive(Debug, PartialEq)]
enum ChatInput {
    Command(ChatCommand),
    Help,
    Quit,
    Invalid(String),
}

fn parse_index(arg: Option<&str>, usage: &str) -> Result<usize, String> {
    arg.and_then(|a| a.trim().parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .ok_or_else(|| format!("usage: {}", usage))
}

fn parse_chat_input(line: &str, messages: &[Message]) -> ChatInput {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return ChatInput::Command(ChatCommand::Send(line.to_string()));
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match name {
        "/quit" | "/exit" => ChatInput::Quit,
        "/help" => ChatInput::Help,
        "/clear" => ChatInput::Command(ChatCommand::Clear),
        "/back" => ChatInput::Command(ChatCommand::Back),
        "/send" => ChatInput::Command(ChatCommand::SendDraft),
        "/suggest" => match parse_index(arg, "/suggest N") {
            Ok(n) => ChatInput::Command(ChatCommand::PickSuggestion(n - 1)),
            Err(e) => ChatInput::Invalid(e),
        },
        "/details" => match parse_index(arg, "/details N") {
            Ok(n) => match render::nth_reply(messages, n) {
                Some(message) => ChatInput::Command(ChatCommand::ToggleDetails(message.id)),
                None => ChatInput::Invalid(format!("no agent reply #{}", n)),
            },
            Err(e) => ChatInput::Invalid(e),
        },
        other => ChatInput::Invalid(format!("unknown command {} (try /help)", other)),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn print_chat(session: &ChatSession, config: &ChatConfig) {
    if session.messages().is_empty() {
        println!("{}", render::render_suggestions(session.suggestions()));
    } else {
        println!(
            "{}",
            render::render_conversation(session.messages(), |m| session.is_expanded(m.id))
        );
    }
    if !session.draft().is_empty() {
        println!("{}", render::render_draft(session.draft(), config.ui.input_limit));
    }
}

async fn run_chat(config: &ChatConfig) -> anyhow::Result<()> {
    let mut session = ChatSession::from_config(config)?;
    tracing::info!(url = %config.agent.chat_url(), "Interactive chat started");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", render::render_welcome());

    while let Some(line) = lines.next_line().await? {
        match session.screen() {
            Screen::Welcome => match line.trim() {
                "" | "start" => {
                    session.dispatch(ChatCommand::Start).await;
                    println!("{}\n", render::render_help());
                    print_chat(&session, config);
                }
                "quit" | "/quit" => break,
                _ => println!("Press Enter to begin, or type `quit` to exit."),
            },
            Screen::Chat => {
                let command = match parse_chat_input(&line, session.messages()) {
                    ChatInput::Command(command) => command,
                    ChatInput::Help => {
                        println!("{}", render::render_help());
                        continue;
                    }
                    ChatInput::Quit => break,
                    ChatInput::Invalid(message) => {
                        eprintln!("mcp-chat: {}", message);
                        continue;
                    }
                };

                if matches!(command, ChatCommand::Send(_) | ChatCommand::SendDraft) {
                    println!("{}", render::render_thinking());
                }

                match session.dispatch(command).await {
                    Outcome::Navigated(Screen::Welcome) => println!("{}", render::render_welcome()),
                    Outcome::Ignored => {}
                    _ => print_chat(&session, config),
                }
            }
        }
    }

    Ok(())
}

async fn run_ask(
    config: &ChatConfig,
    message: &str,
    json_output: bool,
    details: bool,
) -> anyhow::Result<()> {
    let mut session = ChatSession::from_config(config)?;
    session.dispatch(ChatCommand::Start).await;

    let id = match session.dispatch(ChatCommand::Send(message.to_string())).await {
        Outcome::Replied(id) => id,
        _ => anyhow::bail!("nothing to send: message is empty"),
    };

    let reply = session
        .messages()
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| anyhow::anyhow!("reply {} missing from conversation", id))?;

    if json_output {
        let body = serde_json::json!({
            "message": reply,
            "summary": session.summary(id),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", render::render_message(reply, None, details));
    }

    Ok(())
}

fn print_config(config: &ChatConfig) {
    println!("Log level:    {}", config.service.log_level);
    println!("Agent URL:    {}", config.agent.chat_url());
    println!("Timeout:      {}s", config.agent.timeout_seconds);
    println!("Input limit:  {}", config.ui.input_limit);
    println!("Suggestions:  {}", config.ui.suggestions.len());
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match ChatConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-chat: failed to load config from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };
    if let Some(server) = cli.server {
        config.agent.base_url = server.trim_end_matches('/').to_string();
        config.validate()?;
    }

    // Logs go to stderr so they never interleave with the conversation on stdout
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&config).await,
        Commands::Ask {
            message,
            json,
            details,
        } => run_ask(&config, &message, json, details).await,
        Commands::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_plain_text_is_sent_verbatim() {
        assert_eq!(
            parse_chat_input("  what is 2+2? ", &[]),
            ChatInput::Command(ChatCommand::Send("  what is 2+2? ".to_string()))
        );
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_chat_input("/clear", &[]), ChatInput::Command(ChatCommand::Clear));
        assert_eq!(parse_chat_input("/back", &[]), ChatInput::Command(ChatCommand::Back));
        assert_eq!(parse_chat_input("/send", &[]), ChatInput::Command(ChatCommand::SendDraft));
        assert_eq!(parse_chat_input("/quit", &[]), ChatInput::Quit);
        assert_eq!(parse_chat_input("/help", &[]), ChatInput::Help);
        assert_eq!(
            parse_chat_input("/suggest 2", &[]),
            ChatInput::Command(ChatCommand::PickSuggestion(1))
        );
    }

    #[test]
    fn test_bad_arguments_are_invalid() {
        assert!(matches!(parse_chat_input("/suggest", &[]), ChatInput::Invalid(_)));
        assert!(matches!(parse_chat_input("/suggest 0", &[]), ChatInput::Invalid(_)));
        assert!(matches!(parse_chat_input("/details x", &[]), ChatInput::Invalid(_)));
        assert!(matches!(parse_chat_input("/dance", &[]), ChatInput::Invalid(_)));
    }

    #[test]
    fn test_details_targets_nth_agent_reply() {
        let messages = vec![
            Message::user("2+2", Utc::now()),
            Message::agent("4", None, Utc::now()),
            Message::user("3+3", Utc::now()),
            Message::agent("6", None, Utc::now()),
        ];

        assert_eq!(
            parse_chat_input("/details 2", &messages),
            ChatInput::Command(ChatCommand::ToggleDetails(messages[3].id))
        );
        assert!(matches!(parse_chat_input("/details 3", &messages), ChatInput::Invalid(_)));
    }

    #[test]
    fn test_cli_parses_ask() {
        let cli = Cli::try_parse_from(["mcp-chat", "ask", "2+2", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Ask { message, json, details }) => {
                assert_eq!(message, "2+2");
                assert!(json);
                assert!(!details);
            }
            other => panic!("Expected Ask, got {:?}", other),
        }
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
    }
}

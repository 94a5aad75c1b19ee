//! keepsake - interactive terminal chat.
//!
//! Usage: `keepsake [config.toml|config.json|config.yaml]`
//!
//! Without a config file, settings come from `KEEPSAKE_*` environment
//! variables. Lines starting with `/` are commands; everything else is a
//! message.

use anyhow::{Context, Result};
use keepsake_core::{
    AgentConfig, ConversationSession, KeepsakeError, Mood, ResponseRenderer, SuggestionProvider,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const HELP: &str = "\
Commands:
  /remember <category> [importance] <text>   store a fact
  /suggest <mood>                             show an activity idea
  /stats                                      session statistics as JSON
  /help                                       this text
  /quit                                       leave";

enum Command<'a> {
    Remember {
        category: &'a str,
        importance: Option<u8>,
        text: String,
    },
    Suggest(&'a str),
    Stats,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let mut parts = line.split_whitespace();
    match parts.next().unwrap_or_default() {
        "/remember" => {
            let category = parts.next().unwrap_or_default();
            let rest: Vec<&str> = parts.collect();
            let (importance, words) = match rest.split_first() {
                Some((first, tail)) => match first.parse::<u8>() {
                    Ok(importance) => (Some(importance), tail),
                    Err(_) => (None, &rest[..]),
                },
                None => (None, &rest[..]),
            };
            Command::Remember {
                category,
                importance,
                text: words.join(" "),
            }
        }
        "/suggest" => Command::Suggest(parts.next().unwrap_or_default()),
        "/stats" => Command::Stats,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other),
    }
}

fn load_config() -> Result<AgentConfig> {
    match std::env::args().nth(1) {
        Some(path) => AgentConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path)),
        None => Ok(AgentConfig::from_env()),
    }
}

/// Handle one command. Returns `false` when the session should end.
fn run_command(session: &ConversationSession, command: Command<'_>) -> Result<bool> {
    match command {
        Command::Remember {
            category,
            importance,
            text,
        } => match session.remember(&text, category, importance) {
            Ok(fact) => println!("Remembered #{} ({})", fact.id, fact.category),
            Err(e @ KeepsakeError::Persistence { .. }) => {
                warn!(error = %e, "Fact kept for this session only");
                println!("Remembered for now, but saving to disk failed.");
            }
            Err(e) => println!("Could not remember that: {}", e),
        },
        Command::Suggest(label) => {
            let mood = match Mood::parse_label(label) {
                Ok(mood) => mood,
                Err(e) => {
                    println!("{} (moods: {})", e, Mood::all_names().join(", "));
                    return Ok(true);
                }
            };
            match session.router().suggestions().suggest_for(mood)? {
                Some(suggestion) => {
                    let text = session
                        .router()
                        .renderer()
                        .render_suggestion(mood, "", &suggestion)?;
                    println!("{}", text);
                }
                None => println!("No ideas for a {} mood.", mood),
            }
        }
        Command::Stats => println!("{}", serde_json::to_string_pretty(&session.stats())?),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
        Command::Unknown(name) => println!("Unknown command {}. Try /help.", name),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with replies.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::WARN.into())
                .add_directive("keepsake=info".parse()?)
                .add_directive("keepsake_core=info".parse()?),
        )
        .init();

    let config = load_config()?;
    let mut session = ConversationSession::from_config(&config)?;
    session.on_outreach_due(|event, text| {
        info!(silence_secs = event.silence_secs, "Reaching out");
        println!("\n{}", text);
    })?;
    info!(
        facts = session.store().len(),
        path = %config.facts_path.display(),
        "Session ready"
    );
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            if !run_command(&session, parse_command(line))? {
                break;
            }
            continue;
        }

        let outcome = session.process_turn(line);
        println!("{}", outcome.final_text);
        info!(
            mood = %outcome.mood,
            route = %outcome.route_summary(),
            safety_score = outcome.safety_score,
            "Turn complete"
        );
    }

    session.shutdown();
    Ok(())
}

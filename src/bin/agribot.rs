// Terminal front end for the Urea reduction advisor
//
// Usage: cargo run --bin agribot
// Each input line is a chat message; lines starting with '/' are commands.

use agribot::{
    Config, JsonFormatter, MarkdownFormatter, OutputFormat, Reply, Session, TableKind, TableSet,
};
use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const GREETING: &str = "Hello! I am ready. Try asking: *'Plan for Rice in Ludhiana'*";

const HELP: &str = "\
Commands:
  /upload crop <path>       replace the crop requirement table
  /upload district <path>   replace the district soil table
  /reset                    discard uploads and go back to the default tables
  /status                   show loaded table sizes
  /help                     show this help
  /quit                     exit
Anything else is treated as a question, e.g. 'Check Wheat for Hisar'.";

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Upload(TableKind, &'a str),
    Reset,
    Status,
    Help,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message(line);
    };

    let mut parts = rest.splitn(3, char::is_whitespace);
    match (parts.next(), parts.next(), parts.next().map(str::trim)) {
        (Some("upload"), Some("crop"), Some(path)) if !path.is_empty() => {
            Command::Upload(TableKind::Crop, path)
        }
        (Some("upload"), Some("district"), Some(path)) if !path.is_empty() => {
            Command::Upload(TableKind::District, path)
        }
        (Some("reset"), None, None) => Command::Reset,
        (Some("status"), None, None) => Command::Status,
        (Some("help"), None, None) => Command::Help,
        (Some("quit") | Some("exit"), None, None) => Command::Quit,
        _ => Command::Unknown(line),
    }
}

fn render(reply: &Reply, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            JsonFormatter::format_reply(reply).context("Failed to serialize reply")
        }
        OutputFormat::Markdown => Ok(match reply {
            Reply::Recommendation(rec) => MarkdownFormatter::format(rec),
            Reply::Clarification(text) => text.clone(),
            Reply::Error(text) => format!("⚠️ {}", text),
        }),
    }
}

fn upload(session: &mut Session, kind: TableKind, path: &str) -> Reply {
    let path = Path::new(path);
    let result = match kind {
        TableKind::Crop => session.upload_crop_table_from_path(path),
        TableKind::District => session.upload_district_table_from_path(path),
    };

    match result {
        Ok(()) => {
            let status = session.status();
            Reply::Clarification(format!(
                "✅ Loaded {}: {} crops, {} districts active.",
                kind, status.crops, status.districts
            ))
        }
        Err(err) => Reply::from_load_error(&err),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging) on stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agribot=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!("Configuration:");
    tracing::info!("  crop table: {:?}", config.crop_table);
    tracing::info!("  district table: {:?}", config.district_table);
    tracing::info!("  format: {:?}", config.format);

    let defaults = TableSet::from_paths(config.crop_table.as_deref(), config.district_table.as_deref())
        .context("Failed to load reference tables")?;
    let mut session = Session::new(defaults);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "🌱 AgriBot\n\n{}\n", GREETING)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read input")?;

        let reply = match parse_command(&line) {
            Command::Message("") => continue,
            Command::Message(text) => session.handle_message(text),
            Command::Upload(kind, path) => upload(&mut session, kind, path),
            Command::Reset => {
                session.reset();
                Reply::Clarification("🔄 Reset to the default tables.".to_string())
            }
            Command::Status => {
                let status = session.status();
                Reply::Clarification(format!(
                    "📊 Crops loaded: {}{}\n📊 Districts loaded: {}{}",
                    status.crops,
                    if status.crops_uploaded { " (uploaded)" } else { "" },
                    status.districts,
                    if status.districts_uploaded { " (uploaded)" } else { "" },
                ))
            }
            Command::Help => Reply::Clarification(HELP.to_string()),
            Command::Quit => break,
            Command::Unknown(cmd) => Reply::Error(format!("Unknown command '{}'. Type /help.", cmd)),
        };

        writeln!(out, "{}\n", render(&reply, config.format)?)?;
        out.flush()?;
    }

    Ok(())
}

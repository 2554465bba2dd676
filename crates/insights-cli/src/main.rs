//! # insightsctl
//!
//! Operator CLI for the Insights engine: track one-off events, force a
//! flush, and inspect or prune the local event database.

#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use insights_settings::{InsightsSettings, load_settings, load_settings_from_path};

/// Insights telemetry control.
#[derive(Parser, Debug)]
#[command(name = "insightsctl", about = "Insights telemetry control", version)]
struct Cli {
    /// Settings file (default: `~/.insights/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Path to the `SQLite` event database (overrides settings).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Log level (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one event, then flush and exit.
    Track {
        #[command(subcommand)]
        event: TrackCommand,
    },
    /// Send everything currently stored.
    Flush,
    /// Print the number of stored events.
    Pending,
    /// Delete stored events older than the given age.
    Purge {
        /// Age threshold in days.
        #[arg(long)]
        older_than_days: u32,
    },
}

#[derive(Subcommand, Debug)]
enum TrackCommand {
    /// Page impression.
    Impression {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Click on a link.
    Click {
        #[command(flatten)]
        page: PageArgs,
        /// Link or button label.
        #[arg(long)]
        link: String,
    },
    /// Error shown on a page.
    Error {
        #[command(flatten)]
        page: PageArgs,
        /// Error type (`API`, `FORM`, `CONNECTION`, `EXCEPTION`).
        #[arg(long = "type")]
        error_type: String,
        /// Error message.
        #[arg(long)]
        message: String,
        /// Related field name.
        #[arg(long, default_value = "")]
        field: String,
        /// Detailed description.
        #[arg(long, default_value = "")]
        description: String,
        /// Error code.
        #[arg(long, default_value = "")]
        code: String,
    },
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Page name.
    #[arg(long)]
    page: String,
    /// Page group.
    #[arg(long)]
    group: String,
    /// Extra event field as `key=value` (wire key), repeatable.
    #[arg(long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,
}

fn parse_key_val(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn resolve_settings(cli: &Cli) -> Result<InsightsSettings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };
    if let Some(path) = &cli.db_path {
        settings.storage.database_path = Some(path.display().to_string());
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level.clone_from(level);
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    insights_core::logging::init_subscriber(&settings.logging.level);

    match cli.command {
        Command::Track { event } => commands::track(settings, event.into()).await,
        Command::Flush => commands::flush(settings).await,
        Command::Pending => commands::pending(&settings),
        Command::Purge { older_than_days } => commands::purge(&settings, older_than_days),
    }
}

impl From<TrackCommand> for insights::TrackRequest {
    fn from(command: TrackCommand) -> Self {
        match command {
            TrackCommand::Impression { page } => {
                Self::impression(page.page, page.group, page.params.into_iter().collect())
            }
            TrackCommand::Click { page, link } => {
                Self::click(page.page, page.group, link, page.params.into_iter().collect())
            }
            TrackCommand::Error {
                page,
                error_type,
                message,
                field,
                description,
                code,
            } => Self::error(
                page.page,
                page.group,
                insights::ErrorInfo::new(error_type, message, field, description, code),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights::EventKind;

    #[test]
    fn parses_key_value() {
        assert_eq!(
            parse_key_val("goal=transfer").unwrap(),
            ("goal".to_string(), "transfer".to_string())
        );
        assert_eq!(
            parse_key_val("link=a=b").unwrap(),
            ("link".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn parses_track_impression_with_params() {
        let cli = Cli::try_parse_from([
            "insightsctl",
            "track",
            "impression",
            "--page",
            "p",
            "--group",
            "g",
            "--param",
            "goal=x",
            "--param",
            "hyperwallet_ea_country=CA",
        ])
        .unwrap();
        let Command::Track { event } = cli.command else {
            panic!("expected track");
        };
        let request: insights::TrackRequest = event.into();
        assert_eq!(request.kind, EventKind::Impression);
        let params = request.params.unwrap();
        assert_eq!(params.get("goal").map(String::as_str), Some("x"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn parses_track_error() {
        let cli = Cli::try_parse_from([
            "insightsctl",
            "track",
            "error",
            "--page",
            "p",
            "--group",
            "g",
            "--type",
            "FORM",
            "--message",
            "required",
            "--code",
            "empty",
        ])
        .unwrap();
        let Command::Track { event } = cli.command else {
            panic!("expected track");
        };
        let request: insights::TrackRequest = event.into();
        assert_eq!(request.kind, EventKind::Error);
        let error = request.error.unwrap();
        assert_eq!(error.error_type, "FORM");
        assert_eq!(error.code, "empty");
        assert_eq!(error.field_name, "");
    }

    #[test]
    fn click_requires_link() {
        let result = Cli::try_parse_from([
            "insightsctl", "track", "click", "--page", "p", "--group", "g",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "insightsctl",
            "purge",
            "--older-than-days",
            "7",
            "--db-path",
            "/tmp/x.db",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Purge { older_than_days: 7 }));
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn resolve_settings_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        std::fs::write(&file, r#"{"logging":{"level":"info"},"batching":{"maxBatchSize":3}}"#)
            .unwrap();
        let cli = Cli::try_parse_from([
            "insightsctl",
            "--settings",
            file.to_str().unwrap(),
            "--db-path",
            "/tmp/events.db",
            "pending",
        ])
        .unwrap();
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.batching.max_batch_size, 3);
        assert_eq!(settings.storage.database_path.as_deref(), Some("/tmp/events.db"));
    }
}

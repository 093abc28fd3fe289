//! `epg` CLI: query an XMLTV programme guide from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # List channels (stdin -> stdout)
//! curl -s https://example.com/guide.xml | epg channels
//!
//! # What is on now, in Jerusalem time
//! epg -i guide.xml --tz Asia/Jerusalem now --channel-id kan11.il
//!
//! # Today and tomorrow for one channel
//! epg -i guide.xml schedule --channel-id bbc1.uk --full-schedule
//!
//! # Search tomorrow's titles on one channel
//! epg -i guide.xml search "news" --channel-name "BBC One" --date tomorrow
//!
//! # Does the guide still cover tomorrow?
//! epg -i guide.xml stale
//!
//! # Channel selection and timezone from a stored config entry
//! epg -i guide.xml --config sensor.json now
//! ```
//!
//! Every command prints pretty JSON. Logs go to stderr (`-v`, `-vv` or
//! `RUST_LOG`).

use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use epg_core::{looks_like_guide, search_at, ChannelSnapshot, DateScope, Guide, GuideOptions};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "epg", version, about = "Query XMLTV programme guides")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// XMLTV input file (reads from stdin if omitted)
    #[arg(short, long, global = true)]
    input: Option<String>,

    /// JSON file holding guide options (time_zone, selected_channels, ...)
    #[arg(long, global = true)]
    config: Option<String>,

    /// IANA timezone for today/tomorrow, e.g. "Europe/London"
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Keep only the channel with this display name (repeatable)
    #[arg(long = "channel", global = true, conflicts_with = "all")]
    channels: Vec<String>,

    /// Keep every channel in the document
    #[arg(long, global = true)]
    all: bool,

    /// Include tomorrow in schedules
    #[arg(long, global = true)]
    full_schedule: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Pin the clock to an RFC 3339 instant
    #[arg(long, global = true, hide = true, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// List channels with their programme counts
    Channels,
    /// Show what airs now and next
    Now {
        /// Limit to one channel id (all channels if omitted)
        #[arg(long)]
        channel_id: Option<String>,
    },
    /// Show the remaining schedule of one channel
    Schedule {
        #[arg(long)]
        channel_id: String,
    },
    /// Search programme titles with a case-insensitive regex
    Search {
        pattern: String,
        /// Exact display name of the channel to search
        #[arg(long)]
        channel_name: Option<String>,
        /// today, tomorrow or any
        #[arg(long, default_value_t = DateScope::Any)]
        date: DateScope,
    },
    /// Report whether the guide needs refetching
    Stale,
}

#[derive(Serialize)]
struct ChannelSummary<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    programmes: usize,
}

#[derive(Serialize)]
struct Staleness {
    stale: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = build_options(&cli)?;
    debug!(?options, "resolved guide options");

    let text = read_input(cli.input.as_deref())?;
    if !looks_like_guide(&text) {
        bail!("Input does not look like an XMLTV guide");
    }
    let guide = Guide::from_options(&text, &options).context("Failed to parse XMLTV guide")?;
    let now = cli.now.unwrap_or_else(Utc::now);

    let output = match cli.command {
        Commands::Channels => {
            let summaries: Vec<ChannelSummary<'_>> = guide
                .channels()
                .iter()
                .map(|c| ChannelSummary {
                    id: c.id(),
                    name: c.name(),
                    language: c.language(),
                    programmes: c.programmes().len(),
                })
                .collect();
            to_json(&summaries)?
        }
        Commands::Now { channel_id } => match channel_id {
            Some(id) => {
                let channel = guide
                    .get_channel_by_id(&id)
                    .with_context(|| format!("Unknown channel id: '{}'", id))?;
                to_json(&channel.snapshot_at(now, options.full_schedule))?
            }
            None => {
                let snapshots: Vec<ChannelSnapshot> = guide
                    .channels()
                    .iter()
                    .map(|c| c.snapshot_at(now, options.full_schedule))
                    .collect();
                to_json(&snapshots)?
            }
        },
        Commands::Schedule { channel_id } => {
            let channel = guide
                .get_channel_by_id(&channel_id)
                .with_context(|| format!("Unknown channel id: '{}'", channel_id))?;
            if options.full_schedule {
                to_json(&channel.programmes_per_day_at(now))?
            } else {
                to_json(&channel.programmes_for_today_at(now))?
            }
        }
        Commands::Search {
            pattern,
            channel_name,
            date,
        } => {
            let results = search_at(&guide, &pattern, channel_name.as_deref(), date, now)
                .context("Search failed")?;
            to_json(&results)?
        }
        Commands::Stale => to_json(&Staleness {
            stale: guide.is_stale_at(now),
        })?,
    };

    println!("{}", output);
    Ok(())
}

/// Stored config first, flags on top. Without either, every channel is kept.
fn build_options(cli: &Cli) -> Result<GuideOptions> {
    let mut options = match cli.config.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("Invalid config: {}", path))?
        }
        None => GuideOptions {
            generated: true,
            ..GuideOptions::default()
        },
    };

    if let Some(tz) = &cli.tz {
        options.time_zone = tz.clone();
    }
    if cli.all {
        options.generated = true;
    } else if !cli.channels.is_empty() {
        options.generated = false;
        options.selected_channels = cli.channels.clone();
    }
    if cli.full_schedule {
        options.full_schedule = true;
    }

    // Fail before reading a potentially large input.
    options
        .timezone()
        .with_context(|| format!("Invalid --tz / time_zone: '{}'", options.time_zone))?;
    Ok(options)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_now(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

//! Artdex - command line front end for an artwork catalog directory.
//!
//! Every invocation opens the catalog (which rescans its sources), runs one
//! command, and saves when the command changed anything. Logs go to stderr
//! so listings on stdout stay pipeable.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "artdex")]
#[command(about = "Browse and curate a folder of artwork")]
struct Args {
    /// Catalog directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Keep the previous snapshot as artlist.json.bak when saving
    #[arg(long)]
    keep_backup: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rescan all sources and save the reconciled catalog
    Scan {
        /// Ignore the saved snapshot and start from default curation
        #[arg(long)]
        fresh: bool,
    },
    /// Print the catalog in custom order
    List {
        /// Only items whose title or file name contains this text
        #[arg(short, long)]
        query: Option<String>,
        /// Only featured items
        #[arg(long)]
        featured_only: bool,
        /// Print records as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Set an item's title
    Title {
        /// File name or identity of the item
        item: String,
        title: String,
    },
    /// Mark an item as featured
    Feature {
        /// File name or identity of the item
        item: String,
        /// Remove the featured mark instead
        #[arg(long)]
        off: bool,
    },
    /// Move an item within the custom order
    Move {
        /// File name or identity of the item
        item: String,
        /// Positions to move; negative moves toward the top
        #[arg(allow_hyphen_values = true)]
        offset: isize,
    },
    /// Move a featured item within the featured order
    MoveFeatured {
        /// File name or identity of the item
        item: String,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Re-sort the whole catalog
    Sort {
        /// custom, date-desc, date-asc, name-asc, name-desc, title-asc,
        /// title-desc or featured
        mode: String,
    },
    /// Manage archive sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Copy archive items and transcode videos into the catalog directory
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SourcesAction {
    /// Show the folder flag and registered archives
    List,
    /// Register an archive (zip or tar)
    Add { path: PathBuf },
    /// Unregister the archive at this position (see `sources list`)
    Remove { index: usize },
    /// Unregister every archive
    Clear,
    /// Include or exclude the catalog directory itself
    IncludeFolder {
        #[arg(action = clap::ArgAction::Set)]
        include: bool,
    },
}

fn init_logging(debug: bool, format: LogFormat) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.log_format);
    debug!("Catalog directory: {}", args.dir.display());

    let mut catalog = artdex_core::Catalog::builder(&args.dir)
        .keep_backup(args.keep_backup)
        .build()?;

    commands::run(&mut catalog, args.command)
}

//! ccfs - create and inspect CCFS volume images
//!
//! Usage:
//!   ccfs mkfs disk.ccfs -c 1024          # 1024-block volume labelled "disk"
//!   ccfs mkfs disk.ccfs -s 4M -l data    # size given in bytes
//!   ccfs info disk.ccfs
//!   ccfs stat disk.ccfs /docs/readme
//!   ccfs ls disk.ccfs /docs
//!   ccfs tree disk.ccfs --json

mod commands;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "ccfs")]
#[command(version, about = "Create and inspect CCFS volume images")]
struct Args {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new, empty volume image
    Mkfs {
        /// Output image file (truncated if it exists)
        image: PathBuf,

        /// Volume label (defaults to the image file stem)
        #[arg(short, long)]
        label: Option<String>,

        /// Data pool size in blocks
        #[arg(short, long, conflicts_with = "size")]
        capacity: Option<u32>,

        /// Data pool size in bytes (e.g., 512K, 4M)
        #[arg(short, long)]
        size: Option<String>,
    },

    /// Show the volume header
    Info {
        image: PathBuf,
    },

    /// Show the record at a path
    Stat {
        image: PathBuf,
        path: String,
    },

    /// List a directory
    Ls {
        image: PathBuf,
        #[arg(default_value = "/")]
        path: String,
    },

    /// List every record reachable from the root
    Tree {
        image: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let json = args.json;
    match args.command {
        Command::Mkfs {
            image,
            label,
            capacity,
            size,
        } => {
            let options = commands::format_options(&image, label, capacity, size.as_deref())?;
            commands::mkfs(&image, &options, json)
        }
        Command::Info { image } => commands::info(&image, json),
        Command::Stat { image, path } => commands::stat(&image, &path, json),
        Command::Ls { image, path } => commands::ls(&image, &path, json),
        Command::Tree { image } => commands::tree(&image, json),
    }
}

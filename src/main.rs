// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "thetalink")]
#[command(about = "Control protocol tools for 360° cameras")]
#[command(version = thetalink::constants::app_info::version())]
struct Cli {
    /// Config file (default: <config dir>/thetalink/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CaptureArg {
    Photo,
    Video,
}

#[derive(Subcommand)]
enum Commands {
    /// List option keys with wire names and value shapes
    Keys,

    /// Decode a wire option record and print its normalized encoding
    Decode {
        /// JSON file holding an options object
        file: PathBuf,
    },

    /// Run a capture against a recorded transcript
    Replay {
        /// Transcript file
        transcript: PathBuf,

        #[arg(value_enum)]
        kind: CaptureArg,

        /// Seconds to record before stopping a video capture
        #[arg(short, long, default_value = "1")]
        duration: u64,
    },

    /// Replay preview frames from a transcript and save them as JPEG files
    Preview {
        /// Transcript file
        transcript: PathBuf,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Print the effective configuration
    Config {
        /// Write the effective configuration back to disk
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=thetalink=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Keys => cli::list_keys(),
        Commands::Decode { file } => cli::decode_file(&file),
        Commands::Replay {
            transcript,
            kind,
            duration,
        } => cli::replay_capture(&config, &transcript, kind, duration),
        Commands::Preview {
            transcript,
            output,
            limit,
        } => cli::replay_preview(&config, &transcript, output, limit),
        Commands::Config { save } => cli::show_config(&config, cli.config.as_deref(), save),
    }
}

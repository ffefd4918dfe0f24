//! keyroll — compile chord scripts and play them as timed key events.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use keyroll::config::PlayerConfig;
use keyroll::dsl::Compiler;
use keyroll::player::{CancelToken, LogSink, PlaybackOutcome, Player};

/// Script-driven virtual piano player
#[derive(Parser)]
#[command(name = "keyroll", version)]
#[command(about = "Compile chord scripts and play them as timed key events")]
struct Args {
    /// Log level (e.g. "info", "debug", "keyroll=trace")
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a script and print the resulting action listing
    Check {
        /// Script file to compile
        file: PathBuf,
    },
    /// Compile a script and play it
    Play {
        /// Script file to play
        file: PathBuf,

        /// Starting tempo, overriding the config file
        #[arg(long)]
        bpm: Option<u32>,

        /// Key hold time in milliseconds, overriding the config file
        #[arg(long)]
        hold_ms: Option<u64>,
    },
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_level.as_str())
        .init();

    let code = match args.command {
        Command::Check { file } => check(&file),
        Command::Play { file, bpm, hold_ms } => play(&file, bpm, hold_ms),
    };
    process::exit(code);
}

fn check(file: &Path) -> i32 {
    let (document, variables) = match Compiler::load(file) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    println!(
        "Opened {}\nParsed {} total actions, {} variables",
        file.display(),
        document.len(),
        variables.len()
    );
    print!("{}", document.listing());
    0
}

fn play(file: &Path, bpm: Option<u32>, hold_ms: Option<u64>) -> i32 {
    let document = match Compiler::load(file) {
        Ok((document, _)) => Arc::new(document),
        Err(e) => {
            error!("compile failed: {e}");
            return 1;
        }
    };

    let mut config = PlayerConfig::load().unwrap_or_default();
    if let Some(bpm) = bpm {
        config.initial_bpm = bpm;
    }
    if let Some(hold_ms) = hold_ms {
        config.key_hold_ms = hold_ms;
    }

    let cancel = CancelToken::new();
    let ctrlc_cancel = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || ctrlc_cancel.cancel()) {
        warn!("could not install Ctrl-C handler: {e}");
    }

    info!(
        "playing {} ({} actions, {} BPM)",
        file.display(),
        document.len(),
        config.tempo()
    );
    let handle = Player::new(config).start(document, cancel, LogSink);

    match handle.wait() {
        Ok(PlaybackOutcome::Finished) => {
            info!("done.");
            0
        }
        Ok(PlaybackOutcome::Stopped) => {
            info!("stopped.");
            0
        }
        Err(e) => {
            error!("{e}");
            1
        }
    }
}

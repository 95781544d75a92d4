// earwise: rhythm timing trainer front end.
//
// Runs the judgement engine against simulated time with scripted taps, or in
// real time with taps read from stdin.

mod realtime;
mod simulate;
mod sinks;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, ensure};
use clap::{Args, Parser, Subcommand};
use earwise_play::{AutoplayConfig, Collaborators, GameSession};
use earwise_timing::secs_to_us;
use earwise_types::GameConfig;
use log::info;

use sinks::ConsoleSink;

#[derive(Parser, Debug)]
#[command(name = "earwise", about = "Rhythm copy game with tap timing judgement")]
struct Cli {
    /// Show debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Inputs {
    /// Game config JSON. Defaults are used when omitted or missing.
    #[arg(long, env = "EARWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Pattern set JSON. The built-in bar is used when omitted.
    #[arg(long, env = "EARWISE_PATTERNS")]
    patterns: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a whole game on simulated time with autoplay taps; prints the
    /// summary as JSON.
    Simulate {
        #[command(flatten)]
        inputs: Inputs,

        /// Autoplay RNG seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Uniform tap jitter, +/- milliseconds.
        #[arg(long, default_value_t = 0.0)]
        jitter_ms: f64,

        /// Probability of skipping each onset.
        #[arg(long, default_value_t = 0.0)]
        skip: f64,

        /// Simulated frame length in milliseconds.
        #[arg(long, default_value_t = 16.667)]
        frame_ms: f64,
    },
    /// Play in real time: enter taps, 'p' pauses, 'q' or Ctrl-C quits.
    Play {
        #[command(flatten)]
        inputs: Inputs,

        /// Tick period in milliseconds.
        #[arg(long, default_value_t = 5)]
        tick_ms: u64,
    },
    /// Print the default game config as JSON.
    DefaultConfig,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Simulate {
            inputs,
            seed,
            jitter_ms,
            skip,
            frame_ms,
        } => {
            ensure!(jitter_ms.is_finite() && jitter_ms >= 0.0, "--jitter-ms must be >= 0");
            ensure!(frame_ms.is_finite() && frame_ms > 0.0, "--frame-ms must be > 0");
            let (config, patterns) =
                simulate::load_inputs(inputs.config.as_deref(), inputs.patterns.as_deref())?;
            let autoplay = AutoplayConfig {
                jitter_us: secs_to_us(jitter_ms / 1000.0),
                skip_probability: skip,
                seed,
            };
            let frame_us = secs_to_us(frame_ms / 1000.0);
            let summary = simulate::run(&config, &patterns, autoplay, frame_us)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Play { inputs, tick_ms } => {
            ensure!(tick_ms > 0, "--tick-ms must be > 0");
            let (config, patterns) =
                simulate::load_inputs(inputs.config.as_deref(), inputs.patterns.as_deref())?;
            let sinks = Collaborators::new(
                ConsoleSink::stdout(true),
                ConsoleSink::stdout(true),
                ConsoleSink::stdout(true),
            );
            let session = GameSession::from_config(&config, &patterns, sinks)?;
            match realtime::run(session, Duration::from_millis(tick_ms))? {
                Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                None => info!("game cancelled"),
            }
        }
        Command::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&GameConfig::default())?);
        }
    }
    Ok(())
}

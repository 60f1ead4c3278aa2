//! tracekey node binary.
//!
//! # Usage
//!
//! ```bash
//! # Create the broadcast secret
//! tracekey --data-dir ./data provision
//!
//! # Broadcast the current packet as an infected sender
//! tracekey --data-dir ./data send --infected
//!
//! # Match the receiver's log and report contacts
//! tracekey --data-dir ./data receive
//!
//! # Judge a raw report
//! tracekey check-report report.bin
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracekey_core::Store;
use tracekey_node::{
    Backend, NodeConfig, NodeError, Stores, SystemEnv, check_report, provision, receive, send,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// tracekey proximity-tracing node
#[derive(Parser, Debug)]
#[command(name = "tracekey")]
#[command(about = "Ephemeral-ID proximity tracing: sender, receiver and report server")]
#[command(version)]
struct Args {
    /// Directory holding every role's state
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// EphID window length in minutes (must divide 1440)
    #[arg(short, long, default_value = "10")]
    window: u32,

    /// Storage backend
    #[arg(long, value_enum, default_value_t = Backend::Dir)]
    backend: Backend,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the broadcast secret, or replace one sized for another window
    Provision,
    /// Broadcast the current packet to the receiver
    Send {
        /// Send as the infected identity and publish it to the roster
        #[arg(long)]
        infected: bool,
    },
    /// Match logged packets against the roster and report contacts
    Receive {
        /// Corrupt every report signature
        #[arg(long)]
        adversary: bool,
    },
    /// Evaluate a raw report message
    CheckReport {
        /// File holding the report bytes
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    if let Command::CheckReport { file } = &args.command {
        let verdict = check_report(file)?;
        tracing::info!("{}", String::from_utf8_lossy(verdict.response()));
        return Ok(());
    }

    let config = NodeConfig::new(&args.data_dir, args.window, args.backend)?;
    tracing::info!(data_dir = %config.data_dir.display(), window = args.window, backend = ?config.backend, "tracekey node");

    match config.backend {
        Backend::Dir => run(&Stores::open_dir(&config)?, &config, &args.command)?,
        Backend::Redb => run(&Stores::open_redb(&config)?, &config, &args.command)?,
    }

    Ok(())
}

fn run<S: Store>(stores: &Stores<S>, config: &NodeConfig, command: &Command) -> Result<(), NodeError> {
    let env = SystemEnv::new();

    match command {
        Command::Provision => {
            if provision(stores, config.schedule, &env)? {
                tracing::info!("broadcast secret created");
            } else {
                tracing::info!("broadcast secret already present");
            }
        },
        Command::Send { infected } => {
            let outcome = send(stores, config.schedule, &env, *infected)?;
            if !outcome.recorded {
                tracing::info!("packet for this window already logged");
            }
        },
        Command::Receive { adversary } => {
            let outcome = receive(stores, config.schedule, &env, *adversary)?;
            tracing::info!(
                packets = outcome.packets,
                matched = outcome.matched,
                reports = outcome.verdicts.len(),
                "receive complete"
            );
        },
        Command::CheckReport { file } => {
            check_report(file)?;
        },
    }

    Ok(())
}

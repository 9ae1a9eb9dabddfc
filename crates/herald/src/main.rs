// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - message dispatch worker.
//!
//! Binary entry point: loads configuration, then runs the long-lived
//! `serve` loop or one of the operator commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use herald_config::HeraldConfig;
use herald_core::MessageStatus;

/// Herald - delivers pending messages through a webhook sender.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dispatch loop until SIGINT or SIGTERM.
    Serve,
    /// Run a single dispatch cycle and print its report.
    RunOnce,
    /// Create the database and apply migrations.
    Init,
    /// Insert demo messages when the store is short of pending work.
    Seed {
        /// Insert exactly this many, regardless of how many are pending.
        #[arg(long)]
        count: Option<u32>,
    },
    /// List messages in one status, oldest first.
    List {
        #[arg(long)]
        status: MessageStatus,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// List sent messages.
    Sent {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// List messages addressed to one recipient.
    Recipient {
        recipient: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print message counts per status.
    Stats,
    /// Move a failed message back to pending with a fresh attempt budget.
    Requeue { id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => herald_config::load_and_validate_path(path),
        None => herald_config::load_and_validate(),
    };
    let config: HeraldConfig = match loaded {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::RunOnce) => commands::run_once(&config).await,
        Some(Commands::Init) => commands::init(&config).await,
        Some(Commands::Seed { count }) => commands::seed(&config, count).await,
        Some(Commands::List { status, limit }) => commands::list(&config, status, limit).await,
        Some(Commands::Sent { limit }) => commands::list(&config, MessageStatus::Sent, limit).await,
        Some(Commands::Recipient { recipient, limit }) => {
            commands::recipient(&config, &recipient, limit).await
        }
        Some(Commands::Stats) => commands::stats(&config).await,
        Some(Commands::Requeue { id }) => commands::requeue(&config, &id).await,
        None => {
            println!("herald: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_parses_status_name() {
        let cli = Cli::try_parse_from(["herald", "list", "--status", "failed", "--limit", "5"])
            .unwrap();
        match cli.command {
            Some(Commands::List { status, limit }) => {
                assert_eq!(status, MessageStatus::Failed);
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["herald", "list", "--status", "queued"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["herald", "stats", "--config", "/tmp/h.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/h.toml")));
    }
}

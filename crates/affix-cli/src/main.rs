//! affix: affinity-domain balance and storage placement.
//!
//! # Usage
//!
//! ```text
//! affix inventory import --file inventory.toml
//! affix balance --cluster prod
//! affix detect --cluster prod --format json
//! affix remediate --cluster prod --dry-run
//! affix rogue --cluster prod --apply
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

use commands::Context;

#[derive(Parser)]
#[command(
    name = "affix",
    about = "Affinity-domain balance and storage placement",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Configuration file (default: ./affix.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Inventory database, overriding [inventory].path.
    #[arg(long, global = true)]
    inventory: Option<PathBuf>,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Rendering of command results on stdout.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how far each domain's workload count is from its share of hosts
    Balance {
        /// Cluster name (default: [engine].default_cluster)
        #[arg(short, long)]
        cluster: Option<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List configuration files and disks stored outside their workload's domain
    Detect {
        #[arg(short, long)]
        cluster: Option<String>,
        /// Only this workload.
        #[arg(short, long)]
        workload: Option<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Relocate mismatched storage into each workload's own domain.
    ///
    /// Every mismatched workload gets one relocation covering its
    /// configuration and all disks. A workload whose destinations cannot all
    /// be resolved is skipped entirely.
    Remediate {
        #[arg(short, long)]
        cluster: Option<String>,
        #[arg(short, long)]
        workload: Option<String>,
        /// Resolve destinations and print the requests without submitting.
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Classify workloads that are in no workload group
    Rogue {
        #[arg(short, long)]
        cluster: Option<String>,
        /// Add classified workloads to their domain's group.
        #[arg(long)]
        apply: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Manage the local inventory
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },
    /// Manage affix.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum InventoryAction {
    /// Import a TOML or JSON inventory seed
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List relocation tasks
    Tasks {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Apply a queued relocation task
    Complete {
        #[arg(short, long)]
        task: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default affix.toml
    Init {
        #[arg(short, long, default_value = "affix.toml")]
        path: PathBuf,
        /// Default cluster to record in the file.
        #[arg(short, long)]
        cluster: Option<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new("warn,affix=info")?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init { path, cluster, force } => {
                commands::config::init(path, cluster.as_deref(), *force)
            }
        };
    }

    let ctx = Context::load(cli.config.as_deref(), cli.inventory)?;
    match cli.command {
        Commands::Balance { cluster, format } => commands::balance::run(&ctx, cluster, format),
        Commands::Detect { cluster, workload, format } => {
            commands::detect::run(&ctx, cluster, workload, format).await
        }
        Commands::Remediate { cluster, workload, dry_run, format } => {
            commands::remediate::run(&ctx, cluster, workload, dry_run, format).await
        }
        Commands::Rogue { cluster, apply, format } => commands::rogue::run(&ctx, cluster, apply, format),
        Commands::Inventory { action } => match action {
            InventoryAction::Import { file } => commands::inventory::import(&ctx, &file),
            InventoryAction::Tasks { format } => commands::inventory::tasks(&ctx, format),
            InventoryAction::Complete { task } => commands::inventory::complete(&ctx, &task),
        },
        Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "affix",
            "remediate",
            "--cluster",
            "prod",
            "--dry-run",
            "--inventory",
            "/tmp/inv.redb",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.inventory, Some(PathBuf::from("/tmp/inv.redb")));
        assert!(matches!(cli.log_format, LogFormat::Json));
        match cli.command {
            Commands::Remediate { cluster, dry_run, format, .. } => {
                assert_eq!(cluster.as_deref(), Some("prod"));
                assert!(dry_run);
                assert!(format == OutputFormat::Text);
            }
            _ => panic!("expected remediate"),
        }
    }
}

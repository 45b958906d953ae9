// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! plugreg - register plugin modules with a management catalog.
//!
//! This is the binary entry point.

mod inspect;
mod output;
mod register;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plugreg_config::PlugregConfig;
use plugreg_core::{ConflictDecision, IsolationMode};

/// plugreg - register plugin modules with a management catalog.
#[derive(Parser, Debug)]
#[command(name = "plugreg", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard search locations.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the identity of a module file.
    Inspect {
        path: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the plugin and workflow-activity types a module defines.
    Discover {
        path: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Register a module and the selected types with the catalog.
    Register {
        path: PathBuf,
        /// Type names to register; anything registered but not selected is removed.
        #[arg(long = "select", value_name = "TYPE", num_args = 1.., required_unless_present = "all")]
        select: Vec<String>,
        /// Register every discovered type.
        #[arg(long, conflicts_with = "select")]
        all: bool,
        /// Isolation mode for the module (defaults to configuration).
        #[arg(long, value_parser = parse_isolation)]
        isolation: Option<IsolationMode>,
        /// Answer for types already registered under another module.
        #[arg(long, value_parser = parse_decision, default_value = "abort")]
        on_conflict: ConflictDecision,
        /// Validate and print the plan without changing the catalog.
        #[arg(long)]
        dry_run: bool,
    },
    /// Refresh every registered module from the plugins folder.
    UpdateAll {
        /// Folder holding module builds (defaults to configuration).
        #[arg(long, value_name = "DIR")]
        plugins_folder: Option<PathBuf>,
        /// Answer for types already registered under another module.
        #[arg(long, value_parser = parse_decision, default_value = "abort")]
        on_conflict: ConflictDecision,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn parse_isolation(value: &str) -> Result<IsolationMode, String> {
    value
        .parse()
        .map_err(|_| format!("expected `none` or `sandbox`, got `{value}`"))
}

fn parse_decision(value: &str) -> Result<ConflictDecision, String> {
    value
        .parse()
        .map_err(|_| format!("expected `reuse`, `duplicate` or `abort`, got `{value}`"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => plugreg_config::load_and_validate_path(path),
        None => plugreg_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            plugreg_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &PlugregConfig) -> Result<(), plugreg_core::PlugregError> {
    let use_color = output::use_color(cli.plain);
    match cli.command {
        Commands::Inspect { path, json } => inspect::run_inspect(config, &path, json),
        Commands::Discover { path, json } => {
            inspect::run_discover(config, &path, json, use_color)
        }
        Commands::Register {
            path,
            select,
            all,
            isolation,
            on_conflict,
            dry_run,
        } => {
            let request = register::RegisterRequest {
                path,
                select,
                all,
                isolation: isolation.unwrap_or(config.registration.default_isolation),
                on_conflict,
                dry_run,
            };
            register::run_register(config, request, use_color).await
        }
        Commands::UpdateAll {
            plugins_folder,
            on_conflict,
        } => register::run_update_all(config, plugins_folder, on_conflict, use_color).await,
        Commands::Config => {
            let text = config
                .to_toml_string()
                .map_err(|e| plugreg_core::PlugregError::Config(e.to_string()))?;
            print!("{text}");
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugreg={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = plugreg_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn register_requires_selection_or_all() {
        assert!(Cli::try_parse_from(["plugreg", "register", "x.module"]).is_err());
        assert!(Cli::try_parse_from(["plugreg", "register", "x.module", "--all"]).is_ok());
        assert!(Cli::try_parse_from([
            "plugreg", "register", "x.module", "--all", "--select", "A"
        ])
        .is_err());
    }

    #[test]
    fn register_parses_options() {
        let cli = Cli::try_parse_from([
            "plugreg",
            "--config",
            "custom.toml",
            "register",
            "x.module",
            "--select",
            "Contoso.A",
            "Contoso.B",
            "--isolation",
            "Sandbox",
            "--on-conflict",
            "reuse",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Register {
                select,
                isolation,
                on_conflict,
                dry_run,
                ..
            } => {
                assert_eq!(select, vec!["Contoso.A", "Contoso.B"]);
                assert_eq!(isolation, Some(IsolationMode::Sandbox));
                assert_eq!(on_conflict, ConflictDecision::ReuseExisting);
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_conflict_answer_is_rejected() {
        assert!(Cli::try_parse_from([
            "plugreg",
            "register",
            "x.module",
            "--all",
            "--on-conflict",
            "maybe"
        ])
        .is_err());
    }
}

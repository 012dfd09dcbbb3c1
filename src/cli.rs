//! CLI argument parsing with subcommand architecture.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hello-actions", version, about = "Hello service with correlated structured logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default when no subcommand is given)
    Run(RunArgs),
    /// Validate a config file and print the effective settings
    CheckConfig(CheckConfigArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to config file
    #[arg(short, long, default_value = "config.yaml", env = "HELLO_ACTIONS_CONFIG")]
    pub config: String,

    /// Listen host
    #[arg(long, env = "HELLO_ACTIONS_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(long, env = "HELLO_ACTIONS_PORT")]
    pub port: Option<u16>,

    /// Log level or filter directive (overrides config, `RUST_LOG` overrides both)
    #[arg(long, env = "HELLO_ACTIONS_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: "config.yaml".to_string(),
            host: None,
            port: None,
            log_level: None,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Path to config file
    #[arg(short, long, default_value = "config.yaml", env = "HELLO_ACTIONS_CONFIG")]
    pub config: String,
}

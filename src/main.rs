mod app;
mod cli;

use clap::Parser;
use cli::{CheckConfigArgs, Cli, Command, RunArgs};
use hello_actions_core::config::Config;
use hello_actions_core::lifecycle::logging::init_logging;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => cmd_run(args),
        Command::CheckConfig(args) => cmd_check_config(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    // Peek at the config file for logging settings; errors are reported once
    // logging is up
    let loaded = Config::load(&args.config);
    let defaults = Config::default();
    let file_cfg = loaded.as_ref().unwrap_or(&defaults);

    let level = args
        .log_level
        .clone()
        .or_else(|| file_cfg.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let logging = init_logging(
        &level,
        file_cfg.log_format,
        file_cfg.logging_to_file,
        file_cfg.log_dir.as_deref(),
    )?;

    tracing::info!("Starting hello-actions v{}...", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        let application = app::Application::build(&args, loaded, logging.reloader.clone())?;
        application.serve().await
    });

    if let Err(ref e) = result {
        tracing::error!(error = %e, "hello-actions failed");
    }
    result
}

fn cmd_check_config(args: CheckConfigArgs) -> anyhow::Result<()> {
    let config = Config::load(&args.config)?;
    println!("{} is valid. Effective settings:", args.config);
    print!("{}", serde_yaml_ng::to_string(&config)?);
    Ok(())
}

//! Application struct that encapsulates server assembly and serving logic.

use crate::cli::RunArgs;
use hello_actions_core::config::Config;
use hello_actions_core::lifecycle::logging::LevelReloader;
use hello_actions_core::lifecycle::signal::{Shutdown, SignalHandler};
use hello_actions_core::lifecycle::{self, Lifecycle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub struct Application {
    config: Config,
    config_path: String,
    app_router: axum::Router,
    lifecycle: Box<dyn Lifecycle>,
    reloader: LevelReloader,
}

impl Application {
    /// Build the application from CLI args and the (possibly failed) config
    /// load done before logging was initialized.
    pub fn build(
        args: &RunArgs,
        loaded: anyhow::Result<Config>,
        reloader: LevelReloader,
    ) -> anyhow::Result<Self> {
        let mut config = loaded.unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to load config from '{}': {e}, using defaults",
                args.config
            );
            Config::default()
        });

        // CLI overrides
        if let Some(ref host) = args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            body_limit_mb = config.body_limit_mb,
            log_format = ?config.log_format,
            "Configuration loaded"
        );

        let app_router = hello_actions_server::build_router(&config);

        Ok(Self {
            config,
            config_path: args.config.clone(),
            app_router,
            lifecycle: lifecycle::detect_lifecycle(),
            reloader,
        })
    }

    /// Start serving HTTP, handle signals, and drain gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let Self {
            config,
            config_path,
            app_router,
            lifecycle,
            reloader,
        } = self;

        let (signal_handler, shutdown) = SignalHandler::new();
        let reload_lifecycle: Arc<dyn Lifecycle> = Arc::from(lifecycle::detect_lifecycle());
        let reload_fn = move || reload_log_level(&config_path, &reloader, &*reload_lifecycle);
        tokio::spawn(signal_handler.run(reload_fn));

        let addr = config.addr();
        serve_http(&addr, app_router, shutdown, &*lifecycle, config.shutdown_timeout).await?;

        tracing::info!("Server shut down.");
        Ok(())
    }
}

/// SIGHUP: re-read the config file and apply its `log-level`.
/// Listener settings only take effect on restart.
fn reload_log_level(path: &str, reloader: &LevelReloader, lifecycle: &dyn Lifecycle) {
    lifecycle.on_reloading();
    match Config::load(path) {
        Ok(new_cfg) => {
            if let Some(level) = new_cfg.log_level.as_deref() {
                match reloader.apply_config_level(level) {
                    Ok(true) => tracing::info!("Log level set to '{level}'"),
                    Ok(false) => tracing::info!("RUST_LOG is set, keeping its filter over '{level}'"),
                    Err(e) => tracing::error!("Failed to apply log level '{level}': {e}"),
                }
            }
            lifecycle.on_reloaded();
        }
        Err(e) => {
            tracing::error!("SIGHUP config reload failed: {e}");
        }
    }
}

async fn serve_http(
    addr: &str,
    app_router: axum::Router,
    shutdown: Shutdown,
    lifecycle: &dyn Lifecycle,
    shutdown_timeout: u64,
) -> anyhow::Result<()> {
    tracing::info!("Starting HTTP server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    lifecycle.on_ready();

    let deadline = shutdown.clone();
    let server = async move {
        axum::serve(
            listener,
            app_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await
    };

    // In-flight requests get `shutdown_timeout` seconds to finish once a
    // shutdown has been requested.
    tokio::select! {
        result = server => result?,
        _ = async move {
            deadline.wait().await;
            tokio::time::sleep(Duration::from_secs(shutdown_timeout)).await;
        } => {
            tracing::warn!("Graceful shutdown timed out after {shutdown_timeout}s, dropping open connections");
        }
    }

    lifecycle.on_stopping();
    Ok(())
}

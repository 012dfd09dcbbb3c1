//! OS signal handling: SIGTERM/SIGINT request shutdown, SIGHUP requests a
//! configuration reload.

use tokio::sync::watch;

/// Resolves once a shutdown has been requested.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is requested. Also returns if the signal handler
    /// went away without sending.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

/// Listens for OS signals and dispatches shutdown/reload.
pub struct SignalHandler {
    shutdown_tx: watch::Sender<bool>,
}

impl SignalHandler {
    pub fn new() -> (Self, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx }, Shutdown { rx })
    }

    /// Run the signal loop until a shutdown signal arrives.
    pub async fn run<F>(self, on_reload: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut sighup =
                signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT, initiating shutdown...");
                        break;
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                        break;
                    }
                    _ = sighup.recv() => {
                        tracing::info!("Received SIGHUP, reloading configuration...");
                        on_reload();
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = &on_reload;
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        self.trigger();
    }

    /// Request shutdown without waiting for a signal.
    pub fn trigger(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

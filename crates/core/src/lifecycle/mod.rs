//! Application lifecycle management: readiness notification, signal handling,
//! and logging.

pub mod logging;
pub mod signal;

use crate::context::EVENT;
use crate::diagnostic;

/// Trait for lifecycle event notification (foreground vs systemd).
pub trait Lifecycle: Send + Sync {
    /// Called when the server is ready to accept connections.
    fn on_ready(&self);
    /// Called when configuration reload begins.
    fn on_reloading(&self);
    /// Called when configuration reload completes.
    fn on_reloaded(&self);
    /// Called when the server is about to stop.
    fn on_stopping(&self);
}

/// Logs the readiness event with its own diagnostic context.
fn announce_ready() {
    diagnostic::sync_scope(|| {
        diagnostic::put(EVENT, "application_ready");
        tracing::info!("Application context refreshed. System is ready to serve requests");
    });
}

/// Foreground lifecycle: logs events only.
pub struct ForegroundLifecycle;

impl Lifecycle for ForegroundLifecycle {
    fn on_ready(&self) {
        announce_ready();
    }

    fn on_reloading(&self) {
        tracing::info!("Service reloading configuration...");
    }

    fn on_reloaded(&self) {
        tracing::info!("Service configuration reloaded");
    }

    fn on_stopping(&self) {
        tracing::info!("Service stopping...");
    }
}

/// Systemd lifecycle: sends sd-notify messages and logs.
pub struct SystemdLifecycle;

impl SystemdLifecycle {
    fn notify(state: sd_notify::NotifyState) {
        if let Err(e) = sd_notify::notify(true, &[state]) {
            tracing::debug!("sd-notify failed: {e}");
        }
    }
}

impl Lifecycle for SystemdLifecycle {
    fn on_ready(&self) {
        Self::notify(sd_notify::NotifyState::Ready);
        announce_ready();
    }

    fn on_reloading(&self) {
        Self::notify(sd_notify::NotifyState::Reloading);
        tracing::info!("Service reloading configuration (notified systemd)...");
    }

    fn on_reloaded(&self) {
        Self::notify(sd_notify::NotifyState::Ready);
        tracing::info!("Service configuration reloaded (notified systemd)");
    }

    fn on_stopping(&self) {
        Self::notify(sd_notify::NotifyState::Stopping);
        tracing::info!("Service stopping (notified systemd)...");
    }
}

/// Auto-detect the appropriate lifecycle implementation based on environment.
/// Returns `SystemdLifecycle` if `NOTIFY_SOCKET` is set, else `ForegroundLifecycle`.
pub fn detect_lifecycle() -> Box<dyn Lifecycle> {
    if std::env::var("NOTIFY_SOCKET").is_ok() {
        Box::new(SystemdLifecycle)
    } else {
        Box::new(ForegroundLifecycle)
    }
}

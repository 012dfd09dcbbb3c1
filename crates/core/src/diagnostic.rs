//! Per-request diagnostic context: string fields that decorate every log event
//! emitted while a unit of work runs.
//!
//! Fields live in a tokio task-local installed around the request future by
//! [`scope`]. The map is owned by that future, so it is dropped on every exit
//! path (normal return, error result, panic unwind, or cancellation) and can
//! never bleed into another request polled on the same worker thread.
//!
//! Outside of a scope every mutation is a no-op and reads return nothing.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

/// Snapshot of the context fields, ordered by key.
pub type Fields = BTreeMap<String, String>;

tokio::task_local! {
    static FIELDS: RefCell<Fields>;
}

/// Run `fut` with a fresh, empty diagnostic context.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    scope_with(Fields::new(), fut).await
}

/// Run `fut` with a diagnostic context pre-populated from `fields`.
pub async fn scope_with<F: Future>(fields: Fields, fut: F) -> F::Output {
    FIELDS.scope(RefCell::new(fields), fut).await
}

/// Synchronous counterpart of [`scope`] for code that does not run inside a
/// request future (startup and lifecycle events).
pub fn sync_scope<R>(f: impl FnOnce() -> R) -> R {
    FIELDS.sync_scope(RefCell::new(Fields::new()), f)
}

/// Wrap `fut` so that it runs with a copy of the caller's current context.
///
/// Spawned tasks do not inherit task-locals; use this when handing work to
/// `tokio::spawn` that should still log with the request's fields.
pub fn propagate<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    scope_with(snapshot(), fut)
}

/// Insert or overwrite `key` in the current context.
pub fn put(key: impl Into<String>, value: impl Into<String>) {
    let _ = FIELDS.try_with(|fields| {
        fields.borrow_mut().insert(key.into(), value.into());
    });
}

/// Remove a single key from the current context.
pub fn remove(key: &str) -> Option<String> {
    FIELDS
        .try_with(|fields| fields.borrow_mut().remove(key))
        .ok()
        .flatten()
}

/// Look up a single key in the current context.
pub fn get(key: &str) -> Option<String> {
    FIELDS
        .try_with(|fields| fields.borrow().get(key).cloned())
        .ok()
        .flatten()
}

/// Remove every field from the current context. Safe on an empty context.
pub fn clear() {
    let _ = FIELDS.try_with(|fields| fields.borrow_mut().clear());
}

/// Copy of the current context; empty outside of a scope.
pub fn snapshot() -> Fields {
    FIELDS
        .try_with(|fields| {
            fields
                .try_borrow()
                .map(|f| f.clone())
                .unwrap_or_default()
        })
        .unwrap_or_default()
}

/// Whether the caller runs inside a diagnostic scope.
pub fn is_active() -> bool {
    FIELDS.try_with(|_| ()).is_ok()
}

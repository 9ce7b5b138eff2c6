//! Ctrl+C around in-flight requests.
//!
//! Requests carry no timeout, so a stalled backend would otherwise hold
//! the REPL forever once tokio owns SIGINT.

use std::future::Future;

/// Race `fut` against `interrupt`.
///
/// `None` means the interrupt fired first; `fut` is dropped wherever it
/// was suspended, so anything it already rendered stays on screen.
pub async fn until_interrupted<F, I>(fut: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        out = fut => Some(out),
        _ = interrupt => None,
    }
}

/// Resolve on Ctrl+C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

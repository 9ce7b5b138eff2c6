//! Terminal activity indicator for the chat REPL's network waits.

use std::future::Future;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

const FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

const INTERVAL: Duration = Duration::from_millis(120);

/// A spinner drawn on stderr by a background task.
///
/// When stderr is not a terminal nothing is drawn, so piped output and
/// logs stay clean.
pub struct Spinner {
    handle: Option<JoinHandle<()>>,
    cancel: watch::Sender<bool>,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let (cancel, mut cancel_rx) = watch::channel(false);

        if !std::io::stderr().is_terminal() {
            return Self {
                handle: None,
                cancel,
            };
        }

        let message = message.to_string();
        let handle = tokio::spawn(async move {
            for frame in FRAMES.iter().cycle() {
                // \x1b[2K clears the line, \r returns to its start
                eprint!("\x1b[2K\r{frame} {message}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle: Some(handle),
            cancel,
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        if let Some(handle) = self.handle {
            let _ = handle.await;
        }
    }

    /// Show a spinner for as long as `fut` takes.
    pub async fn run<F: Future>(message: &str, fut: F) -> F::Output {
        let spinner = Self::start(message);
        let out = fut.await;
        spinner.stop().await;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_single_chars() {
        assert!(!FRAMES.is_empty());
        for frame in FRAMES {
            assert_eq!(frame.chars().count(), 1);
        }
    }

    #[tokio::test]
    async fn spinner_starts_and_stops_without_panic() {
        let spinner = Spinner::start("waiting for the builder");
        tokio::time::sleep(Duration::from_millis(150)).await;
        spinner.stop().await;
    }

    #[tokio::test]
    async fn run_returns_future_output() {
        let out = Spinner::run("thinking", async { 41 + 1 }).await;
        assert_eq!(out, 42);
    }
}

//! Project-wide constants.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Analysis endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/analyze";

/// Workflow-builder chat endpoint used when nothing else is configured.
pub const DEFAULT_CHAT_ENDPOINT: &str = "http://127.0.0.1:8000/chat";

/// Placeholder written to both regions while a request is in flight.
pub const PROCESSING: &str = "Processing...";

/// Summary region text after any failed request.
pub const ERROR_SUMMARY: &str = "Error occurred.";

/// Categorization region text after any failed request.
pub const ERROR_CATEGORIZATION: &str = "-";

/// Alert shown when the server fails without a usable `detail`.
pub const BACKEND_ERROR: &str = "Backend error";

/// Alert shown when the prompt is empty or whitespace.
pub const EMPTY_PROMPT_ALERT: &str = "Please enter a workflow prompt.";

/// Chat message that asks the backend to close the conversation.
pub const FINALIZE_SENTINEL: &str = "__FINALIZE__";

/// Default database path: `~/.augur/augur.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".augur").join("augur.db"))
}

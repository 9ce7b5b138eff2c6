//! Persistent settings backed by SQLite.
//!
//! Values are stored as plain strings under a fixed set of [`Key`]s.
//! [`Settings::resolve`] layers them: an explicit override (CLI flag or
//! environment) wins, then the stored value, then the built-in default.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::consts::{DEFAULT_CHAT_ENDPOINT, DEFAULT_ENDPOINT};
use crate::dispatcher::{PromptBody, parse_endpoint};

/// A setting augur knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Endpoint,
    ChatEndpoint,
    PromptBody,
}

impl Key {
    pub const ALL: [Key; 3] = [Key::Endpoint, Key::ChatEndpoint, Key::PromptBody];

    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Endpoint => "endpoint",
            Key::ChatEndpoint => "chat_endpoint",
            Key::PromptBody => "prompt_body",
        }
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self, value: &str) -> Result<()> {
        match self {
            Key::Endpoint | Key::ChatEndpoint => parse_endpoint(value).map(|_| ()),
            Key::PromptBody => value.parse::<PromptBody>().map(|_| ()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Key {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Key::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .with_context(|| {
                let known: Vec<_> = Key::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown config key '{s}' (known: {})", known.join(", "))
            })
    }
}

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, key: Key) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Validate and upsert.
    pub fn set(&self, key: Key, value: &str) -> Result<()> {
        key.validate(value)
            .with_context(|| format!("refusing to store '{key}'"))?;
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key.as_str(), value.trim()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: Key) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute("DELETE FROM config WHERE key = ?1", [key.as_str()])?;
        Ok(())
    }

    /// Every stored known key, in [`Key::ALL`] order.
    pub fn list(&self) -> Result<Vec<(Key, String)>> {
        let mut out = Vec::new();
        for key in Key::ALL {
            if let Some(value) = self.get(key)? {
                out.push((key, value));
            }
        }
        Ok(out)
    }
}

/// Overrides coming from the command line or environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub chat_endpoint: Option<String>,
    pub prompt_body: Option<PromptBody>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub chat_endpoint: String,
    pub prompt_body: PromptBody,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            prompt_body: PromptBody::default(),
        }
    }
}

impl Settings {
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let defaults = Settings::default();

        let endpoint = match &overrides.endpoint {
            Some(e) => e.clone(),
            None => config.get(Key::Endpoint)?.unwrap_or(defaults.endpoint),
        };
        let chat_endpoint = match &overrides.chat_endpoint {
            Some(e) => e.clone(),
            None => config
                .get(Key::ChatEndpoint)?
                .unwrap_or(defaults.chat_endpoint),
        };
        let prompt_body = match overrides.prompt_body {
            Some(p) => p,
            None => match config.get(Key::PromptBody)? {
                Some(stored) => stored.parse()?,
                None => defaults.prompt_body,
            },
        };

        Ok(Self {
            endpoint,
            chat_endpoint,
            prompt_body,
        })
    }
}

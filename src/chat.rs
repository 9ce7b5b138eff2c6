//! Conversational workflow builder.
//!
//! The backend keeps per-session history keyed by `session_id` and keeps
//! asking clarifying questions until it decides (or is told) the intent
//! is final, at which point it answers with the cleaned-up intent and
//! its analysis. A finalized session is never reused.

use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::consts::FINALIZE_SENTINEL;
use crate::dispatcher::{parse_endpoint, post_json};
use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// What came back from one chat turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// Whitespace-only input, nothing was sent.
    Ignored,
    /// The assistant wants to keep talking.
    Reply(String),
    /// The conversation is over. The session has already been rotated.
    ///
    /// `workflow` and `n8n_workflow` are only present when the backend
    /// managed to build one; otherwise `error` usually says why.
    Finalized {
        final_intent: String,
        analysis: Value,
        workflow: Option<Value>,
        n8n_workflow: Option<Value>,
        error: Option<String>,
    },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    finalized: bool,
    #[serde(default)]
    final_intent: Option<Value>,
    #[serde(default)]
    analysis: Option<Value>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    workflow: Option<Value>,
    #[serde(default, rename = "n8nWorkflow")]
    n8n_workflow: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Strings verbatim, anything else as compact JSON. Null reads as empty.
fn display_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

pub struct ChatClient {
    client: reqwest::Client,
    endpoint: Url,
    session_id: Uuid,
    transcript: Vec<(Role, String)>,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: parse_endpoint(endpoint)?,
            session_id: Uuid::new_v4(),
            transcript: Vec::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn transcript(&self) -> &[(Role, String)] {
        &self.transcript
    }

    /// Drop the conversation and start over with a fresh session id.
    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4();
        self.transcript.clear();
        debug!(session = %self.session_id, "chat session reset");
    }

    /// Send one user message.
    pub async fn send(&mut self, message: &str) -> Result<ChatReply, DispatchError> {
        if message.trim().is_empty() {
            return Ok(ChatReply::Ignored);
        }

        self.transcript.push((Role::User, message.to_string()));
        let resp = self.exchange(message).await?;

        if resp.finalized {
            return Ok(self.close(resp));
        }

        let reply = display_text(resp.response);
        self.transcript.push((Role::Assistant, reply.clone()));
        Ok(ChatReply::Reply(reply))
    }

    /// Ask the backend to wrap up the conversation now.
    pub async fn finalize(&mut self) -> Result<ChatReply, DispatchError> {
        let resp = self.exchange(FINALIZE_SENTINEL).await?;
        if !resp.finalized {
            return Err(DispatchError::NotFinalized);
        }
        Ok(self.close(resp))
    }

    async fn exchange(&self, message: &str) -> Result<ChatResponse, DispatchError> {
        let session_id = self.session_id.to_string();
        let body = ChatRequest {
            session_id: &session_id,
            message,
        };
        info!(endpoint = %self.endpoint, session = %session_id, "sending chat message");
        let value = post_json(&self.client, &self.endpoint, &body).await?;
        serde_json::from_value(value).map_err(|e| DispatchError::MalformedResponse(e.to_string()))
    }

    fn close(&mut self, resp: ChatResponse) -> ChatReply {
        info!(session = %self.session_id, "chat session finalized");
        self.reset();
        ChatReply::Finalized {
            final_intent: display_text(resp.final_intent),
            analysis: resp.analysis.unwrap_or(Value::Null),
            workflow: resp.workflow,
            n8n_workflow: resp.n8n_workflow,
            error: resp.error.map(|e| display_text(Some(e))),
        }
    }
}

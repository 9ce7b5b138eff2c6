//! One trigger, one request, two regions.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::consts::{EMPTY_PROMPT_ALERT, ERROR_CATEGORIZATION, ERROR_SUMMARY, PROCESSING};
use crate::envelope::{AnalysisResult, AnalyzeRequest, ErrorEnvelope};
use crate::error::DispatchError;
use crate::surface::Surface;

/// Which version of the prompt goes on the wire. Validation always looks
/// at the trimmed text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptBody {
    #[default]
    Trimmed,
    Raw,
}

impl PromptBody {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptBody::Trimmed => "trimmed",
            PromptBody::Raw => "raw",
        }
    }
}

impl fmt::Display for PromptBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptBody {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trimmed" => Ok(PromptBody::Trimmed),
            "raw" => Ok(PromptBody::Raw),
            other => bail!("unknown prompt body mode '{other}' (expected 'trimmed' or 'raw')"),
        }
    }
}

/// Parse an endpoint, insisting on an absolute http(s) URL.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim())
        .with_context(|| format!("invalid endpoint URL '{endpoint}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("endpoint must be http or https, got '{other}'"),
    }
}

/// Reads the prompt from a [`Surface`], posts it to the analysis endpoint
/// and renders the answer back. Cheap to clone; clones share a connection
/// pool.
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    client: reqwest::Client,
    endpoint: Url,
    prompt_body: PromptBody,
}

impl RequestDispatcher {
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: parse_endpoint(endpoint)?,
            prompt_body: PromptBody::default(),
        })
    }

    pub fn with_prompt_body(mut self, prompt_body: PromptBody) -> Self {
        self.prompt_body = prompt_body;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn prompt_body(&self) -> PromptBody {
        self.prompt_body
    }

    /// Run one trigger against `surface`.
    ///
    /// Everything up to the network call happens before the first
    /// suspension point: an empty prompt is alerted and rejected without
    /// touching either region, otherwise both regions show the processing
    /// placeholder. The returned value mirrors what was rendered.
    pub async fn dispatch(&self, surface: &dyn Surface) -> Result<AnalysisResult, DispatchError> {
        let raw = surface.prompt_text();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            debug!("rejected empty prompt");
            surface.alert(EMPTY_PROMPT_ALERT);
            return Err(DispatchError::Validation(EMPTY_PROMPT_ALERT.to_string()));
        }

        surface.set_summary(PROCESSING);
        surface.set_categorization(PROCESSING);

        let prompt = match self.prompt_body {
            PromptBody::Trimmed => trimmed,
            PromptBody::Raw => raw.as_str(),
        };

        match self.submit(prompt).await {
            Ok(result) => {
                surface.set_summary(&result.summary_text());
                surface.set_categorization(&result.categorization_text());
                Ok(result)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "analysis failed");
                surface.set_summary(ERROR_SUMMARY);
                surface.set_categorization(ERROR_CATEGORIZATION);
                surface.alert(&e.to_string());
                Err(e)
            }
        }
    }

    /// Post a prompt and decode the answer, with no display side effects.
    pub async fn submit(&self, prompt: &str) -> Result<AnalysisResult, DispatchError> {
        let body = AnalyzeRequest {
            prompt: prompt.to_string(),
        };
        info!(endpoint = %self.endpoint, prompt_len = prompt.len(), "submitting prompt");
        let value = post_json(&self.client, &self.endpoint, &body).await?;
        Ok(AnalysisResult(value))
    }
}

/// POST a JSON body and decode a JSON answer.
///
/// Non-2xx statuses become [`DispatchError::Server`] carrying the body's
/// `detail`; a 2xx body that is not JSON is
/// [`DispatchError::MalformedResponse`].
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &Url,
    body: &B,
) -> Result<Value, DispatchError> {
    let resp = client
        .post(url.clone())
        .header(CONTENT_TYPE, "application/json")
        .json(body)
        .send()
        .await?;

    let status = resp.status();
    let bytes = resp.bytes().await?;
    debug!(%status, bytes = bytes.len(), "response received");

    if !status.is_success() {
        return Err(DispatchError::Server {
            status: status.as_u16(),
            message: ErrorEnvelope::parse(&bytes).message(),
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| DispatchError::MalformedResponse(e.to_string()))
}

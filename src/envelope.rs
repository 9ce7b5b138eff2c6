//! Wire types for the analysis endpoint.
//!
//! The backend schema is not pinned down, so responses are kept as raw
//! [`serde_json::Value`]s and only the few fields we render are read,
//! defensively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::BACKEND_ERROR;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeRequest {
    pub prompt: String,
}

/// A successful analysis, exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult(pub Value);

impl AnalysisResult {
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The `techniques` field, or an empty array when it is missing or falsy.
    pub fn techniques(&self) -> Value {
        match self.0.get("techniques") {
            Some(v) if is_truthy(v) => v.clone(),
            _ => Value::Array(Vec::new()),
        }
    }

    /// Text for the summary region.
    pub fn summary_text(&self) -> String {
        pretty(&self.0)
    }

    /// Text for the categorization region.
    pub fn categorization_text(&self) -> String {
        pretty(&self.techniques())
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorEnvelope {
    /// Parse an error body. Anything that is not a JSON object yields an
    /// empty envelope.
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The message to surface: `detail` if it carries anything, otherwise
    /// the generic fallback. Non-string details are shown as compact JSON.
    pub fn message(&self) -> String {
        match &self.detail {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(v) if is_truthy(v) => v.to_string(),
            _ => BACKEND_ERROR.to_string(),
        }
    }
}

/// The human-readable digest the backend's richer envelope supports:
/// `{"message", "data": {"categorization": {"techniques", "confidence"}}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub message: String,
    pub techniques: Vec<String>,
    pub confidence: Option<f64>,
}

impl AnalysisReport {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let value = result.value();
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or("Prompt analyzed")
            .to_string();

        let categorization = value
            .get("data")
            .and_then(|d| d.get("categorization"));

        let techniques = categorization
            .and_then(|c| c.get("techniques"))
            .and_then(|t| t.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let confidence = categorization
            .and_then(|c| c.get("confidence"))
            .and_then(|c| c.as_f64());

        Self {
            message,
            techniques,
            confidence,
        }
    }

    /// Render as plain text lines for the terminal.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.message);
        if self.techniques.is_empty() {
            out.push_str("No techniques identified\n");
        } else {
            out.push_str("Techniques identified:\n");
            for t in &self.techniques {
                out.push_str(&format!("  - {t}\n"));
            }
        }
        if let Some(confidence) = self.confidence {
            out.push_str(&format!("Confidence score: {confidence}\n"));
        }
        out
    }
}

/// Pretty-print with two-space indentation.
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Loose truthiness: null, false, zero and "" count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

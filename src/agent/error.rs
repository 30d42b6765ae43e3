//! Errors raised while running the audit pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot connect to Ollama at {url}. Is Ollama running?")]
    Connection { url: String },

    #[error("Request timed out after {seconds}s. Try a smaller document or a faster model.")]
    Timeout { seconds: u64 },

    #[error("Ollama API error {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Invalid response from model backend: {0}")]
    InvalidResponse(String),

    /// The analyst's reply is not a bare JSON list of findings.
    #[error("Analyst output violates the findings contract: {reason}")]
    MalformedFindings { reason: String, raw: String },

    #[error("Advisor output contains no verdict (expected RUN AWAY, NEGOTIATE HARD or SAFE)")]
    MissingVerdict,

    #[error("Advisor output contains conflicting verdicts: {0}")]
    AmbiguousVerdict(String),

    /// Findings the advisor did not address.
    #[error("Advisor summary omits findings: {}", missing.join(", "))]
    IncompleteSummary { missing: Vec<String> },
}

impl PipelineError {
    pub(crate) fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        PipelineError::MalformedFindings {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// The model output that broke the contract, if this is a contract error.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            PipelineError::MalformedFindings { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

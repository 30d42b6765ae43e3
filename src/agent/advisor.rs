//! Advisor stage: findings in, plain-language summary with a verdict out.

use crate::agent::llm::LlmClient;
use crate::agent::prompts::{render_advisor_prompt, ADVISOR_REQUEST};
use crate::agent::PipelineError;
use crate::analysis::{extract_verdict, missing_references, unreferenced_articles, VerdictScan};
use crate::models::{AdvisorySummary, FindingList, ValidationMode, Verdict};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns a findings list into an advisory summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, findings: &FindingList) -> Result<AdvisorySummary, PipelineError>;
}

/// LLM-backed advisor.
pub struct AdvisorAgent<L: ?Sized> {
    llm: Arc<L>,
    validation: ValidationMode,
}

impl<L: LlmClient + ?Sized> AdvisorAgent<L> {
    pub fn new(llm: Arc<L>, validation: ValidationMode) -> Self {
        Self { llm, validation }
    }

    fn resolve_verdict(&self, reply: &str, findings: &FindingList) -> Result<Verdict, PipelineError> {
        match (extract_verdict(reply, self.validation), self.validation) {
            (VerdictScan::Found(verdict), _) => Ok(verdict),
            (VerdictScan::Missing, ValidationMode::Strict) => Err(PipelineError::MissingVerdict),
            (VerdictScan::Missing, ValidationMode::Lenient) => {
                let fallback = Verdict::recommended_for(findings);
                warn!("Advisor gave no verdict, falling back to {}", fallback);
                Ok(fallback)
            }
            (VerdictScan::Conflicting(verdicts), ValidationMode::Strict) => {
                let tokens: Vec<_> = verdicts.iter().map(|v| v.token()).collect();
                Err(PipelineError::AmbiguousVerdict(tokens.join(", ")))
            }
            (VerdictScan::Conflicting(verdicts), ValidationMode::Lenient) => {
                let last = verdicts
                    .last()
                    .copied()
                    .unwrap_or_else(|| Verdict::recommended_for(findings));
                warn!("Advisor gave conflicting verdicts, using the last one: {}", last);
                Ok(last)
            }
        }
    }
}

#[async_trait]
impl<L: LlmClient + ?Sized> Summarizer for AdvisorAgent<L> {
    async fn summarize(&self, findings: &FindingList) -> Result<AdvisorySummary, PipelineError> {
        info!("Advisor translating {} findings", findings.len());

        let findings_json = serde_json::to_string_pretty(findings)
            .map_err(|e| PipelineError::InvalidResponse(format!("Failed to serialize findings: {}", e)))?;
        let system_prompt = render_advisor_prompt(&findings_json);

        let reply = self.llm.complete(&system_prompt, ADVISOR_REQUEST).await?;
        debug!("Advisor reply: {}", reply);

        let verdict = self.resolve_verdict(&reply, findings)?;

        let missing = missing_references(&reply, findings);
        if !missing.is_empty() {
            match self.validation {
                ValidationMode::Strict => return Err(PipelineError::IncompleteSummary { missing }),
                ValidationMode::Lenient => {
                    warn!("Advisor summary does not mention: {}", missing.join(", "))
                }
            }
        }

        let extra = unreferenced_articles(&reply, findings);
        if !extra.is_empty() {
            debug!("Advisor mentions articles not among the findings: {}", extra.join(", "));
        }

        if findings.is_empty() && verdict != Verdict::Safe {
            warn!("No findings, but the advisor's verdict is {}", verdict);
        }

        info!("Advisor verdict: {}", verdict);

        Ok(AdvisorySummary {
            text: reply,
            verdict,
        })
    }
}

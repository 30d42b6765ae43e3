//! Analyst stage: contract text in, findings list out.

use crate::agent::llm::LlmClient;
use crate::agent::prompts::ANALYST_PROMPT;
use crate::agent::PipelineError;
use crate::analysis::parse_findings;
use crate::models::{ContractDocument, FindingList, ValidationMode};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Extracts unfair-term findings from a contract.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, document: &ContractDocument) -> Result<FindingList, PipelineError>;
}

/// LLM-backed analyst.
pub struct AnalystAgent<L: ?Sized> {
    llm: Arc<L>,
    validation: ValidationMode,
}

impl<L: LlmClient + ?Sized> AnalystAgent<L> {
    pub fn new(llm: Arc<L>, validation: ValidationMode) -> Self {
        Self { llm, validation }
    }
}

#[async_trait]
impl<L: LlmClient + ?Sized> Classifier for AnalystAgent<L> {
    async fn classify(&self, document: &ContractDocument) -> Result<FindingList, PipelineError> {
        info!(
            "Analyst reviewing {} ({} chars) with {}",
            document.name,
            document.text.chars().count(),
            self.llm.model_name()
        );

        let reply = self.llm.complete(ANALYST_PROMPT, &document.text).await?;
        debug!("Analyst reply: {}", reply);

        let findings = parse_findings(&reply, self.validation)?;
        info!("Analyst flagged {} clauses", findings.len());

        Ok(findings)
    }
}

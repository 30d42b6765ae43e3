//! Coordinator: runs the analyst, then the advisor, in that order.

use crate::agent::advisor::Summarizer;
use crate::agent::analyst::Classifier;
use crate::agent::PipelineError;
use crate::models::{AdvisorySummary, ContractDocument, FindingList};
use tracing::{error, info};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The analyst's findings, as handed to the advisor.
    pub findings: FindingList,
    /// The advisor's output, unchanged.
    pub advisory: AdvisorySummary,
}

/// Fixed two-stage pipeline. Holds no per-run state.
pub struct Coordinator<C, S> {
    analyst: C,
    advisor: S,
}

impl<C: Classifier, S: Summarizer> Coordinator<C, S> {
    pub fn new(analyst: C, advisor: S) -> Self {
        Self { analyst, advisor }
    }

    /// Audit one document.
    ///
    /// The advisor only runs after the analyst has succeeded, and receives
    /// the analyst's findings as its sole input.
    pub async fn run(&self, document: &ContractDocument) -> Result<PipelineOutcome, PipelineError> {
        info!("Step 1/2: analyst reviewing {}", document.name);
        let findings = self.analyst.classify(document).await.map_err(|e| {
            error!("Analyst failed on {}: {}", document.name, e);
            e
        })?;

        info!("Step 2/2: advisor summarizing {} findings", findings.len());
        let advisory = self.advisor.summarize(&findings).await.map_err(|e| {
            error!("Advisor failed on {}: {}", document.name, e);
            e
        })?;

        Ok(PipelineOutcome { findings, advisory })
    }

    #[cfg(test)]
    pub(crate) fn analyst(&self) -> &C {
        &self.analyst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::advisor::AdvisorAgent;
    use crate::agent::analyst::AnalystAgent;
    use crate::agent::prompts::ANALYST_PROMPT;
    use crate::agent::testing::{CallLog, EchoSummarizer, FixedClassifier, ScriptedLlm};
    use crate::models::{RiskFinding, RiskLevel, ValidationMode, Verdict};
    use std::sync::Arc;

    fn finding(reference: &str, level: RiskLevel) -> RiskFinding {
        RiskFinding {
            article_reference: reference.to_string(),
            original_text: "Developer can change layout unilaterally".to_string(),
            risk_level: level,
            legal_reasoning: "No consent mechanism".to_string(),
        }
    }

    fn document() -> ContractDocument {
        ContractDocument::new("ppjb.txt", "Pasal 18: developer dapat mengubah denah.")
    }

    #[tokio::test]
    async fn test_analyst_runs_before_advisor() {
        let log = CallLog::default();
        let coordinator = Coordinator::new(
            FixedClassifier {
                findings: Ok(vec![finding("Pasal 18", RiskLevel::High)]),
                log: log.clone(),
            },
            EchoSummarizer { log: log.clone() },
        );

        let outcome = coordinator.run(&document()).await.unwrap();
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.advisory.verdict, Verdict::NegotiateHard);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "classify:ppjb.txt".to_string(),
                "classified:ppjb.txt".to_string(),
                "summarize:1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_advisor_skipped_when_analyst_fails() {
        let log = CallLog::default();
        let coordinator = Coordinator::new(
            FixedClassifier {
                findings: Err("backend down".to_string()),
                log: log.clone(),
            },
            EchoSummarizer { log: log.clone() },
        );

        assert!(coordinator.run(&document()).await.is_err());
        assert!(!log.lock().unwrap().iter().any(|entry| entry.starts_with("summarize")));
    }

    #[tokio::test]
    async fn test_empty_document_path_is_safe() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("[]".to_string()),
            Ok("Gak ada jebakan, aman.\nVERDICT: SAFE".to_string()),
        ]));
        let coordinator = Coordinator::new(
            AnalystAgent::new(llm.clone(), ValidationMode::Strict),
            AdvisorAgent::new(llm.clone(), ValidationMode::Strict),
        );

        let outcome = coordinator.run(&document()).await.unwrap();
        assert!(outcome.findings.is_empty());
        assert_eq!(outcome.advisory.verdict, Verdict::Safe);
    }

    #[tokio::test]
    async fn test_advisor_output_returned_verbatim() {
        let advice = "🚩 Pasal 18: layout bisa diganti seenaknya, lu rugi 💸\nVERDICT: RUN AWAY";
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"[{"article_reference": "Pasal 18", "original_text": "Developer can change layout unilaterally", "risk_level": "HIGH", "legal_reasoning": "Violates consumer protection: no consent mechanism"}]"#.to_string()),
            Ok(advice.to_string()),
        ]));
        let coordinator = Coordinator::new(
            AnalystAgent::new(llm.clone(), ValidationMode::Strict),
            AdvisorAgent::new(llm.clone(), ValidationMode::Strict),
        );

        let outcome = coordinator.run(&document()).await.unwrap();
        assert_eq!(outcome.advisory.text, advice);
        assert_ne!(outcome.advisory.verdict, Verdict::Safe);

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].system, ANALYST_PROMPT);
        assert!(calls[1].system.contains("Developer can change layout unilaterally"));
    }

    #[tokio::test]
    async fn test_malformed_findings_stop_the_pipeline() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("```json\n[]\n```".to_string()),
            Ok("VERDICT: SAFE".to_string()),
        ]));
        let coordinator = Coordinator::new(
            AnalystAgent::new(llm.clone(), ValidationMode::Strict),
            AdvisorAgent::new(llm.clone(), ValidationMode::Strict),
        );

        let err = coordinator.run(&document()).await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedFindings { .. }));
        assert_eq!(llm.calls().len(), 1);
    }
}

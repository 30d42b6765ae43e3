//! Scripted stand-ins for the model backend and the pipeline stages.

use crate::agent::advisor::Summarizer;
use crate::agent::analyst::Classifier;
use crate::agent::llm::LlmClient;
use crate::agent::PipelineError;
use crate::models::{AdvisorySummary, ContractDocument, FindingList, Verdict};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

/// Replies with queued responses, in order, and records every request.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, PipelineError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, PipelineError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, PipelineError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system_prompt.to_string(),
            user: user_prompt.to_string(),
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PipelineError::InvalidResponse("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Shared log of stage invocations, in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub struct FixedClassifier {
    pub findings: Result<FindingList, String>,
    pub log: CallLog,
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, document: &ContractDocument) -> Result<FindingList, PipelineError> {
        self.log.lock().unwrap().push(format!("classify:{}", document.name));
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push(format!("classified:{}", document.name));

        self.findings
            .clone()
            .map_err(PipelineError::InvalidResponse)
    }
}

/// Echoes the number of findings it received and picks the recommended verdict.
pub struct EchoSummarizer {
    pub log: CallLog,
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, findings: &FindingList) -> Result<AdvisorySummary, PipelineError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("summarize:{}", findings.len()));

        let verdict = Verdict::recommended_for(findings);
        Ok(AdvisorySummary {
            text: format!("{} risks\nVERDICT: {}", findings.len(), verdict),
            verdict,
        })
    }
}

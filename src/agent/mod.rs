//! LLM agent modules for contract auditing.
//!
//! This module provides the analyst and advisor stages, the coordinator
//! that sequences them, and the model backend they share.

pub mod advisor;
pub mod analyst;
pub mod batch;
pub mod coordinator;
pub mod error;
pub mod llm;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

pub use advisor::AdvisorAgent;
pub use analyst::AnalystAgent;
pub use batch::{run_batch, BatchItem};
pub use coordinator::{Coordinator, PipelineOutcome};
pub use error::PipelineError;
pub use llm::{LlmConfig, OllamaClient};

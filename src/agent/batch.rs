//! Auditing several documents at once.
//!
//! Each document gets its own independent pipeline run; runs share only the
//! coordinator's immutable configuration.

use crate::agent::advisor::Summarizer;
use crate::agent::analyst::Classifier;
use crate::agent::coordinator::{Coordinator, PipelineOutcome};
use crate::agent::PipelineError;
use crate::models::ContractDocument;
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::info;

/// Result of one document's run.
#[derive(Debug)]
pub struct BatchItem {
    pub document: ContractDocument,
    pub result: Result<PipelineOutcome, PipelineError>,
    pub duration: Duration,
}

/// Run the pipeline over `documents` with at most `concurrency` runs in flight.
///
/// Results come back in input order. A failed run does not affect the others.
pub async fn run_batch<C, S>(
    coordinator: &Coordinator<C, S>,
    documents: Vec<ContractDocument>,
    concurrency: usize,
) -> Vec<BatchItem>
where
    C: Classifier,
    S: Summarizer,
{
    let total = documents.len();
    info!("Auditing {} documents, {} at a time", total, concurrency.max(1));

    let mut items: Vec<(usize, BatchItem)> = stream::iter(documents.into_iter().enumerate())
        .map(|(index, document)| async move {
            let start = Instant::now();
            let result = coordinator.run(&document).await;
            info!("[{}/{}] {} done", index + 1, total, document.name);
            (
                index,
                BatchItem {
                    document,
                    result,
                    duration: start.elapsed(),
                },
            )
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    items.sort_by_key(|(index, _)| *index);
    items.into_iter().map(|(_, item)| item).collect()
}

//! Batch consumer: turns a trigger payload into an orchestrated execution.
//!
//! Offsets are committed only after the execution succeeded. A failed batch
//! stops the loop without committing, so the log redelivers it to the next
//! consumer and the idempotent upsert absorbs the duplicates.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::enricher::EnrichInput;
use super::workflow::{Execution, Orchestrator};
use crate::error::{ConsumeError, TransportError};
use crate::log::{BatchSource, ConsumerRecord, TriggerPayload};

/// Decodes every record of `trigger` into the enrichment handoff.
///
/// Records are concatenated partition group by partition group, keeping
/// log order inside each group.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] for the first record whose value is
/// not base64 or not UTF-8.
pub fn decode(trigger: &TriggerPayload) -> Result<EnrichInput, TransportError> {
    let match_events = trigger
        .records
        .values()
        .flatten()
        .map(decode_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EnrichInput { match_events })
}

fn decode_record(record: &ConsumerRecord) -> Result<String, TransportError> {
    let failed = |reason: String| TransportError::Decode {
        partition_key: record.partition_key(),
        offset: record.offset,
        reason,
    };
    let bytes = STANDARD
        .decode(&record.value)
        .map_err(|e| failed(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| failed(format!("invalid utf-8: {e}")))
}

/// Hands decoded batches to the orchestrator.
#[derive(Debug, Clone)]
pub struct BatchConsumer {
    orchestrator: Arc<dyn Orchestrator>,
}

impl BatchConsumer {
    /// Creates a consumer feeding `orchestrator`.
    #[must_use]
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Decodes `trigger` and runs one execution for it.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumeError::Transport`] if a record cannot be decoded
    /// and [`ConsumeError::Execution`] if the execution fails.
    pub async fn consume(&self, trigger: &TriggerPayload) -> Result<Execution, ConsumeError> {
        let input = decode(trigger).inspect_err(|e| {
            tracing::error!(error = %e, "failed to decode batch");
        })?;
        for (partition_key, records) in &trigger.records {
            tracing::debug!(%partition_key, records = records.len(), "decoded partition");
        }
        tracing::info!(events = input.match_events.len(), "consuming batch");

        self.orchestrator
            .start_execution(input)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "batch execution failed");
            })
            .map_err(ConsumeError::from)
    }
}

/// Pulls batches from `source` until it fails or a batch fails.
///
/// Each batch is committed after it was consumed successfully. Returns
/// only on error; the uncommitted batch is left for redelivery.
///
/// # Errors
///
/// Returns the first [`ConsumeError`] from polling, consuming or committing.
pub async fn run_batches(
    source: &mut dyn BatchSource,
    consumer: &BatchConsumer,
) -> Result<(), ConsumeError> {
    loop {
        let Some(batch) = source.next_batch().await? else {
            continue;
        };
        consumer.consume(&batch).await?;
        source.commit().await?;
    }
}

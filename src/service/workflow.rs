//! Orchestration of one batch: enrich, then store.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::enricher::{EnrichInput, enrich};
use super::storage_writer::{StorageWriter, StoreOutcome};
use crate::error::PipelineError;

/// Result of a completed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    /// Identifier assigned when the execution started.
    pub execution_id: Uuid,
    /// What the storage stage wrote.
    pub outcome: StoreOutcome,
}

/// Runs the enrich-then-store sequence for a decoded batch.
///
/// The consumer depends only on this trait, so the sequence can be driven
/// in-process or handed to an external workflow engine.
#[async_trait]
pub trait Orchestrator: Send + Sync + fmt::Debug {
    /// Starts and awaits one execution for `input`.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] naming the stage that failed.
    async fn start_execution(&self, input: EnrichInput) -> Result<Execution, PipelineError>;
}

/// In-process orchestrator: enrichment followed by the storage writer.
#[derive(Debug, Clone)]
pub struct Workflow {
    writer: StorageWriter,
}

impl Workflow {
    /// Creates a workflow storing through `writer`.
    #[must_use]
    pub const fn new(writer: StorageWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Orchestrator for Workflow {
    async fn start_execution(&self, input: EnrichInput) -> Result<Execution, PipelineError> {
        let execution_id = Uuid::new_v4();
        tracing::info!(%execution_id, events = input.match_events.len(), "execution started");

        let enriched = enrich(&input).inspect_err(|e| {
            tracing::error!(%execution_id, error = %e, "enrichment failed");
        })?;
        let outcome = self
            .writer
            .store(&enriched.match_events, &enriched.enriched_data)
            .await?;

        tracing::info!(
            %execution_id,
            items_written = outcome.items_written,
            archive_key = ?outcome.archive_key,
            "execution succeeded"
        );
        Ok(Execution {
            execution_id,
            outcome,
        })
    }
}

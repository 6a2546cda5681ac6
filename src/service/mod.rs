//! Service layer: the pipeline stages.
//!
//! [`Publisher`] feeds the log from the ingest endpoint. [`BatchConsumer`]
//! drains it and hands each batch to an [`Orchestrator`], whose in-process
//! [`Workflow`] runs the [`enrich`] stage and the [`StorageWriter`].
//! [`QueryAggregator`] serves counts from the keyed store.

pub mod consumer;
pub mod enricher;
pub mod publisher;
pub mod query;
pub mod storage_writer;
pub mod workflow;

pub use consumer::{BatchConsumer, decode, run_batches};
pub use enricher::{EnrichInput, EnrichOutput, enrich};
pub use publisher::Publisher;
pub use query::{EventCount, QueryAggregator, normalize_event_kind};
pub use storage_writer::{StorageWriter, StoreOutcome, archive_key};
pub use workflow::{Execution, Orchestrator, Workflow};

//! # match-pipeline
//!
//! Ingest, enrichment and storage pipeline for football match events.
//!
//! Submissions arrive over HTTP, are validated and published to a
//! partitioned event log. A batch consumer drains the log and hands every
//! batch to an orchestrator that derives the season of each event and
//! writes the result twice: an idempotent upsert into a keyed store and a
//! raw archive of the batch. A query endpoint counts stored events per
//! match and kind.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │     ├── validate (domain/)
//!     │     └── Publisher ──────────► event log (log/: Kafka | memory)
//!     │                                     │
//!     │                               BatchConsumer (service/)
//!     │                                     │
//!     │                               Workflow: enrich → StorageWriter
//!     │                                     │
//!     │                   keyed store ◄─────┴─────► archive
//!     │             (persistence/: Postgres | memory)  (S3 | filesystem | memory)
//!     │                       ▲
//!     └── QueryAggregator ────┘
//! ```
//!
//! Delivery is at-least-once: a batch is committed only after it was
//! stored, and the keyed store upsert makes redelivery harmless.

pub mod api;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod error;
pub mod log;
pub mod persistence;
pub mod service;

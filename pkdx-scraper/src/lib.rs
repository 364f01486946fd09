//! pkdx-scraper library interface
//!
//! Harvests species records from PokeAPI with bounded worker pools, cleans
//! their text fields, rebuilds evolution-chain stages and writes the corpus
//! as one JSON snapshot.
//!
//! # Phases
//! 1. **species** - create one entity per species id ([`enrich::species`])
//! 2. **types** - append type labels ([`enrich::types`])
//! 3. **lineage** - stage labels from evolution chains ([`lineage`])
//!
//! Then [`snapshot::write_snapshot`] persists the store.

pub mod config;
pub mod enrich;
pub mod lineage;
pub mod models;
pub mod pipeline;
pub mod pool;
pub mod retry;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod text;

pub use models::Entity;
pub use pipeline::{Pipeline, PipelineSettings, RunSummary};
pub use source::{PokeApiClient, RecordSource, SourceError};
pub use store::EntityStore;

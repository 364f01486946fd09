//! Per-id enrichment tasks for the species and type phases

pub mod species;
pub mod types;

pub use species::{build_species_entity, collect_descriptions, enrich_species, SpeciesOutcome};
pub use types::{enrich_types, TypeOutcome};

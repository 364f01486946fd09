//! Remote record source
//!
//! The pipeline only depends on the [`RecordSource`] trait. [`PokeApiClient`]
//! is the HTTP implementation; tests plug in an in-memory source.

mod pokeapi;

pub use pokeapi::{PokeApiClient, POKEAPI_BASE_URL};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote source errors
///
/// The retry policy treats every variant the same way.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Name plus resource URL, the API's universal reference shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// Localized genus ("Seed Pokémon")
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Genus {
    pub genus: String,
    pub language: NamedResource,
}

/// Localized flavor text from one game version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
}

/// `pokemon-species/{id}` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeciesRecord {
    pub id: u32,
    pub name: String,
    /// Generation reference; the id is the trailing URL segment
    pub generation: NamedResource,
    /// Species this one evolves from, `null` for base forms
    #[serde(default)]
    pub evolves_from_species: Option<NamedResource>,
    #[serde(default)]
    pub genera: Vec<Genus>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
}

/// One type slot of a base form
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// `pokemon/{id}` response (only the fields the pipeline reads)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BaseFormRecord {
    pub id: u32,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

/// Node of an evolution tree
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

/// `evolution-chain/{id}` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvolutionChainRecord {
    pub id: u32,
    pub chain: ChainLink,
}

/// Language code used for every localized field the pipeline keeps
pub const ENGLISH: &str = "en";

/// Provider of species, base-form and evolution-chain records by numeric id
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Species record (name, generation, genera, flavor texts, precedent)
    async fn species(&self, id: u32) -> Result<SpeciesRecord, SourceError>;

    /// Base-form record (types)
    async fn base_form(&self, id: u32) -> Result<BaseFormRecord, SourceError>;

    /// Evolution chain with the given chain id
    async fn evolution_chain(&self, id: u32) -> Result<EvolutionChainRecord, SourceError>;
}

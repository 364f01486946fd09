//! Species phase: creates one entity per species id

use crate::models::Entity;
use crate::pool::Outcome;
use crate::retry::RetryPolicy;
use crate::source::{FlavorTextEntry, RecordSource, SpeciesRecord, ENGLISH};
use crate::store::EntityStore;
use crate::text::{normalize_flavor_text, title_case, trailing_id};

/// Result of enriching one species id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesOutcome {
    Stored,
    /// Bounded retry gave up; the id stays absent from the store
    Abandoned { attempts: u32 },
}

impl Outcome for SpeciesOutcome {
    fn label(&self) -> &'static str {
        match self {
            SpeciesOutcome::Stored => "stored",
            SpeciesOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

/// Fetch the species record for `id` and store a fresh entity
///
/// Overwrites any entity already stored at `id`.
pub async fn enrich_species(
    id: u32,
    source: &dyn RecordSource,
    store: &EntityStore,
    retry: &RetryPolicy,
) -> SpeciesOutcome {
    let record = match retry.run("species", id, || source.species(id)).await {
        Ok(record) => record,
        Err(e) => return SpeciesOutcome::Abandoned { attempts: e.attempts },
    };

    let entity = build_species_entity(id, &record);
    tracing::trace!(id, name = %entity.name, "Species stored");
    store.put(id, entity).await;

    SpeciesOutcome::Stored
}

/// Map a species record onto a new entity
pub fn build_species_entity(id: u32, record: &SpeciesRecord) -> Entity {
    let name = title_case(&record.name);

    let generation = trailing_id(&record.generation.url).unwrap_or_else(|| {
        tracing::debug!(id, url = %record.generation.url, "Generation URL has no numeric id");
        0
    });

    let precedent = record
        .evolves_from_species
        .as_ref()
        .map(|parent| title_case(&parent.name))
        .unwrap_or_default();

    let category = record
        .genera
        .iter()
        .find(|genus| genus.language.name == ENGLISH)
        .map(|genus| genus.genus.clone())
        .unwrap_or_default();

    let descriptions = collect_descriptions(&name, &record.flavor_text_entries);

    Entity {
        id,
        name,
        category,
        generation,
        descriptions,
        types: Vec::new(),
        precedent,
        stage: String::new(),
    }
}

/// English flavor texts, normalized, without self-references or duplicates
///
/// Source order is preserved.
pub fn collect_descriptions(name: &str, entries: &[FlavorTextEntry]) -> Vec<String> {
    let own_name = name.to_lowercase();
    let mut descriptions: Vec<String> = Vec::new();

    for entry in entries.iter().filter(|e| e.language.name == ENGLISH) {
        let text = normalize_flavor_text(&entry.flavor_text);

        if text.contains(&own_name) || descriptions.contains(&text) {
            continue;
        }

        descriptions.push(text);
    }

    descriptions
}

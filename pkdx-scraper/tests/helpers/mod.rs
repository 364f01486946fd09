//! In-memory record source for pipeline tests
//!
//! Records are built with the same JSON shapes PokeAPI returns. Failures can
//! be injected per (resource, id) either for the first N calls or forever.

#![allow(dead_code)]

use pkdx_scraper::source::{
    BaseFormRecord, EvolutionChainRecord, RecordSource, SourceError, SpeciesRecord,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Species,
    BaseForm,
    Chain,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Times(u32),
    Always,
}

/// Record source backed by hash maps
#[derive(Default)]
pub struct FixtureSource {
    species: HashMap<u32, SpeciesRecord>,
    base_forms: HashMap<u32, BaseFormRecord>,
    chains: HashMap<u32, EvolutionChainRecord>,
    failures: Mutex<HashMap<(Resource, u32), Failure>>,
    calls: Mutex<HashMap<(Resource, u32), u32>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_species(mut self, record: Value) -> Self {
        let record: SpeciesRecord = serde_json::from_value(record).expect("species fixture");
        self.species.insert(record.id, record);
        self
    }

    pub fn with_base_form(mut self, record: Value) -> Self {
        let record: BaseFormRecord = serde_json::from_value(record).expect("base form fixture");
        self.base_forms.insert(record.id, record);
        self
    }

    pub fn with_chain(mut self, record: Value) -> Self {
        let record: EvolutionChainRecord = serde_json::from_value(record).expect("chain fixture");
        self.chains.insert(record.id, record);
        self
    }

    /// Fail the first `times` calls for (resource, id)
    pub fn failing(self, resource: Resource, id: u32, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert((resource, id), Failure::Times(times));
        self
    }

    /// Fail every call for (resource, id)
    pub fn always_failing(self, resource: Resource, id: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert((resource, id), Failure::Always);
        self
    }

    pub fn calls(&self, resource: Resource, id: u32) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&(resource, id))
            .copied()
            .unwrap_or(0)
    }

    fn record_call(&self, resource: Resource, id: u32) -> Result<(), SourceError> {
        *self.calls.lock().unwrap().entry((resource, id)).or_insert(0) += 1;

        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&(resource, id)) {
            Some(Failure::Always) => Err(SourceError::NetworkError("connection reset".to_string())),
            Some(Failure::Times(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Err(SourceError::ApiError(503, "try again".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for FixtureSource {
    async fn species(&self, id: u32) -> Result<SpeciesRecord, SourceError> {
        self.record_call(Resource::Species, id)?;
        self.species
            .get(&id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("pokemon-species/{}", id)))
    }

    async fn base_form(&self, id: u32) -> Result<BaseFormRecord, SourceError> {
        self.record_call(Resource::BaseForm, id)?;
        self.base_forms
            .get(&id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("pokemon/{}", id)))
    }

    async fn evolution_chain(&self, id: u32) -> Result<EvolutionChainRecord, SourceError> {
        self.record_call(Resource::Chain, id)?;
        self.chains
            .get(&id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("evolution-chain/{}", id)))
    }
}

pub fn species_url(id: u32) -> String {
    format!("https://pokeapi.co/api/v2/pokemon-species/{}/", id)
}

fn language(code: &str) -> Value {
    json!({"name": code, "url": format!("https://pokeapi.co/api/v2/language/{}/", code)})
}

/// Species JSON with English genus and the given flavor texts
pub fn species_json(
    id: u32,
    name: &str,
    generation: u32,
    evolves_from: Option<(u32, &str)>,
    flavor_texts: &[(&str, &str)],
) -> Value {
    json!({
        "id": id,
        "name": name,
        "generation": {
            "name": format!("generation-{}", generation),
            "url": format!("https://pokeapi.co/api/v2/generation/{}/", generation)
        },
        "evolves_from_species": evolves_from.map(|(pid, pname)| json!({"name": pname, "url": species_url(pid)})),
        "genera": [
            {"genus": format!("{} Pokémon (ja)", name), "language": language("ja")},
            {"genus": format!("{} Pokémon", name), "language": language("en")}
        ],
        "flavor_text_entries": flavor_texts
            .iter()
            .map(|(text, lang)| json!({"flavor_text": text, "language": language(lang)}))
            .collect::<Vec<_>>()
    })
}

/// Base form JSON with the given type names in slot order
pub fn base_form_json(id: u32, types: &[&str]) -> Value {
    json!({
        "id": id,
        "name": format!("form-{}", id),
        "types": types
            .iter()
            .enumerate()
            .map(|(slot, name)| json!({
                "slot": slot + 1,
                "type": {"name": name, "url": format!("https://pokeapi.co/api/v2/type/{}/", name)}
            }))
            .collect::<Vec<_>>()
    })
}

/// Chain link JSON
pub fn link_json(id: u32, evolves_to: Vec<Value>) -> Value {
    json!({
        "species": {"name": format!("species-{}", id), "url": species_url(id)},
        "evolves_to": evolves_to
    })
}

pub fn chain_json(chain_id: u32, root: Value) -> Value {
    json!({"id": chain_id, "chain": root})
}

//! Entity persisted per species id

use serde::{Deserialize, Serialize};

/// One species record in the corpus
///
/// Created by the species phase, mutated in place by the type and lineage
/// phases, never deleted. `descriptions` serializes as `[]` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Species id as numbered by the remote API
    pub id: u32,
    /// Title-cased species name
    pub name: String,
    /// English genus, empty if none found
    pub category: String,
    /// Generation number parsed from the generation URL
    pub generation: u32,
    /// Normalized, deduplicated English flavor texts
    pub descriptions: Vec<String>,
    /// Title-cased type names in slot order
    pub types: Vec<String>,
    /// Title-cased name of the species this one evolves from
    pub precedent: String,
    /// `"<level>/<maxLevel>"` within its lineage group
    pub stage: String,
}

impl Entity {
    /// Entity with only its id set
    ///
    /// Produced when a later phase finds no entity from the species phase.
    pub fn partial(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// True when the species phase never populated this entity
    pub fn is_partial(&self) -> bool {
        self.name.is_empty()
    }

    /// Parse `stage` into `(level, max_level)`
    pub fn stage_levels(&self) -> Option<(usize, usize)> {
        let (level, max) = self.stage.split_once('/')?;
        Some((level.parse().ok()?, max.parse().ok()?))
    }
}

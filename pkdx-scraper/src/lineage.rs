//! Lineage phase: stage labels from evolution chains
//!
//! A chain is flattened into three level buckets (base form, its evolutions,
//! their evolutions). A node is kept only if its species is already in the
//! store; dropping a node does not drop its children, which are visited and
//! filtered on their own. Links deeper than the third level are ignored.

use crate::pool::Outcome;
use crate::retry::RetryPolicy;
use crate::source::{ChainLink, RecordSource};
use crate::store::EntityStore;
use crate::text::trailing_id;
use std::collections::BTreeSet;

/// Number of levels tracked per chain
pub const MAX_LEVELS: usize = 3;

/// Chain ids known to have no usable chain data
pub const DEFAULT_EXCLUSIONS: [u32; 8] = [210, 222, 225, 226, 227, 231, 238, 251];

/// Chain ids skipped outright by the lineage phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<u32>);

impl ExclusionSet {
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS)
    }
}

/// Result of processing one chain id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageOutcome {
    /// Id is in the exclusion set; nothing fetched
    Excluded,
    /// Stages written for `members`; `unresolved` lists dropped references
    Applied {
        members: Vec<u32>,
        max_level: usize,
        unresolved: Vec<u32>,
    },
    /// Every reference in the chain was missing from the store
    Unresolved { dropped: Vec<u32> },
    Abandoned { attempts: u32 },
}

impl Outcome for LineageOutcome {
    fn label(&self) -> &'static str {
        match self {
            LineageOutcome::Excluded => "excluded",
            LineageOutcome::Applied { unresolved, .. } if unresolved.is_empty() => "applied",
            LineageOutcome::Applied { .. } => "applied_partially",
            LineageOutcome::Unresolved { .. } => "unresolved",
            LineageOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

/// Chain members that survived the presence filter, per level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelBuckets {
    pub levels: [Vec<u32>; MAX_LEVELS],
    /// Referenced ids missing from the store
    pub dropped: Vec<u32>,
}

impl LevelBuckets {
    /// Flatten `chain` into buckets, keeping only ids present in `store`
    pub async fn collect(chain: &ChainLink, store: &EntityStore) -> Self {
        let mut buckets = Self::default();
        let mut frontier: Vec<&ChainLink> = vec![chain];

        for level in 0..MAX_LEVELS {
            let mut next = Vec::new();

            for link in frontier {
                match trailing_id(&link.species.url) {
                    Some(id) if store.contains(id).await => buckets.levels[level].push(id),
                    Some(id) => buckets.dropped.push(id),
                    None => {
                        tracing::debug!(url = %link.species.url, "Chain link without species id");
                    }
                }
                next.extend(link.evolves_to.iter());
            }

            frontier = next;
        }

        buckets
    }

    /// Deepest non-empty level (1-based), 1 for an empty chain
    pub fn max_level(&self) -> usize {
        self.levels
            .iter()
            .rposition(|bucket| !bucket.is_empty())
            .map_or(1, |idx| idx + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }

    /// `(id, "<level>/<max>")` for every retained member, base form first
    pub fn stage_labels(&self) -> Vec<(u32, String)> {
        let max = self.max_level();
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(idx, bucket)| {
                bucket
                    .iter()
                    .map(move |id| (*id, format!("{}/{}", idx + 1, max)))
            })
            .collect()
    }
}

/// Fetch chain `id`, filter it against the store and write stage labels
pub async fn build_lineage(
    id: u32,
    source: &dyn RecordSource,
    store: &EntityStore,
    retry: &RetryPolicy,
    exclusions: &ExclusionSet,
) -> LineageOutcome {
    if exclusions.contains(id) {
        return LineageOutcome::Excluded;
    }

    let record = match retry.run("evolution_chain", id, || source.evolution_chain(id)).await {
        Ok(record) => record,
        Err(e) => return LineageOutcome::Abandoned { attempts: e.attempts },
    };

    let buckets = LevelBuckets::collect(&record.chain, store).await;

    if buckets.is_empty() {
        tracing::debug!(chain = id, dropped = ?buckets.dropped, "No chain member in store");
        return LineageOutcome::Unresolved {
            dropped: buckets.dropped,
        };
    }

    if !buckets.dropped.is_empty() {
        tracing::debug!(chain = id, dropped = ?buckets.dropped, "Chain references unresolved");
    }

    let mut members = Vec::new();
    for (member, stage) in buckets.stage_labels() {
        // Absent only if something removed it since the presence check
        if let Some(mut entity) = store.get(member).await {
            entity.stage = stage;
            store.put(member, entity).await;
            members.push(member);
        }
    }

    LineageOutcome::Applied {
        members,
        max_level: buckets.max_level(),
        unresolved: buckets.dropped,
    }
}

//! Three-phase scrape pipeline
//!
//! # Phases
//! SPECIES → TYPES → LINEAGE, each a full worker-pool pass over its id range.
//!
//! Every phase declares the entity fields it reads and writes. A plan is
//! rejected if a phase reads a field no earlier phase writes, and each phase
//! starts only after every worker of the previous one has exited.

use crate::enrich::{enrich_species, enrich_types};
use crate::lineage::{build_lineage, ExclusionSet};
use crate::pool::{self, PhaseReport};
use crate::retry::RetryPolicy;
use crate::source::RecordSource;
use crate::store::EntityStore;
use pkdx_common::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entity fields as seen by the phase ordering check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    /// Presence of the entity itself
    Id,
    Name,
    Category,
    Generation,
    Descriptions,
    Types,
    Precedent,
    Stage,
}

/// One enrichment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Species,
    Types,
    Lineage,
}

impl PhaseKind {
    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Species => "species",
            PhaseKind::Types => "types",
            PhaseKind::Lineage => "lineage",
        }
    }

    pub fn reads(self) -> &'static [Field] {
        match self {
            PhaseKind::Species => &[],
            PhaseKind::Types => &[Field::Id, Field::Types],
            PhaseKind::Lineage => &[Field::Id],
        }
    }

    pub fn writes(self) -> &'static [Field] {
        match self {
            PhaseKind::Species => &[
                Field::Id,
                Field::Name,
                Field::Category,
                Field::Generation,
                Field::Descriptions,
                Field::Types,
                Field::Precedent,
                Field::Stage,
            ],
            PhaseKind::Types => &[Field::Types],
            PhaseKind::Lineage => &[Field::Stage],
        }
    }
}

/// Tunables for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Species and type phases cover `[1, species_count]`
    pub species_count: u32,
    /// Lineage phase covers chain ids `[1, lineage_count]`
    pub lineage_count: u32,
    pub pool_size: usize,
    pub exclusions: ExclusionSet,
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            species_count: 768,
            lineage_count: 422,
            pool_size: 250,
            exclusions: ExclusionSet::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Phase plus the id range it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub kind: PhaseKind,
    pub total_ids: u32,
}

/// Reports of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub phases: Vec<PhaseReport>,
    pub entities: usize,
    pub elapsed: Duration,
}

/// Check that every phase only reads fields written by an earlier phase
pub fn validate_plan(plan: &[PhasePlan]) -> Result<()> {
    let mut written: BTreeSet<Field> = BTreeSet::new();

    for step in plan {
        let missing: Vec<Field> = step
            .kind
            .reads()
            .iter()
            .copied()
            .filter(|field| !written.contains(field))
            .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Phase '{}' reads {:?} before any earlier phase writes them",
                step.kind.name(),
                missing
            )));
        }

        written.extend(step.kind.writes().iter().copied());
    }

    Ok(())
}

/// Scrape pipeline bound to one record source and one store
pub struct Pipeline {
    source: Arc<dyn RecordSource>,
    store: Arc<EntityStore>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Pipeline with a fresh, empty store
    pub fn new(source: Arc<dyn RecordSource>, settings: PipelineSettings) -> Self {
        Self::with_store(source, Arc::new(EntityStore::new()), settings)
    }

    pub fn with_store(
        source: Arc<dyn RecordSource>,
        store: Arc<EntityStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Default phase order with configured id ranges
    pub fn plan(&self) -> Vec<PhasePlan> {
        vec![
            PhasePlan {
                kind: PhaseKind::Species,
                total_ids: self.settings.species_count,
            },
            PhasePlan {
                kind: PhaseKind::Types,
                total_ids: self.settings.species_count,
            },
            PhasePlan {
                kind: PhaseKind::Lineage,
                total_ids: self.settings.lineage_count,
            },
        ]
    }

    /// Run the default plan
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_plan(&self.plan()).await
    }

    /// Validate then run `plan`, one barriered phase after another
    pub async fn run_plan(&self, plan: &[PhasePlan]) -> Result<RunSummary> {
        validate_plan(plan)?;

        let start = Instant::now();
        let mut phases = Vec::with_capacity(plan.len());

        for (index, step) in plan.iter().enumerate() {
            tracing::info!(
                phase = step.kind.name(),
                ids = step.total_ids,
                workers = self.settings.pool_size,
                "Phase {}/{} starting",
                index + 1,
                plan.len()
            );

            let report = self.run_phase(*step).await?;

            tracing::info!(
                phase = step.kind.name(),
                processed = report.processed,
                outcomes = ?report.outcomes,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Phase {}/{} done",
                index + 1,
                plan.len()
            );

            phases.push(report);
        }

        Ok(RunSummary {
            phases,
            entities: self.store.len().await,
            elapsed: start.elapsed(),
        })
    }

    /// Run one phase to completion
    pub async fn run_phase(&self, step: PhasePlan) -> Result<PhaseReport> {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let retry = Arc::new(self.settings.retry.clone());
        let pool_size = self.settings.pool_size;
        let name = step.kind.name();

        match step.kind {
            PhaseKind::Species => {
                pool::run(
                    name,
                    move |id| {
                        let (source, store, retry) = (source.clone(), store.clone(), retry.clone());
                        async move { enrich_species(id, source.as_ref(), &store, &retry).await }
                    },
                    step.total_ids,
                    pool_size,
                )
                .await
            }
            PhaseKind::Types => {
                pool::run(
                    name,
                    move |id| {
                        let (source, store, retry) = (source.clone(), store.clone(), retry.clone());
                        async move { enrich_types(id, source.as_ref(), &store, &retry).await }
                    },
                    step.total_ids,
                    pool_size,
                )
                .await
            }
            PhaseKind::Lineage => {
                let exclusions = Arc::new(self.settings.exclusions.clone());
                pool::run(
                    name,
                    move |id| {
                        let (source, store, retry) = (source.clone(), store.clone(), retry.clone());
                        let exclusions = exclusions.clone();
                        async move {
                            build_lineage(id, source.as_ref(), &store, &retry, &exclusions).await
                        }
                    },
                    step.total_ids,
                    pool_size,
                )
                .await
            }
        }
    }
}

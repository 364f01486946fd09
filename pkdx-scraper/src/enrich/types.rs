//! Type phase: appends type labels to stored entities

use crate::models::Entity;
use crate::pool::Outcome;
use crate::retry::RetryPolicy;
use crate::source::RecordSource;
use crate::store::EntityStore;
use crate::text::title_case;

/// Result of enriching one base form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOutcome {
    Stored,
    /// No species entity existed; a type-only entity was created
    Partial,
    Abandoned { attempts: u32 },
}

impl Outcome for TypeOutcome {
    fn label(&self) -> &'static str {
        match self {
            TypeOutcome::Stored => "stored",
            TypeOutcome::Partial => "partial",
            TypeOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

/// Fetch the base form for `id` and append its types to the stored entity
///
/// The remote call happens before the store is read, so the read-modify-write
/// window never spans network I/O.
pub async fn enrich_types(
    id: u32,
    source: &dyn RecordSource,
    store: &EntityStore,
    retry: &RetryPolicy,
) -> TypeOutcome {
    let record = match retry.run("base_form", id, || source.base_form(id)).await {
        Ok(record) => record,
        Err(e) => return TypeOutcome::Abandoned { attempts: e.attempts },
    };

    let (mut entity, outcome) = match store.get(id).await {
        Some(entity) => (entity, TypeOutcome::Stored),
        None => {
            tracing::warn!(id, "No species entity for base form, storing partial entity");
            (Entity::partial(id), TypeOutcome::Partial)
        }
    };

    entity
        .types
        .extend(record.types.iter().map(|slot| title_case(&slot.kind.name)));

    store.put(id, entity).await;
    outcome
}

use crate::state::{RunStatus, WorkflowState};
use crate::util::now_epoch_ms;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a persister did (or, for dry runs, would have done) with a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub dry_run: bool,
    /// Record counts per kind; "would persist" counts when `dry_run`.
    pub counts: BTreeMap<String, usize>,
    pub error_count: usize,
    pub timestamp_ms: u128,
}

pub trait Persister {
    fn persist(&self, state: &WorkflowState) -> Result<PersistSummary>;
}

/// Persists nothing; reports the counts a durable store would receive and
/// mints a fresh uuid v4 run id.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryPersister;

impl Persister for InMemoryPersister {
    fn persist(&self, state: &WorkflowState) -> Result<PersistSummary> {
        Ok(PersistSummary {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: RunStatus::from_error_count(state.errors.len()),
            dry_run: state.options.dry_run,
            counts: record_counts(state),
            error_count: state.errors.len(),
            timestamp_ms: now_epoch_ms()?,
        })
    }
}

pub fn record_counts(state: &WorkflowState) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    counts.insert(
        "source_system".to_string(),
        usize::from(state.source_system.is_some()),
    );
    counts.insert("spec_documents".to_string(), state.spec_documents.len());
    counts.insert("endpoints".to_string(), state.endpoints.len());
    counts.insert("schemas".to_string(), state.schemas.len());
    counts.insert("entities".to_string(), state.entities.len());
    counts.insert(
        "integration_task".to_string(),
        usize::from(state.integration_task.is_some()),
    );
    counts.insert("flow_nodes".to_string(), state.flow_nodes.len());
    counts.insert("policies".to_string(), state.policies.len());
    counts.insert("code_artifacts".to_string(), state.code_artifacts.len());
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reflects_recorded_errors() {
        let mut state = WorkflowState::new(Vec::new(), "task");
        let clean = InMemoryPersister.persist(&state).expect("persist");
        assert_eq!(clean.status, RunStatus::Completed);
        assert!(uuid::Uuid::parse_str(&clean.run_id).is_ok());

        state.record_error("boom");
        let dirty = InMemoryPersister.persist(&state).expect("persist");
        assert_eq!(dirty.status, RunStatus::CompletedWithErrors);
        assert_eq!(dirty.error_count, 1);
        assert_ne!(clean.run_id, dirty.run_id);
    }
}

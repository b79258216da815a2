use crate::pipeline::{StepContext, StepError};
use crate::state::WorkflowState;

/// Hand the run to the persister and keep its summary and run id.
pub fn persist_results(state: &mut WorkflowState, ctx: &StepContext<'_>) -> Result<(), StepError> {
    let summary = ctx
        .providers
        .persister
        .persist(state)
        .map_err(|err| StepError::Io(format!("Failed to persist results: {err:#}")))?;
    tracing::info!(
        run_id = %summary.run_id,
        status = %summary.status,
        dry_run = summary.dry_run,
        "persisted run"
    );
    state.run_id = Some(summary.run_id.clone());
    state.persist_summary = Some(summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::pipeline::steps::test_support::{collaborators, with_context};
    use crate::providers::{PersistSummary, Persister};
    use crate::state::RunStatus;

    struct BrokenPersister;

    impl Persister for BrokenPersister {
        fn persist(&self, _state: &WorkflowState) -> anyhow::Result<PersistSummary> {
            Err(anyhow::anyhow!("store unavailable"))
        }
    }

    #[test]
    fn summary_status_tracks_errors() {
        let config = RuntimeConfig::default();
        let mut state = WorkflowState::new(Vec::new(), "task");
        state.record_error("earlier failure");
        with_context(collaborators(&config), |ctx| persist_results(&mut state, ctx))
            .expect("persist");

        let summary = state.persist_summary.as_ref().expect("summary");
        assert_eq!(summary.status, RunStatus::CompletedWithErrors);
        assert_eq!(state.run_id.as_deref(), Some(summary.run_id.as_str()));
    }

    #[test]
    fn persister_failure_is_recoverable() {
        let config = RuntimeConfig::default();
        let mut state = WorkflowState::new(Vec::new(), "task");
        let providers = collaborators(&config).with_persister(BrokenPersister);
        let err = with_context(providers, |ctx| persist_results(&mut state, ctx)).unwrap_err();
        assert!(err.to_string().contains("store unavailable"));
        assert!(state.run_id.is_none());
    }
}

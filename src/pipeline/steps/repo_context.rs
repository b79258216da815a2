use crate::pipeline::{StepContext, StepError};
use crate::repo::{build_snapshot, default_profile};
use crate::state::WorkflowState;

/// Resolve the layout profile and snapshot the target repository.
pub fn attach_repo_context(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(root) = state.repo_root.clone() else {
        return Ok(());
    };
    if state.repo_profile.is_none() {
        state.repo_profile = Some(default_profile());
    }
    let snapshot = build_snapshot(&root).map_err(|err| {
        StepError::Io(format!(
            "Failed to read repository {}: {err:#}",
            root.display()
        ))
    })?;
    tracing::info!(
        repo = %snapshot.repo_name,
        files = snapshot.stats.total_files,
        skipped = snapshot.stats.skipped_files,
        "attached repo context"
    );
    state.repo_snapshot = Some(snapshot);
    Ok(())
}

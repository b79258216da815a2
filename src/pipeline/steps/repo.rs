//! Repository integration: plan the file changes, then write them unless
//! the run is a dry run.
use crate::pipeline::{StepContext, StepError};
use crate::repo::{apply_changes, default_profile, plan_changes};
use crate::state::WorkflowState;
use serde_json::Value;

pub const DRY_RUN_NOTE: &str = "dry_run_summary";
const DRY_RUN_HEADER: &str = "DRY RUN - Would apply the following changes:";

pub fn analyze_repo_layout(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(root) = state.repo_root.as_deref() else {
        return Err(StepError::MissingInput(
            "No repo_root for repository analysis".to_string(),
        ));
    };
    if state.code_artifacts.is_empty() {
        return Err(StepError::MissingInput(
            "No code_artifacts to place in repository".to_string(),
        ));
    }
    let profile = state.repo_profile.clone().unwrap_or_else(default_profile);
    let changes = plan_changes(root, &state.code_artifacts, &profile)
        .map_err(|err| StepError::Io(format!("Failed to plan repo changes: {err:#}")))?;
    tracing::info!(
        profile = %profile.name,
        created = changes.files_created(),
        updated = changes.files_updated(),
        "planned repo changes"
    );
    state.repo_changes = Some(changes);
    Ok(())
}

pub fn apply_repo_integration_changes(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(changes) = state.repo_changes.as_ref() else {
        return Err(StepError::MissingInput(
            "No repo_changes to apply".to_string(),
        ));
    };

    if state.options.dry_run {
        let mut summary = vec![DRY_RUN_HEADER.to_string()];
        summary.extend(changes.summary_lines().into_iter().map(|line| format!("  {line}")));
        tracing::info!(changes = changes.changes.len(), "dry run, repository untouched");
        state
            .plan
            .notes
            .insert(DRY_RUN_NOTE.to_string(), Value::String(summary.join("\n")));
        return Ok(());
    }

    let mut changes = changes.clone();
    apply_changes(&mut changes)
        .map_err(|err| StepError::Io(format!("Failed to apply repo changes: {err:#}")))?;
    state.repo_changes = Some(changes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::model::{ArtifactKind, CodeArtifact};
    use crate::pipeline::steps::test_support::{collaborators, with_context};
    use crate::state::RunOptions;
    use std::fs;
    use std::path::Path;

    fn repo_state(root: &Path, dry_run: bool) -> WorkflowState {
        let mut state = WorkflowState::new(Vec::new(), "task")
            .with_options(RunOptions {
                dry_run,
                ..RunOptions::default()
            })
            .with_repo(Some(root.to_path_buf()), None);
        state.code_artifacts = vec![CodeArtifact {
            kind: ArtifactKind::Client,
            language: "python".to_string(),
            module_name: "acme_client".to_string(),
            rel_path: "clients/acme_client.py".to_string(),
            content: "class AcmeClient: ...\n".to_string(),
        }];
        state
    }

    fn analyze_then_apply(state: &mut WorkflowState) {
        let config = RuntimeConfig::default();
        with_context(collaborators(&config), |ctx| {
            analyze_repo_layout(state, ctx)?;
            apply_repo_integration_changes(state, ctx)
        })
        .expect("analyze and apply");
    }

    #[test]
    fn dry_run_leaves_repository_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = repo_state(dir.path(), true);
        analyze_then_apply(&mut state);

        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
        let changes = state.repo_changes.as_ref().expect("changes");
        assert!(!changes.applied);
        assert_eq!(changes.files_created(), 1);
        let note = state.plan.notes[DRY_RUN_NOTE].as_str().expect("note");
        assert!(note.starts_with(DRY_RUN_HEADER));
        assert!(note.contains("CREATE: src/integrations/clients/acme_client.py"));
    }

    #[test]
    fn apply_writes_and_second_run_updates_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("src/integrations/clients/acme_client.py");

        let mut first = repo_state(dir.path(), false);
        analyze_then_apply(&mut first);
        assert!(first.repo_changes.as_ref().is_some_and(|set| set.applied));
        let after_first = fs::read_to_string(&target).expect("read");

        let mut second = repo_state(dir.path(), false);
        analyze_then_apply(&mut second);
        let changes = second.repo_changes.as_ref().expect("changes");
        assert_eq!(changes.files_updated(), 1);
        assert!(changes.changes[0].is_unchanged());
        assert_eq!(fs::read_to_string(&target).expect("read"), after_first);
    }

    #[test]
    fn analyze_requires_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = repo_state(dir.path(), true);
        state.code_artifacts.clear();
        let config = RuntimeConfig::default();
        let err = with_context(collaborators(&config), |ctx| {
            analyze_repo_layout(&mut state, ctx)
        })
        .unwrap_err();
        assert!(matches!(err, StepError::MissingInput(_)));
        assert!(state.repo_changes.is_none());
    }
}

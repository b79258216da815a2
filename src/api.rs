//! Library entrypoint: design and generate one integration.
use crate::config::RuntimeConfig;
use crate::model::{CodeArtifact, IntegrationTask};
use crate::pipeline::{run_pipeline, StepContext};
use crate::providers::Collaborators;
use crate::repo::{RepoChangeSet, RepoProfile};
use crate::state::{RunOptions, RunStatus, WorkflowState};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct IntegrationRequest {
    /// Only the first reference is ingested.
    pub spec_refs: Vec<String>,
    pub task_description: String,
    pub provider_code: Option<String>,
    pub repo_root: Option<PathBuf>,
    pub repo_profile: Option<RepoProfile>,
    pub options: RunOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationResult {
    pub run_id: String,
    pub status: RunStatus,
    pub provider_code: String,
    pub task_slug: String,
    pub task: Option<IntegrationTask>,
    pub code_artifacts: Vec<CodeArtifact>,
    pub repo_changes: Option<RepoChangeSet>,
    pub report_markdown: String,
    pub errors: Vec<String>,
}

/// Run the full pipeline for `request`.
///
/// Expected problems (missing spec, unparseable content, unmatched task)
/// end up in `errors` and the report; only unexpected faults return `Err`.
pub fn design_and_generate_integration(
    request: IntegrationRequest,
    config: &RuntimeConfig,
    providers: &Collaborators,
) -> Result<IntegrationResult> {
    let state = WorkflowState::new(request.spec_refs, request.task_description)
        .with_provider_code(request.provider_code)
        .with_options(request.options)
        .with_repo(request.repo_root, request.repo_profile);
    let state = run_pipeline(state, StepContext { config, providers })?;
    Ok(into_result(state))
}

fn into_result(state: WorkflowState) -> IntegrationResult {
    let status = state
        .persist_summary
        .as_ref()
        .map(|summary| summary.status)
        .unwrap_or_else(|| RunStatus::from_error_count(state.errors.len()));
    let run_id = state
        .run_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    IntegrationResult {
        run_id,
        status,
        provider_code: state.plan.provider_code,
        task_slug: state.plan.task_slug,
        task: state.integration_task,
        code_artifacts: state.code_artifacts,
        repo_changes: state.repo_changes,
        report_markdown: state.report.unwrap_or_default(),
        errors: state.errors,
    }
}

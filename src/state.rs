//! The workflow state record threaded through every pipeline step.
//!
//! One `WorkflowState` exists per run. Inputs are fixed when the record is
//! built; every other field starts empty and is filled by the step that owns
//! it (see the descriptor table in `pipeline`).
use crate::model::{
    ChunkEmbedding, CodeArtifact, Endpoint, EndpointBinding, EndpointParameter, Entity,
    EntityRelationship, Event, FlowEdge, FlowNode, IntegrationTask, Policy, Schema, SchemaField,
    SourceSystem, SpecDocument, TaskBrief, WorkflowTemplate,
};
use crate::pipeline::StepName;
use crate::providers::PersistSummary;
use crate::repo::{RepoChangeSet, RepoProfile, RepoSnapshot};
use crate::util::sha256_hex;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Caller-supplied switches for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub repo_integration_enabled: bool,
    pub dry_run: bool,
    pub override_provider_code: Option<String>,
    pub override_task_slug: Option<String>,
    pub override_llm_model: Option<String>,
    pub override_max_tokens: Option<u32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            repo_integration_enabled: true,
            dry_run: false,
            override_provider_code: None,
            override_task_slug: None,
            override_llm_model: None,
            override_max_tokens: None,
        }
    }
}

/// Resolved run plan written by the `plan_run` step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunPlan {
    pub provider_code: String,
    pub task_slug: String,
    pub primary_spec_ref: Option<String>,
    pub use_repo: bool,
    /// Concrete step order, starting with `plan_run` itself.
    pub steps: Vec<StepName>,
    /// Free-form annotations added by later steps, e.g. the dry-run summary.
    pub notes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
}

impl RunStatus {
    pub fn from_error_count(count: usize) -> Self {
        if count == 0 {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    // Inputs
    pub spec_refs: Vec<String>,
    pub task_description: String,
    pub provider_code: Option<String>,
    pub options: RunOptions,
    pub repo_root: Option<PathBuf>,

    // Raw spec
    pub spec_documents: Vec<SpecDocument>,
    pub chunks: Vec<String>,
    pub parsed_spec: Option<Value>,

    // Silver
    pub source_system: Option<SourceSystem>,
    pub endpoints: Vec<Endpoint>,
    pub parameters: Vec<EndpointParameter>,
    pub schemas: Vec<Schema>,
    pub schema_fields: Vec<SchemaField>,
    pub entities: Vec<Entity>,
    pub relationships: Vec<EntityRelationship>,
    pub events: Vec<Event>,

    pub embeddings: Vec<ChunkEmbedding>,

    // Gold
    pub task_brief: Option<TaskBrief>,
    pub workflow_template: Option<WorkflowTemplate>,
    pub integration_task: Option<IntegrationTask>,
    pub flow_nodes: Vec<FlowNode>,
    pub flow_edges: Vec<FlowEdge>,
    pub endpoint_bindings: Vec<EndpointBinding>,
    pub policies: Vec<Policy>,

    pub code_artifacts: Vec<CodeArtifact>,

    // Repo integration
    pub repo_profile: Option<RepoProfile>,
    pub repo_snapshot: Option<RepoSnapshot>,
    pub repo_changes: Option<RepoChangeSet>,

    // Bookkeeping
    pub plan: RunPlan,
    pub completed_steps: Vec<StepName>,
    pub errors: Vec<String>,

    // Outputs
    pub persist_summary: Option<PersistSummary>,
    pub report: Option<String>,
    pub run_id: Option<String>,
}

impl WorkflowState {
    pub fn new(spec_refs: Vec<String>, task_description: impl Into<String>) -> Self {
        Self {
            spec_refs,
            task_description: task_description.into(),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_provider_code(mut self, provider_code: Option<String>) -> Self {
        self.provider_code = provider_code;
        self
    }

    /// Target repository, with an optional pre-selected layout profile.
    pub fn with_repo(mut self, root: Option<PathBuf>, profile: Option<RepoProfile>) -> Self {
        self.repo_root = root;
        self.repo_profile = profile;
        self
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Addressable fields of [`WorkflowState`], used to declare step contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateField {
    SpecRefs,
    TaskDescription,
    ProviderCode,
    Options,
    RepoRoot,
    SpecDocuments,
    Chunks,
    ParsedSpec,
    SourceSystem,
    Endpoints,
    Parameters,
    Schemas,
    SchemaFields,
    Entities,
    Relationships,
    Events,
    Embeddings,
    TaskBrief,
    WorkflowTemplate,
    IntegrationTask,
    FlowNodes,
    FlowEdges,
    EndpointBindings,
    Policies,
    CodeArtifacts,
    RepoProfile,
    RepoSnapshot,
    RepoChanges,
    Plan,
    CompletedSteps,
    Errors,
    PersistSummary,
    Report,
    RunId,
}

impl StateField {
    pub const ALL: [StateField; 34] = [
        StateField::SpecRefs,
        StateField::TaskDescription,
        StateField::ProviderCode,
        StateField::Options,
        StateField::RepoRoot,
        StateField::SpecDocuments,
        StateField::Chunks,
        StateField::ParsedSpec,
        StateField::SourceSystem,
        StateField::Endpoints,
        StateField::Parameters,
        StateField::Schemas,
        StateField::SchemaFields,
        StateField::Entities,
        StateField::Relationships,
        StateField::Events,
        StateField::Embeddings,
        StateField::TaskBrief,
        StateField::WorkflowTemplate,
        StateField::IntegrationTask,
        StateField::FlowNodes,
        StateField::FlowEdges,
        StateField::EndpointBindings,
        StateField::Policies,
        StateField::CodeArtifacts,
        StateField::RepoProfile,
        StateField::RepoSnapshot,
        StateField::RepoChanges,
        StateField::Plan,
        StateField::CompletedSteps,
        StateField::Errors,
        StateField::PersistSummary,
        StateField::Report,
        StateField::RunId,
    ];

    /// Fields every step may append to regardless of its declared writes.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(self, StateField::CompletedSteps | StateField::Errors)
    }
}

/// Stable fingerprint of one field's current value.
pub fn field_digest(state: &WorkflowState, field: StateField) -> Result<String> {
    let value = match field {
        StateField::SpecRefs => serde_json::to_vec(&state.spec_refs),
        StateField::TaskDescription => serde_json::to_vec(&state.task_description),
        StateField::ProviderCode => serde_json::to_vec(&state.provider_code),
        StateField::Options => serde_json::to_vec(&state.options),
        StateField::RepoRoot => serde_json::to_vec(&state.repo_root),
        StateField::SpecDocuments => serde_json::to_vec(&state.spec_documents),
        StateField::Chunks => serde_json::to_vec(&state.chunks),
        StateField::ParsedSpec => serde_json::to_vec(&state.parsed_spec),
        StateField::SourceSystem => serde_json::to_vec(&state.source_system),
        StateField::Endpoints => serde_json::to_vec(&state.endpoints),
        StateField::Parameters => serde_json::to_vec(&state.parameters),
        StateField::Schemas => serde_json::to_vec(&state.schemas),
        StateField::SchemaFields => serde_json::to_vec(&state.schema_fields),
        StateField::Entities => serde_json::to_vec(&state.entities),
        StateField::Relationships => serde_json::to_vec(&state.relationships),
        StateField::Events => serde_json::to_vec(&state.events),
        StateField::Embeddings => serde_json::to_vec(&state.embeddings),
        StateField::TaskBrief => serde_json::to_vec(&state.task_brief),
        StateField::WorkflowTemplate => serde_json::to_vec(&state.workflow_template),
        StateField::IntegrationTask => serde_json::to_vec(&state.integration_task),
        StateField::FlowNodes => serde_json::to_vec(&state.flow_nodes),
        StateField::FlowEdges => serde_json::to_vec(&state.flow_edges),
        StateField::EndpointBindings => serde_json::to_vec(&state.endpoint_bindings),
        StateField::Policies => serde_json::to_vec(&state.policies),
        StateField::CodeArtifacts => serde_json::to_vec(&state.code_artifacts),
        StateField::RepoProfile => serde_json::to_vec(&state.repo_profile),
        StateField::RepoSnapshot => serde_json::to_vec(&state.repo_snapshot),
        StateField::RepoChanges => serde_json::to_vec(&state.repo_changes),
        StateField::Plan => serde_json::to_vec(&state.plan),
        StateField::CompletedSteps => serde_json::to_vec(&state.completed_steps),
        StateField::Errors => serde_json::to_vec(&state.errors),
        StateField::PersistSummary => serde_json::to_vec(&state.persist_summary),
        StateField::Report => serde_json::to_vec(&state.report),
        StateField::RunId => serde_json::to_vec(&state.run_id),
    }
    .with_context(|| format!("serialize state field {field:?}"))?;
    Ok(sha256_hex(&value))
}

/// Digest of every field, in [`StateField::ALL`] order.
pub fn snapshot_digests(state: &WorkflowState) -> Result<Vec<(StateField, String)>> {
    StateField::ALL
        .iter()
        .map(|field| Ok((*field, field_digest(state, *field)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_empty_with_default_options() {
        let state = WorkflowState::new(vec!["spec.yaml".to_string()], "Create session");
        assert!(state.options.repo_integration_enabled);
        assert!(!state.options.dry_run);
        assert!(state.completed_steps.is_empty());
        assert!(state.errors.is_empty());
        assert!(state.run_id.is_none());
    }

    #[test]
    fn digests_change_only_for_touched_fields() {
        let mut state = WorkflowState::new(Vec::new(), "task");
        let before = snapshot_digests(&state).expect("digests");
        state.chunks.push("paths:".to_string());
        let after = snapshot_digests(&state).expect("digests");
        let changed: Vec<StateField> = before
            .iter()
            .zip(after.iter())
            .filter(|(lhs, rhs)| lhs.1 != rhs.1)
            .map(|(lhs, _)| lhs.0)
            .collect();
        assert_eq!(changed, vec![StateField::Chunks]);
    }

    #[test]
    fn run_status_follows_error_count() {
        assert_eq!(RunStatus::from_error_count(0), RunStatus::Completed);
        assert_eq!(
            RunStatus::from_error_count(2).to_string(),
            "completed_with_errors"
        );
    }
}

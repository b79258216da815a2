//! Step pipeline: named steps, their field contracts, and the runner.
//!
//! Every step is a plain function over `&mut WorkflowState`. Its descriptor
//! declares which fields it reads and which it may write; the runner can
//! verify the write set after each step (see [`runner::PipelineRunner`]).
pub mod graph;
pub mod runner;
pub mod steps;

pub use graph::StepGraph;
pub use runner::{run_pipeline, PipelineRunner};

use crate::config::RuntimeConfig;
use crate::providers::Collaborators;
use crate::state::{StateField, WorkflowState};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    PlanRun,
    IngestSpec,
    DetectAndParseSpec,
    BuildSilverApiModel,
    EmbedSpecChunks,
    UnderstandTask,
    AlignTaskWithKg,
    PlanIntegrationFlow,
    AttachPoliciesAndPatterns,
    AttachRepoContext,
    GenerateCodeAndTests,
    AnalyzeRepoLayout,
    ApplyRepoIntegrationChanges,
    ValidateIntegrationDesign,
    PersistResults,
    BuildReport,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::PlanRun => "plan_run",
            StepName::IngestSpec => "ingest_spec",
            StepName::DetectAndParseSpec => "detect_and_parse_spec",
            StepName::BuildSilverApiModel => "build_silver_api_model",
            StepName::EmbedSpecChunks => "embed_spec_chunks",
            StepName::UnderstandTask => "understand_task",
            StepName::AlignTaskWithKg => "align_task_with_kg",
            StepName::PlanIntegrationFlow => "plan_integration_flow",
            StepName::AttachPoliciesAndPatterns => "attach_policies_and_patterns",
            StepName::AttachRepoContext => "attach_repo_context",
            StepName::GenerateCodeAndTests => "generate_code_and_tests",
            StepName::AnalyzeRepoLayout => "analyze_repo_layout",
            StepName::ApplyRepoIntegrationChanges => "apply_repo_integration_changes",
            StepName::ValidateIntegrationDesign => "validate_integration_design",
            StepName::PersistResults => "persist_results",
            StepName::BuildReport => "build_report",
        }
    }

    pub fn descriptor(&self) -> &'static StepDescriptor {
        // The table is ordered like the enum.
        &DESCRIPTORS[*self as usize]
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure modes of a single step.
///
/// Everything except `Fault` is expected and gets folded into the state's
/// error list; `Fault` aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("{0}")]
    MissingInput(String),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl StepError {
    pub fn is_fault(&self) -> bool {
        matches!(self, StepError::Fault(_))
    }
}

/// Shared, read-only collaborators handed to every step.
pub struct StepContext<'a> {
    pub config: &'a RuntimeConfig,
    pub providers: &'a Collaborators,
}

pub type StepFn = fn(&mut WorkflowState, &StepContext<'_>) -> Result<(), StepError>;

pub struct StepDescriptor {
    pub name: StepName,
    pub reads: &'static [StateField],
    pub writes: &'static [StateField],
    pub run: StepFn,
}

impl StepDescriptor {
    pub fn may_write(&self, field: StateField) -> bool {
        field.is_bookkeeping() || self.writes.contains(&field)
    }
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("name", &self.name)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish()
    }
}

use StateField as F;

static DESCRIPTORS: [StepDescriptor; 16] = [
    StepDescriptor {
        name: StepName::PlanRun,
        reads: &[F::SpecRefs, F::TaskDescription, F::ProviderCode, F::Options, F::RepoRoot],
        writes: &[F::Plan],
        run: steps::plan_run::plan_run,
    },
    StepDescriptor {
        name: StepName::IngestSpec,
        reads: &[F::SpecRefs],
        writes: &[F::SpecDocuments, F::Chunks],
        run: steps::ingest::ingest_spec,
    },
    StepDescriptor {
        name: StepName::DetectAndParseSpec,
        reads: &[F::SpecDocuments],
        writes: &[F::ParsedSpec],
        run: steps::parse::detect_and_parse_spec,
    },
    StepDescriptor {
        name: StepName::BuildSilverApiModel,
        reads: &[F::ParsedSpec, F::Plan],
        writes: &[
            F::SourceSystem,
            F::Endpoints,
            F::Parameters,
            F::Schemas,
            F::SchemaFields,
            F::Entities,
            F::Relationships,
            F::Events,
        ],
        run: steps::silver::build_silver_api_model,
    },
    StepDescriptor {
        name: StepName::EmbedSpecChunks,
        reads: &[F::Chunks],
        writes: &[F::Embeddings],
        run: steps::embed::embed_spec_chunks,
    },
    StepDescriptor {
        name: StepName::UnderstandTask,
        reads: &[F::TaskDescription, F::Endpoints, F::Parameters, F::Options, F::Plan],
        writes: &[F::TaskBrief, F::WorkflowTemplate],
        run: steps::task::understand_task,
    },
    StepDescriptor {
        name: StepName::AlignTaskWithKg,
        reads: &[F::WorkflowTemplate, F::TaskBrief, F::TaskDescription, F::Plan],
        writes: &[F::IntegrationTask, F::FlowNodes, F::FlowEdges],
        run: steps::task::align_task_with_kg,
    },
    StepDescriptor {
        name: StepName::PlanIntegrationFlow,
        reads: &[F::FlowNodes, F::Endpoints, F::TaskBrief],
        writes: &[F::EndpointBindings],
        run: steps::task::plan_integration_flow,
    },
    StepDescriptor {
        name: StepName::AttachPoliciesAndPatterns,
        reads: &[F::EndpointBindings],
        writes: &[F::Policies],
        run: steps::policies::attach_policies_and_patterns,
    },
    StepDescriptor {
        name: StepName::AttachRepoContext,
        reads: &[F::RepoRoot, F::RepoProfile],
        writes: &[F::RepoProfile, F::RepoSnapshot],
        run: steps::repo_context::attach_repo_context,
    },
    StepDescriptor {
        name: StepName::GenerateCodeAndTests,
        reads: &[
            F::SpecRefs,
            F::TaskDescription,
            F::Plan,
            F::SourceSystem,
            F::IntegrationTask,
            F::TaskBrief,
            F::FlowNodes,
            F::EndpointBindings,
            F::Policies,
        ],
        writes: &[F::CodeArtifacts],
        run: steps::generate::generate_code_and_tests,
    },
    StepDescriptor {
        name: StepName::AnalyzeRepoLayout,
        reads: &[F::RepoRoot, F::RepoProfile, F::CodeArtifacts],
        writes: &[F::RepoChanges],
        run: steps::repo::analyze_repo_layout,
    },
    StepDescriptor {
        name: StepName::ApplyRepoIntegrationChanges,
        reads: &[F::RepoRoot, F::RepoChanges, F::Options],
        writes: &[F::RepoChanges, F::Plan],
        run: steps::repo::apply_repo_integration_changes,
    },
    StepDescriptor {
        name: StepName::ValidateIntegrationDesign,
        reads: &[
            F::IntegrationTask,
            F::FlowNodes,
            F::FlowEdges,
            F::EndpointBindings,
            F::CodeArtifacts,
            F::Endpoints,
        ],
        writes: &[],
        run: steps::validate::validate_integration_design,
    },
    StepDescriptor {
        name: StepName::PersistResults,
        reads: &[
            F::Options,
            F::SourceSystem,
            F::SpecDocuments,
            F::Endpoints,
            F::Schemas,
            F::Entities,
            F::IntegrationTask,
            F::FlowNodes,
            F::Policies,
            F::CodeArtifacts,
            F::Errors,
        ],
        writes: &[F::PersistSummary, F::RunId],
        run: steps::persist::persist_results,
    },
    StepDescriptor {
        name: StepName::BuildReport,
        reads: &[
            F::Plan,
            F::SourceSystem,
            F::Endpoints,
            F::Schemas,
            F::SchemaFields,
            F::Entities,
            F::Relationships,
            F::IntegrationTask,
            F::FlowNodes,
            F::FlowEdges,
            F::EndpointBindings,
            F::Policies,
            F::CodeArtifacts,
            F::RepoProfile,
            F::RepoChanges,
            F::PersistSummary,
            F::CompletedSteps,
            F::Errors,
        ],
        writes: &[F::Report],
        run: steps::report::build_report,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STEPS: [StepName; 16] = [
        StepName::PlanRun,
        StepName::IngestSpec,
        StepName::DetectAndParseSpec,
        StepName::BuildSilverApiModel,
        StepName::EmbedSpecChunks,
        StepName::UnderstandTask,
        StepName::AlignTaskWithKg,
        StepName::PlanIntegrationFlow,
        StepName::AttachPoliciesAndPatterns,
        StepName::AttachRepoContext,
        StepName::GenerateCodeAndTests,
        StepName::AnalyzeRepoLayout,
        StepName::ApplyRepoIntegrationChanges,
        StepName::ValidateIntegrationDesign,
        StepName::PersistResults,
        StepName::BuildReport,
    ];

    #[test]
    fn descriptor_table_matches_step_names() {
        for step in ALL_STEPS {
            assert_eq!(step.descriptor().name, step, "descriptor for {step}");
        }
    }

    #[test]
    fn no_step_declares_inputs_as_writes() {
        let inputs = [
            StateField::SpecRefs,
            StateField::TaskDescription,
            StateField::ProviderCode,
            StateField::Options,
            StateField::RepoRoot,
        ];
        for step in ALL_STEPS {
            for field in inputs {
                assert!(
                    !step.descriptor().writes.contains(&field),
                    "{step} writes input {field:?}"
                );
            }
        }
    }

    #[test]
    fn step_names_serialize_as_snake_case() {
        let json = serde_json::to_string(&StepName::AlignTaskWithKg).expect("serialize");
        assert_eq!(json, "\"align_task_with_kg\"");
    }
}

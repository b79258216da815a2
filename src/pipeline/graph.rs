use super::StepName;

/// Static step DAG with one optional branch for repository integration.
///
/// The graph is resolved once per run (by `plan_run`) into a concrete linear
/// order; the runner never re-derives it.
#[derive(Debug, Clone, Copy)]
pub struct StepGraph {
    pub entry: StepName,
    pub core: &'static [StepName],
    pub repo_branch: &'static [StepName],
    pub plain_branch: &'static [StepName],
    pub tail: &'static [StepName],
}

pub const DEFAULT_GRAPH: StepGraph = StepGraph {
    entry: StepName::PlanRun,
    core: &[
        StepName::IngestSpec,
        StepName::DetectAndParseSpec,
        StepName::BuildSilverApiModel,
        StepName::EmbedSpecChunks,
        StepName::UnderstandTask,
        StepName::AlignTaskWithKg,
        StepName::PlanIntegrationFlow,
        StepName::AttachPoliciesAndPatterns,
    ],
    repo_branch: &[
        StepName::AttachRepoContext,
        StepName::GenerateCodeAndTests,
        StepName::AnalyzeRepoLayout,
        StepName::ApplyRepoIntegrationChanges,
    ],
    plain_branch: &[StepName::GenerateCodeAndTests],
    tail: &[
        StepName::ValidateIntegrationDesign,
        StepName::PersistResults,
        StepName::BuildReport,
    ],
};

impl Default for StepGraph {
    fn default() -> Self {
        DEFAULT_GRAPH
    }
}

impl StepGraph {
    /// Concrete step order, entry step first.
    pub fn resolve(&self, use_repo: bool) -> Vec<StepName> {
        let branch = if use_repo {
            self.repo_branch
        } else {
            self.plain_branch
        };
        let mut steps = Vec::with_capacity(1 + self.core.len() + branch.len() + self.tail.len());
        steps.push(self.entry);
        steps.extend_from_slice(self.core);
        steps.extend_from_slice(branch);
        steps.extend_from_slice(self.tail);
        steps
    }
}

use crate::codegen::{generate_artifacts, CodegenInput};
use crate::pipeline::{StepContext, StepError};
use crate::state::WorkflowState;

pub fn generate_code_and_tests(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(task) = state.integration_task.as_ref() else {
        return Err(StepError::MissingInput(
            "No integration_task for code generation".to_string(),
        ));
    };
    let input = CodegenInput {
        provider_code: &task.provider_code,
        task_slug: &task.task_slug,
        task_description: &task.description,
        spec_ref: state.spec_refs.first().map(String::as_str),
        source_system: state.source_system.as_ref(),
        brief: state.task_brief.as_ref(),
        nodes: &state.flow_nodes,
        bindings: &state.endpoint_bindings,
        policies: &state.policies,
    };
    let artifacts = generate_artifacts(&input)?;
    tracing::info!(artifacts = artifacts.len(), "generated code artifacts");
    state.code_artifacts = artifacts;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::model::{ArtifactKind, IntegrationTask};
    use crate::pipeline::steps::test_support::{collaborators, with_context};

    #[test]
    fn artifacts_follow_task_names() {
        let config = RuntimeConfig::default();
        let mut state = WorkflowState::new(vec!["spec.yaml".to_string()], "Do a thing");
        state.integration_task = Some(IntegrationTask {
            id: None,
            task_slug: "acme_do_a_thing".to_string(),
            provider_code: "acme".to_string(),
            description: "Do a thing".to_string(),
            workflow_template_code: None,
            constraints: Default::default(),
        });

        with_context(collaborators(&config), |ctx| generate_code_and_tests(&mut state, ctx))
            .expect("generate");

        let kinds: Vec<ArtifactKind> = state.code_artifacts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![ArtifactKind::Client, ArtifactKind::Flow, ArtifactKind::Test]
        );
        assert_eq!(state.code_artifacts[0].rel_path, "clients/acme_client.py");
        assert!(state.code_artifacts[0].content.contains("class AcmeClient(IntegrationHttpClient)"));
    }

    #[test]
    fn no_task_means_no_artifacts() {
        let config = RuntimeConfig::default();
        let mut state = WorkflowState::new(Vec::new(), "task");
        let err = with_context(collaborators(&config), |ctx| {
            generate_code_and_tests(&mut state, ctx)
        })
        .unwrap_err();
        assert!(matches!(err, StepError::MissingInput(_)));
        assert!(state.code_artifacts.is_empty());
    }
}

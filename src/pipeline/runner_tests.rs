use super::*;
use crate::config::RuntimeConfig;
use crate::pipeline::steps::test_support::{MapFetcher, MOCK_SPEC};
use crate::providers::Collaborators;
use crate::state::StateField;
use std::collections::BTreeSet;

fn providers(config: &RuntimeConfig) -> Collaborators {
    Collaborators::from_config(config).with_fetcher(MapFetcher::default().with(
        "mock_payments_openapi.yaml",
        MOCK_SPEC,
        "application/yaml",
    ))
}

fn runner<'a>(config: &'a RuntimeConfig, providers: &'a Collaborators) -> PipelineRunner<'a> {
    PipelineRunner::new(StepContext { config, providers }).with_contract_checks(true)
}

fn writes_endpoints(state: &mut WorkflowState, _ctx: &StepContext<'_>) -> Result<(), StepError> {
    state.endpoints.clear();
    state.chunks.push("sneaky".to_string());
    Ok(())
}

fn drops_errors(state: &mut WorkflowState, _ctx: &StepContext<'_>) -> Result<(), StepError> {
    state.errors.clear();
    Ok(())
}

fn faults(_state: &mut WorkflowState, _ctx: &StepContext<'_>) -> Result<(), StepError> {
    Err(anyhow!("invariant broken").into())
}

fn fails_softly(_state: &mut WorkflowState, _ctx: &StepContext<'_>) -> Result<(), StepError> {
    Err(StepError::Parse("bad content".to_string()))
}

fn fake(run: crate::pipeline::StepFn, writes: &'static [StateField]) -> StepDescriptor {
    StepDescriptor {
        name: StepName::ValidateIntegrationDesign,
        reads: &[],
        writes,
        run,
    }
}

#[test]
fn full_run_completes_every_planned_step_once() {
    let config = RuntimeConfig::default();
    let providers = providers(&config);
    let state = WorkflowState::new(
        vec!["mock_payments_openapi.yaml".to_string()],
        "Create checkout session",
    );

    let state = runner(&config, &providers).run(state).expect("run");

    assert_eq!(state.completed_steps, state.plan.steps);
    assert_eq!(state.completed_steps.len(), 13);
    let unique: BTreeSet<StepName> = state.completed_steps.iter().copied().collect();
    assert_eq!(unique.len(), state.completed_steps.len());
    assert!(state.errors.is_empty(), "{:?}", state.errors);
    assert!(state.run_id.is_some());
    assert!(state.report.is_some());
}

#[test]
fn recoverable_errors_are_recorded_and_the_run_continues() {
    let config = RuntimeConfig::default();
    let providers = providers(&config);
    let state = WorkflowState::new(vec!["missing.yaml".to_string()], "Create checkout session");

    let state = runner(&config, &providers).run(state).expect("run");

    assert_eq!(state.completed_steps.len(), state.plan.steps.len());
    assert_eq!(state.errors[0], "Failed to ingest spec: spec file not found: missing.yaml");
    assert!(state.run_id.is_some());
    let report = state.report.as_deref().expect("report");
    assert!(report.contains("spec file not found: missing.yaml"));
}

#[test]
fn soft_failure_still_marks_the_step_complete() {
    let config = RuntimeConfig::default();
    let providers = providers(&config);
    let descriptor = fake(fails_softly, &[]);

    let state = runner(&config, &providers)
        .run_descriptor(WorkflowState::default(), &descriptor)
        .expect("soft failure");

    assert_eq!(state.errors, vec!["bad content".to_string()]);
    assert_eq!(state.completed_steps, vec![StepName::ValidateIntegrationDesign]);
}

#[test]
fn faults_propagate_with_step_context() {
    let config = RuntimeConfig::default();
    let providers = providers(&config);
    let descriptor = fake(faults, &[]);

    let err = runner(&config, &providers)
        .run_descriptor(WorkflowState::default(), &descriptor)
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("step validate_integration_design faulted"), "{message}");
    assert!(message.contains("invariant broken"), "{message}");
}

#[test]
fn undeclared_writes_are_rejected_in_checked_mode() {
    let config = RuntimeConfig::default();
    let providers = providers(&config);
    let descriptor = fake(writes_endpoints, &[StateField::Endpoints]);

    let err = runner(&config, &providers)
        .run_descriptor(WorkflowState::default(), &descriptor)
        .unwrap_err();
    assert!(err.to_string().contains("mutated undeclared field Chunks"), "{err}");

    let unchecked = PipelineRunner::new(StepContext {
        config: &config,
        providers: &providers,
    })
    .with_contract_checks(false);
    let state = unchecked
        .run_descriptor(WorkflowState::default(), &descriptor)
        .expect("unchecked run");
    assert_eq!(state.chunks, vec!["sneaky".to_string()]);
}

#[test]
fn recorded_errors_cannot_be_removed() {
    let config = RuntimeConfig::default();
    let providers = providers(&config);
    let mut state = WorkflowState::default();
    state.record_error("earlier");

    let err = runner(&config, &providers)
        .run_descriptor(state, &fake(drops_errors, &[]))
        .unwrap_err();
    assert!(err.to_string().contains("removed or rewrote recorded errors"));
}

//! End-to-end runs of the library against the mock payments fixture.

use apiweave::api::{design_and_generate_integration, IntegrationRequest};
use apiweave::config::RuntimeConfig;
use apiweave::model::{integrity_violations, ArtifactKind};
use apiweave::pipeline::{run_pipeline, StepContext};
use apiweave::providers::Collaborators;
use apiweave::repo::ChangeKind;
use apiweave::state::{RunOptions, RunStatus, WorkflowState};
use std::fs;
use std::path::{Path, PathBuf};

const TASK: &str = "Create checkout session";

fn fixture_spec() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/mock_payments_openapi.yaml")
        .display()
        .to_string()
}

fn request(repo_root: Option<&Path>, dry_run: bool) -> IntegrationRequest {
    IntegrationRequest {
        spec_refs: vec![fixture_spec()],
        task_description: TASK.to_string(),
        repo_root: repo_root.map(Path::to_path_buf),
        options: RunOptions {
            dry_run,
            ..RunOptions::default()
        },
        ..IntegrationRequest::default()
    }
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                pending.push(path);
            } else {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

#[test]
fn checkout_scenario_builds_model_workflow_and_artifacts() {
    let config = RuntimeConfig::default();
    let providers = Collaborators::from_config(&config);
    let state = WorkflowState::new(vec![fixture_spec()], TASK);

    let state = run_pipeline(
        state,
        StepContext {
            config: &config,
            providers: &providers,
        },
    )
    .expect("pipeline");

    assert!(state.errors.is_empty(), "{:?}", state.errors);
    assert_eq!(state.plan.provider_code, "mock_payments");
    assert_eq!(state.plan.task_slug, "mock_payments_create_checkout_session");
    assert_eq!(state.endpoints.len(), 2);
    assert_eq!(state.endpoint_bindings.len(), 1);
    assert_eq!(state.endpoint_bindings[0].path, "/v1/checkout/sessions");
    assert_eq!(state.endpoint_bindings[0].method, "POST");
    assert_eq!(state.policies.len(), 5);
    assert!(integrity_violations(
        &state.flow_nodes,
        &state.flow_edges,
        &state.endpoint_bindings
    )
    .is_empty());
    for binding in &state.endpoint_bindings {
        assert!(binding.endpoint_index < state.endpoints.len());
    }

    let kinds: Vec<ArtifactKind> = state.code_artifacts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![ArtifactKind::Client, ArtifactKind::Flow, ArtifactKind::Test]
    );

    let report = state.report.as_deref().expect("report");
    for needle in [
        "Endpoints:",
        "/v1/checkout/sessions",
        "Workflow Steps:",
        "Policies",
        "auth",
        "retry",
    ] {
        assert!(report.contains(needle), "report missing {needle:?}");
    }
}

#[test]
fn repeated_runs_generate_identical_artifacts() {
    let config = RuntimeConfig::default();
    let providers = Collaborators::from_config(&config);

    let first = design_and_generate_integration(request(None, false), &config, &providers)
        .expect("first run");
    let second = design_and_generate_integration(request(None, false), &config, &providers)
        .expect("second run");

    assert_eq!(first.code_artifacts, second.code_artifacts);
    assert_eq!(first.task, second.task);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.status, RunStatus::Completed);
}

#[test]
fn repeated_runs_extract_the_same_models_and_vectors() {
    let config = RuntimeConfig::default();
    let providers = Collaborators::from_config(&config);
    let run = || {
        run_pipeline(
            WorkflowState::new(vec![fixture_spec()], TASK),
            StepContext {
                config: &config,
                providers: &providers,
            },
        )
        .expect("pipeline")
    };

    let first = run();
    let second = run();

    assert!(!first.endpoints.is_empty());
    assert_eq!(first.endpoints, second.endpoints);
    assert_eq!(first.parameters, second.parameters);
    assert_eq!(first.schemas, second.schemas);
    assert_eq!(first.schema_fields, second.schema_fields);
    assert_eq!(first.entities, second.entities);
    assert_eq!(first.relationships, second.relationships);
    assert_eq!(first.flow_nodes, second.flow_nodes);
    assert_eq!(first.flow_edges, second.flow_edges);
    assert_eq!(first.endpoint_bindings, second.endpoint_bindings);
    assert_eq!(first.chunks, second.chunks);
    assert!(!first.embeddings.is_empty());
    assert_eq!(first.embeddings, second.embeddings);
}

#[test]
fn dry_run_leaves_the_repository_untouched() {
    let config = RuntimeConfig::default();
    let providers = Collaborators::from_config(&config);
    let repo = tempfile::tempdir().expect("tempdir");

    let result =
        design_and_generate_integration(request(Some(repo.path()), true), &config, &providers)
            .expect("dry run");

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(files_under(repo.path()).is_empty());
    let changes = result.repo_changes.expect("planned changes");
    assert!(!changes.applied);
    assert_eq!(changes.files_created(), 3);
    assert!(result
        .report_markdown
        .contains("DRY RUN - Would apply the following changes:"));
}

#[test]
fn applying_twice_produces_the_same_tree() {
    let config = RuntimeConfig::default();
    let providers = Collaborators::from_config(&config);
    let repo = tempfile::tempdir().expect("tempdir");

    let first =
        design_and_generate_integration(request(Some(repo.path()), false), &config, &providers)
            .expect("first apply");
    let first_changes = first.repo_changes.expect("changes");
    assert!(first_changes.applied);
    assert!(first_changes
        .changes
        .iter()
        .all(|change| change.kind == ChangeKind::Create));
    let client = repo
        .path()
        .join("src/integrations/clients/mock_payments_client.py");
    let snapshot: Vec<(PathBuf, String)> = files_under(repo.path())
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).expect("read generated file");
            (path, content)
        })
        .collect();
    assert_eq!(snapshot.len(), 3);
    assert!(client.is_file());

    let second =
        design_and_generate_integration(request(Some(repo.path()), false), &config, &providers)
            .expect("second apply");
    let second_changes = second.repo_changes.expect("changes");
    assert!(second_changes
        .changes
        .iter()
        .all(|change| change.kind == ChangeKind::Update && change.is_unchanged()));
    let after: Vec<(PathBuf, String)> = files_under(repo.path())
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).expect("read generated file");
            (path, content)
        })
        .collect();
    assert_eq!(snapshot, after);
}

#[test]
fn missing_spec_still_returns_a_report() {
    let config = RuntimeConfig::default();
    let providers = Collaborators::from_config(&config);
    let request = IntegrationRequest {
        spec_refs: vec!["does/not/exist.yaml".to_string()],
        task_description: TASK.to_string(),
        ..IntegrationRequest::default()
    };

    let result = design_and_generate_integration(request, &config, &providers).expect("run");

    assert!(!result.run_id.is_empty());
    assert_eq!(result.status, RunStatus::CompletedWithErrors);
    assert!(result.errors[0].contains("not found"), "{:?}", result.errors);
    assert!(result.report_markdown.contains("not found"));
}

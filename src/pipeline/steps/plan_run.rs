//! Resolves provider code, task slug and the concrete step order.
use crate::pipeline::graph::DEFAULT_GRAPH;
use crate::pipeline::{StepContext, StepError};
use crate::state::{RunPlan, WorkflowState};
use crate::util::slugify;
use std::path::Path;

const KNOWN_PROVIDERS: &[&str] = &[
    "mock_payments",
    "stripe",
    "paypal",
    "adyen",
    "square",
    "twilio",
    "sendgrid",
    "shopify",
    "github",
    "slack",
];
const SPEC_SUFFIXES: &[&str] = &["openapi", "swagger", "spec", "api"];
const UNKNOWN_PROVIDER: &str = "unknown";

pub fn plan_run(state: &mut WorkflowState, _ctx: &StepContext<'_>) -> Result<(), StepError> {
    let primary_spec_ref = state.spec_refs.first().cloned();
    let provider_code = resolve_provider_code(
        state.options.override_provider_code.as_deref(),
        state.provider_code.as_deref(),
        primary_spec_ref.as_deref(),
    );
    let task_slug = resolve_task_slug(
        state.options.override_task_slug.as_deref(),
        &provider_code,
        &state.task_description,
    );
    let use_repo = state.options.repo_integration_enabled && state.repo_root.is_some();
    let steps = DEFAULT_GRAPH.resolve(use_repo);
    tracing::debug!(
        provider = %provider_code,
        task_slug = %task_slug,
        use_repo,
        steps = steps.len(),
        "planned run"
    );
    state.plan = RunPlan {
        provider_code,
        task_slug,
        primary_spec_ref,
        use_repo,
        steps,
        notes: Default::default(),
    };
    Ok(())
}

pub fn resolve_provider_code(
    override_code: Option<&str>,
    explicit: Option<&str>,
    spec_ref: Option<&str>,
) -> String {
    let given = override_code
        .or(explicit)
        .map(slugify)
        .filter(|code| !code.is_empty());
    if let Some(code) = given {
        return code;
    }
    let Some(spec_ref) = spec_ref else {
        return UNKNOWN_PROVIDER.to_string();
    };
    let lowered = slugify(spec_ref);
    if let Some(known) = KNOWN_PROVIDERS
        .iter()
        .find(|provider| lowered.contains(*provider))
    {
        return known.to_string();
    }
    provider_from_stem(spec_ref).unwrap_or_else(|| UNKNOWN_PROVIDER.to_string())
}

/// `specs/acme-openapi.yaml` -> `acme`.
fn provider_from_stem(spec_ref: &str) -> Option<String> {
    let trimmed = spec_ref.split(['?', '#']).next().unwrap_or(spec_ref);
    let stem = Path::new(trimmed).file_stem()?.to_string_lossy().into_owned();
    let mut words: Vec<String> = slugify(&stem).split('_').map(str::to_string).collect();
    while words.len() > 1
        && words
            .last()
            .is_some_and(|word| SPEC_SUFFIXES.contains(&word.as_str()) || is_version(word))
    {
        words.pop();
    }
    let code = words.join("_");
    if code.is_empty() || SPEC_SUFFIXES.contains(&code.as_str()) {
        None
    } else {
        Some(code)
    }
}

fn is_version(word: &str) -> bool {
    word.strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
}

pub fn resolve_task_slug(override_slug: Option<&str>, provider_code: &str, task: &str) -> String {
    if let Some(slug) = override_slug.map(slugify).filter(|slug| !slug.is_empty()) {
        return slug;
    }
    let task = slugify(task);
    if task.is_empty() {
        format!("{provider_code}_integration")
    } else {
        format!("{provider_code}_{task}")
    }
}

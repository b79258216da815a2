//! Markdown report: a read-only projection of the final workflow state.
use crate::pipeline::steps::repo::DRY_RUN_NOTE;
use crate::state::{RunStatus, WorkflowState};

const NONE_MARKER: &str = "*(none)*";

pub fn render_report(state: &WorkflowState) -> String {
    let mut out = String::new();
    let title = if state.plan.task_slug.is_empty() {
        "integration"
    } else {
        state.plan.task_slug.as_str()
    };
    out.push_str(&format!("# Integration Report: {title}\n"));
    render_summary(&mut out, state);
    render_endpoints(&mut out, state);
    render_schemas(&mut out, state);
    render_workflow(&mut out, state);
    render_policies(&mut out, state);
    render_artifacts(&mut out, state);
    render_repo_changes(&mut out, state);
    render_pipeline(&mut out, state);
    render_errors(&mut out, state);
    out
}

fn render_summary(out: &mut String, state: &WorkflowState) {
    let status = state
        .persist_summary
        .as_ref()
        .map(|summary| summary.status)
        .unwrap_or_else(|| RunStatus::from_error_count(state.errors.len()));
    out.push_str("\n## Summary\n\n");
    out.push_str(&format!("- Provider: `{}`\n", state.plan.provider_code));
    if let Some(source) = &state.source_system {
        match &source.base_url {
            Some(url) => out.push_str(&format!("- Source system: {} ({url})\n", source.name)),
            None => out.push_str(&format!("- Source system: {}\n", source.name)),
        }
    }
    out.push_str(&format!("- Task: {}\n", state.task_description.trim()));
    if let Some(spec_ref) = &state.plan.primary_spec_ref {
        out.push_str(&format!("- Spec: `{spec_ref}`\n"));
    }
    out.push_str(&format!(
        "- Run ID: {}\n",
        state.run_id.as_deref().unwrap_or("(not persisted)")
    ));
    out.push_str(&format!("- Status: {status}\n"));
    out.push_str(&format!(
        "- Dry run: {}\n",
        if state.options.dry_run { "yes" } else { "no" }
    ));
}

fn render_endpoints(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Endpoints\n\nEndpoints:\n");
    if state.endpoints.is_empty() {
        out.push_str(&format!("{NONE_MARKER}\n"));
        return;
    }
    for endpoint in &state.endpoints {
        out.push_str(&format!("- `{}`", endpoint.signature()));
        if let Some(operation_id) = &endpoint.operation_id {
            out.push_str(&format!(" ({operation_id})"));
        }
        if let Some(summary) = &endpoint.summary {
            out.push_str(&format!(": {summary}"));
        }
        if endpoint.auth_required {
            out.push_str(" [auth]");
        }
        out.push('\n');
    }
}

fn render_schemas(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Schemas & Entities\n\n");
    out.push_str(&format!(
        "- Schemas: {} ({} fields)\n",
        state.schemas.len(),
        state.schema_fields.len()
    ));
    let entities: Vec<&str> = state
        .entities
        .iter()
        .map(|entity| entity.name.as_str())
        .collect();
    out.push_str(&format!("- Entities: {}\n", join_or_none(&entities)));
    if !state.relationships.is_empty() {
        out.push_str("- Relationships:\n");
        for rel in &state.relationships {
            out.push_str(&format!(
                "  - {}.{} -> {} ({})\n",
                rel.from_schema, rel.via_field, rel.to_schema, rel.cardinality
            ));
        }
    }
    if !state.events.is_empty() {
        let events: Vec<&str> = state.events.iter().map(|event| event.name.as_str()).collect();
        out.push_str(&format!("- Events: {}\n", events.join(", ")));
    }
}

fn render_workflow(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Workflow\n\n");
    if let Some(task) = &state.integration_task {
        out.push_str(&format!("- Integration task: `{}`\n", task.task_slug));
        if let Some(template) = &task.workflow_template_code {
            out.push_str(&format!("- Template: `{template}`\n"));
        }
        out.push('\n');
    }
    out.push_str("Workflow Steps:\n");
    if state.flow_nodes.is_empty() {
        out.push_str(&format!("{NONE_MARKER}\n"));
    }
    let mut nodes: Vec<_> = state.flow_nodes.iter().collect();
    nodes.sort_by_key(|node| node.position);
    for (number, node) in nodes.iter().enumerate() {
        out.push_str(&format!(
            "{}. **{}** (`{}`, {})\n",
            number + 1,
            node.label,
            node.node_key,
            node.node_type
        ));
    }
    if !state.endpoint_bindings.is_empty() {
        out.push_str("\nBindings:\n");
        for binding in &state.endpoint_bindings {
            out.push_str(&format!(
                "- `{}` -> `{} {}`",
                binding.flow_node_key, binding.method, binding.path
            ));
            if let Some(operation_id) = &binding.operation_id {
                out.push_str(&format!(" ({operation_id})"));
            }
            out.push('\n');
        }
    }
}

fn render_policies(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Policies\n\n");
    if state.policies.is_empty() {
        out.push_str(&format!("{NONE_MARKER}\n"));
        return;
    }
    for policy in &state.policies {
        let scope = match &policy.scope_ref {
            Some(scope_ref) => format!("{} `{scope_ref}`", policy.scope),
            None => policy.scope.clone(),
        };
        out.push_str(&format!("- **{}** on {scope}: `{}`\n", policy.kind, policy.config));
    }
}

fn render_artifacts(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Code Artifacts\n\n");
    if state.code_artifacts.is_empty() {
        out.push_str(&format!("{NONE_MARKER}\n"));
        return;
    }
    for artifact in &state.code_artifacts {
        out.push_str(&format!(
            "- {} `{}` ({}, {} lines)\n",
            artifact.kind,
            artifact.rel_path,
            artifact.language,
            artifact.content.lines().count()
        ));
    }
}

fn render_repo_changes(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Repository Changes\n\n");
    let Some(changes) = &state.repo_changes else {
        if state.plan.use_repo {
            out.push_str(&format!("{NONE_MARKER}\n"));
        } else {
            out.push_str("Repository integration not requested.\n");
        }
        return;
    };
    out.push_str(&format!("- Repository: `{}`\n", changes.repo_root.display()));
    if let Some(profile) = &state.repo_profile {
        out.push_str(&format!("- Profile: `{}`\n", profile.name));
    }
    out.push_str(&format!(
        "- Files created: {}, updated: {}\n",
        changes.files_created(),
        changes.files_updated()
    ));
    match state.plan.notes.get(DRY_RUN_NOTE).and_then(|note| note.as_str()) {
        Some(note) => out.push_str(&format!("\n```\n{note}\n```\n")),
        None => {
            out.push_str(&format!(
                "- Applied: {}\n",
                if changes.applied { "yes" } else { "no" }
            ));
            for line in changes.summary_lines() {
                out.push_str(&format!("  - {line}\n"));
            }
        }
    }
    if let Some(profile) = &state.repo_profile {
        if !profile.integration_hooks.is_empty() {
            out.push_str("\nIntegration hooks left untouched:\n");
            for (hook, path) in &profile.integration_hooks {
                out.push_str(&format!("- {hook}: `{path}`\n"));
            }
        }
    }
}

fn render_pipeline(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Pipeline\n\n");
    out.push_str(&format!(
        "Completed steps ({}/{}):\n",
        state.completed_steps.len(),
        state.plan.steps.len()
    ));
    for step in &state.completed_steps {
        out.push_str(&format!("- {step}\n"));
    }
}

fn render_errors(out: &mut String, state: &WorkflowState) {
    out.push_str("\n## Errors\n\n");
    if state.errors.is_empty() {
        out.push_str(&format!("{NONE_MARKER}\n"));
        return;
    }
    for error in &state.errors {
        out.push_str(&format!("- {error}\n"));
    }
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        NONE_MARKER.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

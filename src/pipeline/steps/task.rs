//! Gold-layer steps: task understanding, flow alignment and endpoint binding.
use crate::model::{
    EndpointBinding, FlowGraph, FlowNode, FlowNodeType, IntegrationTask, TargetOperation,
    WorkflowTemplate,
};
use crate::pipeline::{StepContext, StepError};
use crate::providers::UnderstandRequest;
use crate::state::WorkflowState;
use std::collections::BTreeMap;

/// Fixed flow skeleton: key, type, label, description.
const FLOW_SKELETON: [(&str, FlowNodeType, &str, &str); 4] = [
    (
        "validate_input",
        FlowNodeType::Validation,
        "Validate input",
        "Check that every required input is present",
    ),
    (
        "call_api",
        FlowNodeType::ApiCall,
        "Call API",
        "Invoke the bound provider endpoint",
    ),
    (
        "transform_response",
        FlowNodeType::Transform,
        "Transform response",
        "Map provider response fields onto the expected outputs",
    ),
    (
        "return_result",
        FlowNodeType::Output,
        "Return result",
        "Return the integration result to the caller",
    ),
];

pub fn understand_task(state: &mut WorkflowState, ctx: &StepContext<'_>) -> Result<(), StepError> {
    if state.task_description.trim().is_empty() {
        return Err(StepError::MissingInput(
            "No task_description provided".to_string(),
        ));
    }
    let lm = ctx.config.lm_settings(&state.options);
    let request = UnderstandRequest {
        task_description: &state.task_description,
        provider_code: &state.plan.provider_code,
        endpoints: &state.endpoints,
        parameters: &state.parameters,
        lm: &lm,
    };
    let brief = ctx
        .providers
        .understander
        .understand(&request)
        .map_err(|err| StepError::Validation(format!("Task understanding failed: {err:#}")))?;
    tracing::info!(
        category = %brief.category,
        targets = brief.target_operations.len(),
        "understood task"
    );

    if state.workflow_template.is_none() {
        let provider = &state.plan.provider_code;
        state.workflow_template = Some(WorkflowTemplate {
            id: None,
            code: format!("{provider}_{}_workflow", brief.category),
            name: format!("Workflow for {provider} {}", brief.category),
            description: Some(state.task_description.clone()),
        });
    }
    let matched = !brief.target_operations.is_empty();
    state.task_brief = Some(brief);
    if !matched {
        return Err(StepError::Validation(
            "No endpoints matched the task description".to_string(),
        ));
    }
    Ok(())
}

pub fn align_task_with_kg(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(template) = state.workflow_template.as_ref() else {
        return Err(StepError::MissingInput(
            "No workflow_template from understand_task".to_string(),
        ));
    };
    let task = IntegrationTask {
        id: None,
        task_slug: state.plan.task_slug.clone(),
        provider_code: state.plan.provider_code.clone(),
        description: state.task_description.clone(),
        workflow_template_code: Some(template.code.clone()),
        constraints: state.task_brief.clone().unwrap_or_default(),
    };

    let nodes = FLOW_SKELETON
        .iter()
        .enumerate()
        .map(|(position, (key, node_type, label, description))| FlowNode {
            id: None,
            node_key: key.to_string(),
            node_type: *node_type,
            label: label.to_string(),
            description: description.to_string(),
            position,
        })
        .collect();
    let graph = FlowGraph::linear(nodes)
        .map_err(|err| StepError::Validation(format!("Invalid workflow graph: {err}")))?;
    let (nodes, edges) = graph.into_parts();

    tracing::debug!(task_slug = %task.task_slug, nodes = nodes.len(), "aligned task");
    state.integration_task = Some(task);
    state.flow_nodes = nodes;
    state.flow_edges = edges;
    Ok(())
}

pub fn plan_integration_flow(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    if state.flow_nodes.is_empty() {
        return Err(StepError::MissingInput(
            "No workflow_nodes from align_task_with_kg".to_string(),
        ));
    }
    let Some(api_node) = state
        .flow_nodes
        .iter()
        .find(|node| node.node_type == FlowNodeType::ApiCall)
    else {
        return Err(StepError::Validation(
            "No api_call node in workflow".to_string(),
        ));
    };
    let Some(brief) = state
        .task_brief
        .as_ref()
        .filter(|brief| !brief.target_operations.is_empty())
    else {
        return Err(StepError::MissingInput(
            "No target operations from understand_task".to_string(),
        ));
    };

    let request_mapping: BTreeMap<String, String> = brief
        .required_inputs
        .iter()
        .map(|field| (field.name.clone(), format!("$.input.{}", field.name)))
        .collect();
    let response_mapping: BTreeMap<String, String> = brief
        .expected_outputs
        .iter()
        .map(|field| (field.name.clone(), response_source(&field.name)))
        .collect();

    let mut bindings: Vec<EndpointBinding> = Vec::new();
    let mut unmatched = Vec::new();
    for target in &brief.target_operations {
        let Some(endpoint_index) = find_endpoint(state, target) else {
            unmatched.push(format!(
                "Target operation {} {} not found among endpoints",
                target.method, target.path
            ));
            continue;
        };
        if bindings
            .iter()
            .any(|binding| binding.endpoint_index == endpoint_index)
        {
            continue;
        }
        let endpoint = &state.endpoints[endpoint_index];
        bindings.push(EndpointBinding {
            id: None,
            flow_node_key: api_node.node_key.clone(),
            endpoint_index,
            operation_id: endpoint.operation_id.clone(),
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
            request_mapping: request_mapping.clone(),
            response_mapping: response_mapping.clone(),
        });
    }

    tracing::debug!(bindings = bindings.len(), "planned endpoint bindings");
    state.endpoint_bindings = bindings;
    for message in unmatched {
        state.record_error(message);
    }
    Ok(())
}

/// Identifier-like outputs come from the response `id`.
fn response_source(name: &str) -> String {
    if name == "id" || name.ends_with("_id") {
        "$.response.id".to_string()
    } else {
        format!("$.response.{name}")
    }
}

/// Match by operation id, else by method and path.
fn find_endpoint(state: &WorkflowState, target: &TargetOperation) -> Option<usize> {
    if let Some(operation_id) = target.operation_id.as_deref() {
        if let Some(index) = state
            .endpoints
            .iter()
            .position(|endpoint| endpoint.operation_id.as_deref() == Some(operation_id))
        {
            return Some(index);
        }
    }
    state.endpoints.iter().position(|endpoint| {
        endpoint.method.eq_ignore_ascii_case(&target.method) && endpoint.path == target.path
    })
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

use crate::model::{Policy, PolicyKind};
use crate::pipeline::{StepContext, StepError};
use crate::state::WorkflowState;
use serde_json::{json, Value};

const POLICY_SCOPE: &str = "flow_node";

/// Default configuration attached for each policy kind.
pub fn default_config(kind: PolicyKind) -> Value {
    match kind {
        PolicyKind::Auth => json!({
            "type": "bearer",
            "header": "Authorization",
            "prefix": "Bearer",
        }),
        PolicyKind::Retry => json!({
            "max_attempts": 3,
            "backoff_type": "exponential",
            "initial_delay_ms": 100,
            "max_delay_ms": 5000,
            "retryable_status_codes": [429, 500, 502, 503, 504],
        }),
        PolicyKind::Logging => json!({
            "log_request": true,
            "log_response": true,
            "log_headers": true,
            "redact_fields": ["Authorization", "api_key"],
        }),
        PolicyKind::Idempotency => json!({
            "header_name": "Idempotency-Key",
            "key_generator": "uuid4",
        }),
        PolicyKind::RateLimit => json!({
            "requests_per_second": 10,
            "burst_size": 20,
        }),
    }
}

/// One policy per recognized kind for every endpoint binding.
pub fn attach_policies_and_patterns(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    if state.endpoint_bindings.is_empty() {
        return Err(StepError::MissingInput(
            "No endpoint_bindings to attach policies to".to_string(),
        ));
    }
    let policies: Vec<Policy> = state
        .endpoint_bindings
        .iter()
        .flat_map(|binding| {
            PolicyKind::ALL.into_iter().map(move |kind| Policy {
                id: None,
                kind,
                scope: POLICY_SCOPE.to_string(),
                scope_ref: Some(binding.flow_node_key.clone()),
                config: default_config(kind),
            })
        })
        .collect();
    tracing::debug!(policies = policies.len(), "attached policies");
    state.policies = policies;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::model::EndpointBinding;
    use crate::pipeline::steps::test_support::{collaborators, with_context};
    use std::collections::BTreeMap;

    fn binding(node_key: &str) -> EndpointBinding {
        EndpointBinding {
            id: None,
            flow_node_key: node_key.to_string(),
            endpoint_index: 0,
            operation_id: None,
            method: "POST".to_string(),
            path: "/x".to_string(),
            request_mapping: BTreeMap::new(),
            response_mapping: BTreeMap::new(),
        }
    }

    #[test]
    fn five_policies_per_binding() {
        let config = RuntimeConfig::default();
        let mut state = WorkflowState::new(Vec::new(), "task");
        state.endpoint_bindings = vec![binding("call_api"), binding("call_other")];
        with_context(collaborators(&config), |ctx| {
            attach_policies_and_patterns(&mut state, ctx)
        })
        .expect("attach");

        assert_eq!(state.policies.len(), 10);
        let kinds: Vec<&str> = state.policies[..5]
            .iter()
            .map(|policy| policy.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["auth", "retry", "logging", "idempotency", "rate_limit"]);
        assert!(state.policies[5..]
            .iter()
            .all(|policy| policy.scope_ref.as_deref() == Some("call_other")));
        assert!(state.policies.iter().all(|policy| policy.scope == "flow_node"));
    }

    #[test]
    fn retry_defaults() {
        let retry = default_config(PolicyKind::Retry);
        assert_eq!(retry["max_attempts"], 3);
        assert_eq!(retry["backoff_type"], "exponential");
        assert_eq!(retry["retryable_status_codes"], json!([429, 500, 502, 503, 504]));
        assert_eq!(
            default_config(PolicyKind::Idempotency)["header_name"],
            "Idempotency-Key"
        );
    }
}

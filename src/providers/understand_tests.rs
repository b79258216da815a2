use super::*;

fn endpoint(method: &str, path: &str, operation_id: &str) -> Endpoint {
    Endpoint {
        id: None,
        path: path.to_string(),
        method: method.to_string(),
        operation_id: Some(operation_id.to_string()),
        summary: None,
        description: None,
        auth_required: true,
    }
}

fn checkout_endpoints() -> Vec<Endpoint> {
    vec![
        endpoint("POST", "/v1/checkout/sessions", "createCheckoutSession"),
        endpoint("GET", "/v1/checkout/sessions/{id}", "getCheckoutSession"),
        endpoint("GET", "/v1/customers", "listCustomers"),
    ]
}

fn id_parameter() -> EndpointParameter {
    EndpointParameter {
        id: None,
        endpoint_index: 1,
        name: "id".to_string(),
        location: "path".to_string(),
        required: true,
        schema_type: "string".to_string(),
        description: None,
    }
}

fn settings() -> LmSettings {
    LmSettings {
        command: None,
        model: "default".to_string(),
        max_tokens: 1500,
    }
}

fn request<'a>(
    task: &'a str,
    endpoints: &'a [Endpoint],
    parameters: &'a [EndpointParameter],
    lm: &'a LmSettings,
) -> UnderstandRequest<'a> {
    UnderstandRequest {
        task_description: task,
        provider_code: "mock_payments",
        endpoints,
        parameters,
        lm,
    }
}

#[test]
fn create_intent_selects_only_the_post_operation() {
    let endpoints = checkout_endpoints();
    let lm = settings();
    let brief = KeywordTaskUnderstander
        .understand(&request("Create checkout session", &endpoints, &[], &lm))
        .expect("understand");

    assert_eq!(brief.category, "checkout");
    assert_eq!(brief.target_operations.len(), 1);
    assert_eq!(brief.target_operations[0].method, "POST");
    assert_eq!(
        brief.target_operations[0].operation_id.as_deref(),
        Some("createCheckoutSession")
    );
    let inputs: Vec<&str> = brief
        .required_inputs
        .iter()
        .map(|field| field.name.as_str())
        .collect();
    assert_eq!(inputs, vec!["amount", "currency", "success_url", "cancel_url"]);
    assert_eq!(brief.expected_outputs.len(), 2);
}

#[test]
fn generic_tasks_take_required_path_parameters_as_inputs() {
    let endpoints = checkout_endpoints();
    let parameters = vec![id_parameter()];
    let lm = settings();
    let brief = KeywordTaskUnderstander
        .understand(&request("Retrieve a session", &endpoints, &parameters, &lm))
        .expect("understand");

    assert_eq!(brief.category, "generic");
    assert_eq!(brief.target_operations.len(), 1);
    assert_eq!(brief.target_operations[0].path, "/v1/checkout/sessions/{id}");
    assert_eq!(brief.required_inputs, vec![TaskField::new("id", "string")]);
    assert_eq!(brief.expected_outputs, vec![TaskField::new("id", "string")]);
}

#[test]
fn unmatched_tasks_produce_an_empty_brief() {
    let endpoints = checkout_endpoints();
    let lm = settings();
    let brief = KeywordTaskUnderstander
        .understand(&request("Ship a parcel", &endpoints, &[], &lm))
        .expect("understand");
    assert!(brief.target_operations.is_empty());
    assert!(brief.required_inputs.is_empty());
    assert_eq!(brief.task_description, "Ship a parcel");
}

#[test]
fn command_understander_uses_lm_response() {
    let endpoints = checkout_endpoints();
    let lm = settings();
    let command = r#"sh -c 'cat >/dev/null; echo "Answer: {\"category\":\"customer\",\"target_operations\":[{\"operation_id\":\"listCustomers\",\"method\":\"GET\",\"path\":\"/v1/customers\",\"summary\":null}]}"'"#;
    let brief = CommandTaskUnderstander::new(command)
        .understand(&request("List customers", &endpoints, &[], &lm))
        .expect("understand");
    assert_eq!(brief.category, "customer");
    assert_eq!(brief.target_operations[0].path, "/v1/customers");
    assert_eq!(brief.task_description, "List customers");
}

#[test]
fn command_understander_falls_back_on_failure() {
    let endpoints = checkout_endpoints();
    let lm = settings();
    let brief = CommandTaskUnderstander::new("false")
        .understand(&request("Create checkout session", &endpoints, &[], &lm))
        .expect("fallback understand");
    assert_eq!(brief.target_operations.len(), 1);
    assert_eq!(brief.category, "checkout");
}

#[test]
fn command_understander_rejects_unknown_operations() {
    let endpoints = checkout_endpoints();
    let lm = settings();
    let command = r#"sh -c 'cat >/dev/null; echo "{\"target_operations\":[{\"operation_id\":null,\"method\":\"GET\",\"path\":\"/nope\",\"summary\":null}]}"'"#;
    let understander = CommandTaskUnderstander::new(command);
    let err = understander
        .ask(&request("Create checkout session", &endpoints, &[], &lm))
        .expect_err("unknown path");
    assert!(err.to_string().contains("/nope"));
}

#[test]
fn extract_json_strips_fences() {
    assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(extract_json("  nothing "), "nothing");
}

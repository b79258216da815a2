//! Python integration code generated from the Gold model.
//!
//! Produces one client, one flow and one test module per run. Output depends
//! only on the inputs, so regenerating the same run yields identical files.
use crate::model::{
    ArtifactKind, CodeArtifact, EndpointBinding, FlowNode, FlowNodeType, Policy, SourceSystem,
    TaskBrief, TaskField,
};
use crate::templates::{CLIENT_PY_TMPL, FLOW_PY_TMPL, TEST_PY_TMPL};
use crate::util::{pascal_case, slugify, snake_case};
use anyhow::{anyhow, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

const LANGUAGE: &str = "python";
const BODY_METHODS: &[&str] = &["POST", "PUT", "PATCH"];

pub struct CodegenInput<'a> {
    pub provider_code: &'a str,
    pub task_slug: &'a str,
    pub task_description: &'a str,
    pub spec_ref: Option<&'a str>,
    pub source_system: Option<&'a SourceSystem>,
    pub brief: Option<&'a TaskBrief>,
    pub nodes: &'a [FlowNode],
    pub bindings: &'a [EndpointBinding],
    pub policies: &'a [Policy],
}

/// Client, flow and test artifacts, in that order.
pub fn generate_artifacts(input: &CodegenInput<'_>) -> Result<Vec<CodeArtifact>> {
    let provider = snake_case(input.provider_code);
    let task_slug = snake_case(input.task_slug);
    if provider.is_empty() || task_slug.is_empty() {
        return Err(anyhow!(
            "provider code and task slug are required for code generation"
        ));
    }
    let names = Names {
        class_name: pascal_case(&provider),
        provider,
        task_slug,
    };

    let client = render_client(input, &names)?;
    let flow = render_flow(input, &names)?;
    let test = render_test(input, &names)?;
    Ok(vec![
        artifact(
            ArtifactKind::Client,
            format!("{}_client", names.provider),
            "clients",
            client,
        ),
        artifact(
            ArtifactKind::Flow,
            format!("{}_flow", names.task_slug),
            "flows",
            flow,
        ),
        artifact(
            ArtifactKind::Test,
            format!("test_{}", names.task_slug),
            "tests",
            test,
        ),
    ])
}

/// Client method name for a binding: the snake-cased operation id, else
/// method plus path words.
pub fn binding_method_name(binding: &EndpointBinding) -> String {
    match binding.operation_id.as_deref().map(snake_case) {
        Some(name) if !name.is_empty() => name,
        _ => slugify(&format!("{} {}", binding.method, binding.path)),
    }
}

struct Names {
    provider: String,
    task_slug: String,
    class_name: String,
}

fn artifact(kind: ArtifactKind, module_name: String, dir: &str, content: String) -> CodeArtifact {
    CodeArtifact {
        kind,
        language: LANGUAGE.to_string(),
        rel_path: format!("{dir}/{module_name}.py"),
        module_name,
        content,
    }
}

fn render_client(input: &CodegenInput<'_>, names: &Names) -> Result<String> {
    let base_url = input
        .source_system
        .and_then(|system| system.base_url.as_deref())
        .map(py_str)
        .unwrap_or_else(|| "None".to_string());
    let mut methods = String::new();
    let mut seen = BTreeSet::new();
    for binding in input.bindings {
        let name = binding_method_name(binding);
        if seen.insert(name.clone()) {
            methods.push('\n');
            methods.push_str(&render_client_method(&name, binding));
        }
    }
    fill(
        CLIENT_PY_TMPL,
        &[
            ("provider", names.provider.clone()),
            ("class_name", names.class_name.clone()),
            ("task_slug", names.task_slug.clone()),
            ("spec_ref", input.spec_ref.unwrap_or("an inline spec").to_string()),
            ("base_url", base_url),
            ("policies", render_policies(input)),
            ("methods", methods.trim_end().to_string()),
        ],
    )
}

fn render_client_method(name: &str, binding: &EndpointBinding) -> String {
    let method = binding.method.to_ascii_uppercase();
    let path_params = path_params(&binding.path);
    let data_arg = if BODY_METHODS.contains(&method.as_str()) {
        "payload"
    } else {
        "params"
    };
    let data_kw = if data_arg == "payload" { "json" } else { "params" };

    let mut args = vec!["self".to_string()];
    args.extend(path_params.iter().map(|param| format!("{param}: str")));
    args.push(format!("{data_arg}: dict | None = None"));

    let path = if path_params.is_empty() {
        py_str(&binding.path)
    } else {
        let templated = path_param_re().replace_all(&binding.path, |caps: &Captures| {
            format!("{{{}}}", snake_case(&caps[1]))
        });
        format!("f{}", py_str(&templated))
    };
    format!(
        "    def {name}({}) -> dict:\n        \"\"\"{method} {}\"\"\"\n        return self.request({}, {path}, {data_kw}={data_arg})\n",
        args.join(", "),
        binding.path,
        py_str(&method),
    )
}

/// Policies of the bound nodes keyed by kind; first binding wins per kind.
fn render_policies(input: &CodegenInput<'_>) -> String {
    let bound: BTreeSet<&str> = input
        .bindings
        .iter()
        .map(|binding| binding.flow_node_key.as_str())
        .collect();
    let mut by_kind: BTreeMap<&str, &Value> = BTreeMap::new();
    for policy in input.policies {
        let applies = match policy.scope_ref.as_deref() {
            Some(scope_ref) => bound.contains(scope_ref),
            None => true,
        };
        if applies {
            by_kind.entry(policy.kind.as_str()).or_insert(&policy.config);
        }
    }
    if by_kind.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{\n");
    for (kind, config) in by_kind {
        out.push_str(&format!("        {}: {},\n", py_str(kind), py_literal(config)));
    }
    out.push_str("    }");
    out
}

fn render_flow(input: &CodegenInput<'_>, names: &Names) -> Result<String> {
    let mut nodes: Vec<&FlowNode> = input.nodes.iter().collect();
    nodes.sort_by_key(|node| node.position);

    let mut functions = Vec::new();
    let mut calls = Vec::new();
    for node in &nodes {
        let function = snake_case(&node.node_key);
        let (definition, call) = match node.node_type {
            FlowNodeType::Validation => (
                format!(
                    "def {function}(payload: dict) -> dict:\n    missing = [name for name in REQUIRED_INPUTS if payload.get(name) is None]\n    if missing:\n        raise ValueError(\"missing required inputs: \" + \", \".join(missing))\n    return payload\n"
                ),
                format!("    data = {function}(data)"),
            ),
            FlowNodeType::ApiCall => (
                render_api_call(&function, node, input, names),
                format!("    data = {function}(client, data)"),
            ),
            FlowNodeType::Transform => (
                render_transform(&function, input.bindings),
                format!("    data = {function}(data)"),
            ),
            FlowNodeType::Output => (
                format!(
                    "def {function}(result: dict) -> dict:\n    if not EXPECTED_OUTPUTS:\n        return result\n    return {{name: result.get(name) for name in EXPECTED_OUTPUTS}}\n"
                ),
                format!("    data = {function}(data)"),
            ),
        };
        functions.push(definition);
        calls.push(call);
    }

    let description = input.task_description.trim().replace("\"\"\"", "'''");
    let description = if description.is_empty() {
        format!("Integration flow for {}.", names.provider)
    } else {
        description
    };
    fill(
        FLOW_PY_TMPL,
        &[
            ("task_description", description),
            ("task_slug", names.task_slug.clone()),
            ("provider", names.provider.clone()),
            ("class_name", names.class_name.clone()),
            ("required_inputs", field_names(input.brief, |brief| brief.required_inputs.as_slice())),
            ("expected_outputs", field_names(input.brief, |brief| brief.expected_outputs.as_slice())),
            ("node_functions", functions.join("\n\n")),
            ("node_calls", calls.join("\n")),
        ],
    )
}

fn render_api_call(
    function: &str,
    node: &FlowNode,
    input: &CodegenInput<'_>,
    names: &Names,
) -> String {
    let signature = format!(
        "def {function}(client: {}Client, payload: dict) -> dict:\n",
        names.class_name
    );
    let Some(binding) = input
        .bindings
        .iter()
        .find(|binding| binding.flow_node_key == node.node_key)
    else {
        return format!(
            "{signature}    raise NotImplementedError({})\n",
            py_str(&format!("no endpoint bound to {}", node.node_key))
        );
    };

    let path_params = path_params(&binding.path);
    let mut body = String::from("    request = {\n");
    for (name, source) in &binding.request_mapping {
        if path_params.contains(&snake_case(name)) {
            continue;
        }
        let key = source.rsplit('.').next().unwrap_or(name);
        body.push_str(&format!(
            "        {}: payload.get({}),\n",
            py_str(name),
            py_str(key)
        ));
    }
    body.push_str("    }\n");
    let mut args: Vec<String> = path_params
        .iter()
        .map(|param| format!("payload.get({})", py_str(param)))
        .collect();
    args.push("request".to_string());
    format!(
        "{signature}{body}    return client.{}({})\n",
        binding_method_name(binding),
        args.join(", ")
    )
}

fn render_transform(function: &str, bindings: &[EndpointBinding]) -> String {
    let mut mapping: BTreeMap<&str, &str> = BTreeMap::new();
    for binding in bindings {
        for (name, source) in &binding.response_mapping {
            mapping
                .entry(name.as_str())
                .or_insert_with(|| response_key(source, name));
        }
    }
    if mapping.is_empty() {
        return format!("def {function}(response: dict) -> dict:\n    return dict(response)\n");
    }
    let mut out = format!("def {function}(response: dict) -> dict:\n    return {{\n");
    for (name, key) in mapping {
        out.push_str(&format!(
            "        {}: response.get({}),\n",
            py_str(name),
            py_str(key)
        ));
    }
    out.push_str("    }\n");
    out
}

fn render_test(input: &CodegenInput<'_>, names: &Names) -> Result<String> {
    let mut fake_methods = String::new();
    let mut seen = BTreeSet::new();
    for binding in input.bindings {
        let name = binding_method_name(binding);
        if seen.insert(name.clone()) {
            fake_methods.push_str(&format!(
                "\n    def {name}(self, *args):\n        self.calls.append(({}, args))\n        return self.response\n",
                py_str(&name)
            ));
        }
    }

    let required: &[TaskField] = input
        .brief
        .map(|brief| brief.required_inputs.as_slice())
        .unwrap_or_default();
    let sample_payload = py_dict(
        required
            .iter()
            .map(|field| (field.name.clone(), sample_value(field))),
    );

    let mut response = BTreeMap::new();
    let mut expected = BTreeMap::new();
    for binding in input.bindings {
        for (name, source) in &binding.response_mapping {
            let key = response_key(source, name);
            let value = format!("sample_{}", snake_case(key));
            response.entry(key.to_string()).or_insert_with(|| py_str(&value));
            expected.entry(name.clone()).or_insert(value);
        }
    }
    let outputs: BTreeSet<&str> = input
        .brief
        .map(|brief| {
            brief
                .expected_outputs
                .iter()
                .map(|field| field.name.as_str())
                .collect()
        })
        .unwrap_or_default();
    let mut assertions: Vec<String> = expected
        .iter()
        .filter(|(name, _)| outputs.is_empty() || outputs.contains(name.as_str()))
        .map(|(name, value)| format!("    assert result[{}] == {}", py_str(name), py_str(value)))
        .collect();
    if assertions.is_empty() {
        assertions.push("    assert isinstance(result, dict)".to_string());
    }
    if !seen.is_empty() {
        assertions.push("    assert len(client.calls) == 1".to_string());
    }

    fill(
        TEST_PY_TMPL,
        &[
            ("task_slug", names.task_slug.clone()),
            ("fake_methods", fake_methods),
            ("sample_payload", sample_payload),
            ("sample_response", py_dict(response.into_iter())),
            ("assertions", assertions.join("\n")),
        ],
    )
}

fn response_key<'a>(source: &'a str, fallback: &'a str) -> &'a str {
    source
        .strip_prefix("$.response.")
        .or_else(|| source.rsplit('.').next())
        .filter(|key| !key.is_empty() && *key != "$")
        .unwrap_or(fallback)
}

fn sample_value(field: &TaskField) -> String {
    match field.field_type.as_str() {
        "integer" => "1000".to_string(),
        "number" => "10.5".to_string(),
        "boolean" => "True".to_string(),
        "array" => "[]".to_string(),
        "object" => "{}".to_string(),
        _ => py_str(&format!("sample_{}", snake_case(&field.name))),
    }
}

fn field_names(brief: Option<&TaskBrief>, pick: impl Fn(&TaskBrief) -> &[TaskField]) -> String {
    let names: Vec<String> = brief
        .map(|brief| pick(brief).iter().map(|field| py_str(&field.name)).collect())
        .unwrap_or_default();
    format!("[{}]", names.join(", "))
}

fn path_params(path: &str) -> Vec<String> {
    path_param_re()
        .captures_iter(path)
        .map(|caps| snake_case(&caps[1]))
        .collect()
}

fn path_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^}/]+)\}").expect("regex for path parameters"))
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([a-z_]+)\}\}").expect("regex for template placeholders"))
}

/// Substitute `{{name}}` placeholders; every placeholder must have a value.
fn fill(template: &str, values: &[(&str, String)]) -> Result<String> {
    let values: BTreeMap<&str, &str> = values
        .iter()
        .map(|(key, value)| (*key, value.as_str()))
        .collect();
    let mut missing = BTreeSet::new();
    let rendered = placeholder_re().replace_all(template, |caps: &Captures| {
        match values.get(&caps[1]) {
            Some(value) => (*value).to_string(),
            None => {
                missing.insert(caps[1].to_string());
                String::new()
            }
        }
    });
    let rendered = rendered.into_owned();
    if !missing.is_empty() {
        let missing: Vec<String> = missing.into_iter().collect();
        return Err(anyhow!("template placeholders without a value: {}", missing.join(", ")));
    }
    Ok(rendered)
}

fn py_str(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn py_dict(entries: impl Iterator<Item = (String, String)>) -> String {
    let body: Vec<String> = entries
        .map(|(key, value)| format!("{}: {value}", py_str(&key)))
        .collect();
    format!("{{{}}}", body.join(", "))
}

/// JSON value as a Python literal.
fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => py_str(text),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => py_dict(
            map.iter()
                .map(|(key, value)| (key.clone(), py_literal(value))),
        ),
    }
}

#[cfg(test)]
#[path = "codegen_tests.rs"]
mod tests;

//! Task understanding: turn a free-text task into target operations and the
//! fields flowing through the integration.
//!
//! The keyword understander is the default. When an LM command is configured
//! the command is asked first, with the keyword result as the fallback for any
//! failure (spawn error, non-zero exit, unparseable or inconsistent response).
use crate::config::LmSettings;
use crate::model::{Endpoint, EndpointParameter, TaskBrief, TaskField, TargetOperation};
use crate::templates::UNDERSTAND_TASK_PROMPT_MD;
use crate::util::{truncate_string, words};
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "to", "for", "of", "and", "with", "in", "on", "by", "from", "via", "using",
    "my", "our", "new", "api", "endpoint", "please",
];

/// Everything a task understander may look at.
pub struct UnderstandRequest<'a> {
    pub task_description: &'a str,
    pub provider_code: &'a str,
    pub endpoints: &'a [Endpoint],
    pub parameters: &'a [EndpointParameter],
    pub lm: &'a LmSettings,
}

pub trait TaskUnderstander {
    fn understand(&self, request: &UnderstandRequest<'_>) -> Result<TaskBrief>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Create,
    Read,
    Update,
    Delete,
}

impl Intent {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "create" | "add" | "make" | "start" | "open" | "initiate" | "submit" => {
                Some(Intent::Create)
            }
            "get" | "retrieve" | "fetch" | "read" | "show" | "lookup" | "list" | "find" => {
                Some(Intent::Read)
            }
            "update" | "modify" | "edit" | "change" => Some(Intent::Update),
            "delete" | "remove" | "cancel" => Some(Intent::Delete),
            _ => None,
        }
    }

    fn allows(&self, method: &str) -> bool {
        match self {
            Intent::Create => method == "POST",
            Intent::Read => method == "GET",
            Intent::Update => method == "PUT" || method == "PATCH",
            Intent::Delete => method == "DELETE",
        }
    }
}

/// Case-insensitive keyword matching against operation ids, paths and
/// summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTaskUnderstander;

impl TaskUnderstander for KeywordTaskUnderstander {
    fn understand(&self, request: &UnderstandRequest<'_>) -> Result<TaskBrief> {
        let terms: Vec<String> = words(request.task_description)
            .into_iter()
            .filter(|word| !STOPWORDS.contains(&word.as_str()))
            .collect();
        let intent = terms.iter().find_map(|term| Intent::from_word(term));
        let subjects: Vec<&str> = terms
            .iter()
            .filter(|term| Intent::from_word(term).is_none())
            .map(String::as_str)
            .collect();

        let keyword_hits: Vec<usize> = request
            .endpoints
            .iter()
            .enumerate()
            .filter(|(_, endpoint)| endpoint_mentions_any(endpoint, &subjects))
            .map(|(index, _)| index)
            .collect();
        let intent_hits: Vec<usize> = match intent {
            Some(intent) => keyword_hits
                .iter()
                .copied()
                .filter(|index| intent.allows(&request.endpoints[*index].method))
                .collect(),
            None => keyword_hits.clone(),
        };
        let selected = if intent_hits.is_empty() {
            keyword_hits
        } else {
            intent_hits
        };

        let target_operations: Vec<TargetOperation> = selected
            .iter()
            .map(|index| target_operation(&request.endpoints[*index]))
            .collect();
        let category = detect_category(&terms);
        let (required_inputs, expected_outputs) = if target_operations.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            category_fields(category, &selected, request.parameters)
        };

        Ok(TaskBrief {
            task_description: request.task_description.to_string(),
            category: category.to_string(),
            target_operations,
            required_inputs,
            expected_outputs,
        })
    }
}

fn endpoint_mentions_any(endpoint: &Endpoint, subjects: &[&str]) -> bool {
    let operation_id = endpoint
        .operation_id
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let path = endpoint.path.to_ascii_lowercase();
    let summary = endpoint
        .summary
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();
    subjects.iter().any(|subject| {
        operation_id.contains(subject) || path.contains(subject) || summary.contains(subject)
    })
}

fn target_operation(endpoint: &Endpoint) -> TargetOperation {
    TargetOperation {
        operation_id: endpoint.operation_id.clone(),
        method: endpoint.method.clone(),
        path: endpoint.path.clone(),
        summary: endpoint.summary.clone(),
    }
}

fn detect_category(terms: &[String]) -> &'static str {
    let has = |needle: &str| terms.iter().any(|term| term.starts_with(needle));
    if has("checkout") {
        "checkout"
    } else if has("refund") {
        "refund"
    } else if has("customer") {
        "customer"
    } else {
        "generic"
    }
}

fn category_fields(
    category: &str,
    selected: &[usize],
    parameters: &[EndpointParameter],
) -> (Vec<TaskField>, Vec<TaskField>) {
    match category {
        "checkout" => (
            vec![
                TaskField::new("amount", "integer"),
                TaskField::new("currency", "string"),
                TaskField::new("success_url", "string"),
                TaskField::new("cancel_url", "string"),
            ],
            vec![
                TaskField::new("session_id", "string"),
                TaskField::new("checkout_url", "string"),
            ],
        ),
        "refund" => (
            vec![
                TaskField::new("payment_id", "string"),
                TaskField::new("amount", "integer"),
            ],
            vec![
                TaskField::new("refund_id", "string"),
                TaskField::new("status", "string"),
            ],
        ),
        "customer" => (
            vec![
                TaskField::new("email", "string"),
                TaskField::new("name", "string"),
            ],
            vec![TaskField::new("customer_id", "string")],
        ),
        _ => {
            let mut inputs: Vec<TaskField> = Vec::new();
            for parameter in parameters {
                if !selected.contains(&parameter.endpoint_index)
                    || parameter.location != "path"
                    || !parameter.required
                {
                    continue;
                }
                if inputs.iter().all(|field| field.name != parameter.name) {
                    inputs.push(TaskField::new(&parameter.name, &parameter.schema_type));
                }
            }
            (inputs, vec![TaskField::new("id", "string")])
        }
    }
}

/// Asks an external LM command (prompt on stdin, JSON on stdout).
pub struct CommandTaskUnderstander {
    command: String,
    fallback: KeywordTaskUnderstander,
}

impl CommandTaskUnderstander {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            fallback: KeywordTaskUnderstander,
        }
    }

    fn ask(&self, request: &UnderstandRequest<'_>) -> Result<TaskBrief> {
        let prompt = build_prompt(request)?;
        let raw = invoke_lm_command(&self.command, &prompt)?;
        let mut brief: TaskBrief = serde_json::from_str(extract_json(&raw)).with_context(|| {
            format!("parse LM task brief: {}", truncate_string(raw.trim(), 200))
        })?;
        for target in &brief.target_operations {
            let known = request
                .endpoints
                .iter()
                .any(|endpoint| endpoint.method == target.method && endpoint.path == target.path);
            if !known {
                return Err(anyhow!(
                    "LM selected unknown operation {} {}",
                    target.method,
                    target.path
                ));
            }
        }
        brief.task_description = request.task_description.to_string();
        if brief.category.is_empty() {
            brief.category = "generic".to_string();
        }
        Ok(brief)
    }
}

impl TaskUnderstander for CommandTaskUnderstander {
    fn understand(&self, request: &UnderstandRequest<'_>) -> Result<TaskBrief> {
        match self.ask(request) {
            Ok(brief) => Ok(brief),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "LM task understanding failed; using keyword matching");
                self.fallback.understand(request)
            }
        }
    }
}

fn build_prompt(request: &UnderstandRequest<'_>) -> Result<String> {
    let endpoints: Vec<serde_json::Value> = request
        .endpoints
        .iter()
        .map(|endpoint| {
            serde_json::json!({
                "operation_id": endpoint.operation_id,
                "method": endpoint.method,
                "path": endpoint.path,
                "summary": endpoint.summary,
            })
        })
        .collect();
    let endpoints = serde_json::to_string_pretty(&endpoints).context("serialize endpoints")?;
    Ok(format!(
        "{UNDERSTAND_TASK_PROMPT_MD}\n# Settings\nModel: {}\nMax tokens: {}\n\n# Provider\n{}\n\n# Task\n{}\n\n# Endpoints\n{endpoints}\n",
        request.lm.model, request.lm.max_tokens, request.provider_code, request.task_description
    ))
}

fn invoke_lm_command(command: &str, prompt: &str) -> Result<String> {
    let args =
        shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;
    if args.is_empty() {
        return Err(anyhow!("LM command is empty"));
    }

    let start = Instant::now();
    let mut child = Command::new(&args[0])
        .args(&args[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn LM command: {}", args[0]))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .context("write prompt to LM stdin")?;
    }
    let output = child.wait_with_output().context("wait for LM command")?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        prompt_bytes = prompt.len(),
        response_bytes = output.stdout.len(),
        "lm invoke complete"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "LM command failed with status {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")
}

/// Slice out the outermost JSON object (LMs like to wrap answers in fences).
fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.trim(),
    }
}

#[cfg(test)]
#[path = "understand_tests.rs"]
mod tests;

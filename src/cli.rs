//! CLI argument parsing for a single integration run.
//!
//! The CLI only maps flags onto an [`IntegrationRequest`]; every decision
//! about the run happens in the pipeline.
use crate::api::IntegrationRequest;
use crate::repo::{builtin_profile, builtin_profile_names};
use crate::state::RunOptions;
use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "apiweave",
    version,
    about = "Design and generate an API integration from an OpenAPI spec",
    after_help = "Examples:\n  apiweave --spec specs/mock_payments_openapi.yaml --task \"Create checkout session\"\n  apiweave --spec https://example.test/openapi.json --task \"Refund a payment\" --repo-root ../shop --dry-run\n  apiweave --spec spec.yaml --task \"Get customer\" --repo-root ../api --profile fastapi --json",
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Spec reference: local path or http(s) URL
    #[arg(long, value_name = "REF")]
    pub spec: String,

    /// Free-text description of the integration task
    #[arg(long, value_name = "TEXT")]
    pub task: String,

    /// Target repository for the generated files
    #[arg(long, value_name = "DIR")]
    pub repo_root: Option<PathBuf>,

    /// Repository layout profile (default, nextjs-app-router, django-rest, fastapi)
    #[arg(long, value_name = "NAME", requires = "repo_root")]
    pub profile: Option<String>,

    /// Plan repository changes without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Override the provider code derived from the spec reference
    #[arg(long, value_name = "CODE")]
    pub provider_code: Option<String>,

    /// Override the task slug derived from provider and task
    #[arg(long, value_name = "SLUG")]
    pub task_slug: Option<String>,

    /// Skip repository integration even when --repo-root is set
    #[arg(long)]
    pub no_repo_integration: bool,

    /// Override the LM model for this run
    #[arg(long, value_name = "MODEL")]
    pub llm_model: Option<String>,

    /// Override the LM token budget for this run
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Runtime config file (JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit one machine-readable JSON object
    #[arg(long)]
    pub json: bool,

    /// Log pipeline progress to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl RootArgs {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Markdown
        }
    }

    pub fn to_request(&self) -> Result<IntegrationRequest> {
        let repo_profile = self
            .profile
            .as_deref()
            .map(|name| {
                builtin_profile(name).ok_or_else(|| {
                    anyhow!(
                        "unknown profile {name:?} (expected one of: {})",
                        builtin_profile_names().join(", ")
                    )
                })
            })
            .transpose()?;
        Ok(IntegrationRequest {
            spec_refs: vec![self.spec.clone()],
            task_description: self.task.clone(),
            provider_code: None,
            repo_root: self.repo_root.clone(),
            repo_profile,
            options: RunOptions {
                repo_integration_enabled: !self.no_repo_integration,
                dry_run: self.dry_run,
                override_provider_code: self.provider_code.clone(),
                override_task_slug: self.task_slug.clone(),
                override_llm_model: self.llm_model.clone(),
                override_max_tokens: self.max_tokens,
            },
        })
    }
}

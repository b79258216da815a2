use anyhow::{Context, Result};
use apiweave::api::{design_and_generate_integration, IntegrationResult};
use apiweave::cli::{OutputFormat, RootArgs};
use apiweave::config::RuntimeConfig;
use apiweave::providers::Collaborators;
use clap::Parser;
use serde_json::json;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);
    let format = args.output_format();
    match run(&args) {
        Ok(result) => {
            if let Err(err) = emit(&result, format, args.dry_run) {
                eprintln!("error: {err:#}");
                return ExitCode::FAILURE;
            }
            if result.errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            match format {
                OutputFormat::Json => {
                    let payload = json!({"status": "failed", "error": format!("{err:#}")});
                    eprintln!("{payload}");
                }
                OutputFormat::Markdown => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &RootArgs) -> Result<IntegrationResult> {
    let config = RuntimeConfig::load(args.config.as_deref())?;
    let providers = Collaborators::from_config(&config);
    let request = args.to_request()?;
    design_and_generate_integration(request, &config, &providers)
}

fn emit(result: &IntegrationResult, format: OutputFormat, dry_run: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let (files_created, files_updated) = result
                .repo_changes
                .as_ref()
                .map(|changes| (changes.files_created(), changes.files_updated()))
                .unwrap_or((0, 0));
            let payload = json!({
                "run_id": result.run_id,
                "status": result.status,
                "provider_code": result.provider_code,
                "task_slug": result.task_slug,
                "code_artifacts": result.code_artifacts.len(),
                "files_created": files_created,
                "files_updated": files_updated,
                "dry_run": dry_run,
                "errors": result.errors,
                "report_markdown": result.report_markdown,
            });
            let text = serde_json::to_string_pretty(&payload).context("serialize result")?;
            println!("{text}");
        }
        OutputFormat::Markdown => print!("{}", result.report_markdown),
    }
    Ok(())
}

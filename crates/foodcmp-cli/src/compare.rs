//! `run` and `providers` command handlers.
//!
//! Providers that fail to build from the registry file are logged and
//! skipped; only a run with no usable request or registry is an error.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use foodcmp_core::{AppConfig, RawSearchRequest, RunReport, SearchRequest};
use foodcmp_http::{HttpProvider, HttpSettings};
use foodcmp_orchestrator::{Orchestrator, Provider, RunContext, RunPolicy};
use tokio_util::sync::CancellationToken;

use crate::interactive::prompt_raw_request;
use crate::report;
use crate::RunArgs;

/// Exit status for a run interrupted by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

/// Builds the raw request from `--items` and the filter flags, falling back to
/// the configured defaults.
pub(crate) fn raw_request_from_args(args: &RunArgs, config: &AppConfig) -> RawSearchRequest {
    let items = args
        .items
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let mut raw = RawSearchRequest::new(items);
    raw.min_rating = args.rating.unwrap_or(config.default_min_rating);
    raw.price_min = args.price_min;
    raw.price_max = args.price_max;
    raw.max_results_per_provider = args.max_results.unwrap_or(config.default_max_results);
    raw.location.clone_from(&args.location);
    raw
}

/// Builds the validated request from `--request`, `--interactive`, or
/// `--items` and the filter flags.
///
/// # Errors
///
/// Returns an error if the request file or terminal input cannot be read, or
/// if the request fails validation.
pub(crate) fn resolve_request(args: &RunArgs, config: &AppConfig) -> anyhow::Result<SearchRequest> {
    if let Some(path) = &args.request {
        return foodcmp_core::load_request(path)
            .with_context(|| format!("loading request from {}", path.display()));
    }
    let raw = if args.interactive {
        prompt_raw_request(&mut std::io::stdin().lock(), &mut std::io::stderr(), config)?
    } else {
        raw_request_from_args(args, config)
    };
    raw.validate().context("invalid search request")
}

fn build_providers(
    path: &Path,
    config: &AppConfig,
    ctx: &RunContext,
) -> anyhow::Result<Vec<Arc<dyn Provider>>> {
    let registry = foodcmp_core::load_providers(path)
        .with_context(|| format!("loading providers from {}", path.display()))?;
    let settings = HttpSettings::from_app_config(config);

    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
    for entry in registry.enabled() {
        match HttpProvider::from_config(entry, &settings, ctx.clone()) {
            Ok(p) => providers.push(Arc::new(p)),
            Err(e) => {
                tracing::error!(provider = %entry.name, error = %e, "skipping provider");
            }
        }
    }
    Ok(providers)
}

/// Runs one comparison and renders its report.
///
/// # Errors
///
/// Returns an error if the request cannot be resolved, the providers file
/// cannot be loaded, or the report cannot be written.
pub(crate) async fn run_compare(config: &AppConfig, args: &RunArgs) -> anyhow::Result<ExitCode> {
    let request = resolve_request(args, config)?;

    let token = CancellationToken::new();
    let ctx = RunContext::with_cancellation(token.clone());

    let providers_path = args
        .providers
        .clone()
        .unwrap_or_else(|| config.providers_path.clone());
    let providers = build_providers(&providers_path, config, &ctx)?;
    if providers.is_empty() {
        tracing::warn!(path = %providers_path.display(), "no enabled providers");
    }

    let policy = RunPolicy {
        mutate: !args.dry_run,
        ..RunPolicy::from_app_config(config)
    };
    let orchestrator = Orchestrator::new(providers, policy, ctx);

    let interrupt = token.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            interrupt.cancel();
        }
    });
    let run_report = orchestrator.run(request).await;
    signal_task.abort();

    emit(&run_report, args)?;

    if token.is_cancelled() {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(exit_code_for(&run_report))
}

fn emit(run_report: &RunReport, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(path) = &args.output {
        report::save_report(run_report, path)?;
        tracing::info!(path = %path.display(), "report saved");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(run_report)?);
    } else {
        print!("{}", report::render_summary(run_report));
    }
    Ok(())
}

pub(crate) fn exit_code_for(run_report: &RunReport) -> ExitCode {
    if run_report.total_options > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints every provider in the registry with its enabled flag.
///
/// # Errors
///
/// Returns an error if the providers file cannot be loaded.
pub(crate) fn list_providers(path: &Path) -> anyhow::Result<()> {
    let registry = foodcmp_core::load_providers(path)
        .with_context(|| format!("loading providers from {}", path.display()))?;
    if registry.providers.is_empty() {
        println!("no providers configured in {}", path.display());
        return Ok(());
    }
    for p in &registry.providers {
        let state = if p.enabled { "enabled" } else { "disabled" };
        println!("{:<12} {:<9} {}", p.name, state, p.base_url);
    }
    Ok(())
}

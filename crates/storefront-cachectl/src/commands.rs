//! Subcommand execution against a wired cache.

use crate::cli::Command;
use anyhow::{bail, Context};
use storefront_cache::{ChangeEvent, InvalidationReport, StorefrontCache};
use storefront_core::{HealthCheck, HealthStatus};

/// Runs `command` and returns the text to print.
///
/// A partial invalidation or an unhealthy store is an error so the process
/// exits non-zero.
pub async fn execute(command: &Command, cache: &StorefrontCache) -> anyhow::Result<String> {
    match command {
        Command::Key { category, params } => {
            let params: serde_json::Value = match params {
                Some(raw) => serde_json::from_str(raw).context("--params is not valid JSON")?,
                None => serde_json::Value::Null,
            };
            let built = cache.key_dynamic(category, params)?;
            Ok(format!("{}\nttl: {}s", built.key, built.ttl.as_secs()))
        }
        Command::Ttl => {
            let lines: Vec<String> = cache
                .policy()
                .iter()
                .map(|(category, ttl)| format!("{:<16} {}s", category.as_str(), ttl.as_secs()))
                .collect();
            Ok(lines.join("\n"))
        }
        Command::Invalidate {
            kind,
            id,
            owner,
            dry_run,
        } => {
            let event = ChangeEvent::parse(kind, id.as_deref(), owner.as_deref())?;
            if *dry_run {
                return Ok(cache.patterns_for(&event).join("\n"));
            }
            summarize(&cache.invalidate(&event).await)
        }
        Command::Flush => summarize(&cache.invalidate(&ChangeEvent::All).await),
        Command::Ping => {
            let check = cache.health_check();
            match check.check().await {
                HealthStatus::Healthy => Ok(format!("{}: healthy", check.name())),
                HealthStatus::Degraded(reason) => Ok(format!("{}: degraded ({})", check.name(), reason)),
                HealthStatus::Unhealthy(reason) => bail!("{}: unhealthy ({})", check.name(), reason),
            }
        }
    }
}

fn summarize(report: &InvalidationReport) -> anyhow::Result<String> {
    if !report.is_complete() {
        bail!(
            "{}: {} of {} patterns failed: {}",
            report.kind,
            report.failed.len(),
            report.patterns.len(),
            report.failed.join(", ")
        );
    }
    Ok(format!(
        "{}: {} patterns, {} keys deleted",
        report.kind,
        report.patterns.len(),
        report.deleted
    ))
}

//! Synthetic load against an in-process metrics context

use crate::args::OutputFormat;
use anyhow::{Context, Result};
use faultline_core::config::MetricsConfig;
use faultline_core::error::FaultlineResult;
use faultline_core::registry::{ErrorCodeInfo, ErrorCodeRegistryBuilder};
use faultline_core::{ErrorOccurrence, MetricsContext};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Codes cycled through by the simulation: (code, name, status, message, domain)
const SAMPLE_ERRORS: &[(u32, &str, u16, &str, &str)] = &[
    (201, "Unauthorized", 401, "Authentication required", "AUTH"),
    (301, "ResourceNotFound", 404, "Resource not found", "RESOURCE"),
    (401, "ValidationFailed", 422, "Request validation failed", "VALIDATION"),
    (501, "InternalError", 500, "Internal server error", "SERVER"),
    (503, "UpstreamTimeout", 504, "Upstream service timed out", "SERVER"),
];

/// Outcome of a simulation run
#[derive(Debug)]
pub struct SimulationReport {
    pub events: usize,
    pub threads: usize,
    pub elapsed: Duration,
    /// Mean wall time of a single `record` call
    pub average_latency: Duration,
    pub max_latency: Duration,
}

pub async fn run(
    config: FaultlineResult<MetricsConfig>,
    events: usize,
    threads: usize,
    format: OutputFormat,
) -> Result<()> {
    let config = config.context("Failed to load configuration")?;
    let context = Arc::new(build_context(config)?);

    let report = {
        let context = Arc::clone(&context);
        tokio::task::spawn_blocking(move || record_load(&context, events, threads))
            .await
            .context("Simulation worker panicked")?
    };

    match format {
        OutputFormat::Text => {
            print!("{}", context.exporter().render());
            println!();
            println!(
                "# recorded {} errors on {} threads in {:?} (avg {:?}/record, max {:?})",
                report.events, report.threads, report.elapsed, report.average_latency, report.max_latency
            );
        }
        OutputFormat::Json => {
            let summary = match context.dashboard() {
                Some(dashboard) => serde_json::to_value(dashboard.summary())?,
                None => serde_json::to_value(context.collector().snapshot())?,
            };
            let output = json!({
                "summary": summary,
                "simulation": {
                    "events": report.events,
                    "threads": report.threads,
                    "elapsed_ms": report.elapsed.as_secs_f64() * 1_000.0,
                    "average_latency_us": report.average_latency.as_secs_f64() * 1_000_000.0,
                    "max_latency_us": report.max_latency.as_secs_f64() * 1_000_000.0,
                },
                "tracking": context.tracking_stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    context.shutdown().await;
    Ok(())
}

fn build_context(config: MetricsConfig) -> Result<MetricsContext> {
    let registry = ErrorCodeRegistryBuilder::new()
        .with_predefined_domains()
        .register_all(SAMPLE_ERRORS.iter().map(|(code, name, status, message, domain)| {
            ErrorCodeInfo::new(*code, *name, *message, *status).with_domain(*domain)
        }))
        .build()
        .context("Failed to build sample error registry")?;

    MetricsContext::builder(config)
        .registry(registry)
        .build()
        .context("Failed to build metrics context")
}

/// Spread `events` records across `threads` OS threads
pub fn record_load(context: &MetricsContext, events: usize, threads: usize) -> SimulationReport {
    let threads = threads.max(1);
    let started = Instant::now();

    let per_thread: Vec<(Duration, Duration, usize)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let share = events / threads + usize::from(t < events % threads);
                scope.spawn(move || {
                    let mut total = Duration::ZERO;
                    let mut max = Duration::ZERO;
                    for i in 0..share {
                        let (code, name, status, message, _) =
                            SAMPLE_ERRORS[(t + i) % SAMPLE_ERRORS.len()];
                        let occurrence = ErrorOccurrence::new(code, name, status, message)
                            .with_path(format!("/simulate/{}", t))
                            .with_method("GET");
                        let start = Instant::now();
                        context.record(occurrence);
                        let elapsed = start.elapsed();
                        total += elapsed;
                        max = max.max(elapsed);
                    }
                    (total, max, share)
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect()
    });

    let recorded: usize = per_thread.iter().map(|(_, _, n)| n).sum();
    let total: Duration = per_thread.iter().map(|(t, _, _)| *t).sum();
    let max_latency = per_thread
        .iter()
        .map(|(_, m, _)| *m)
        .max()
        .unwrap_or_default();

    SimulationReport {
        events: recorded,
        threads,
        elapsed: started.elapsed(),
        average_latency: total
            .checked_div(u32::try_from(recorded).unwrap_or(u32::MAX))
            .unwrap_or_default(),
        max_latency,
    }
}

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use dashmap::DashMap;

use live_core::{AggregateStatus, FetchOutcome, PlatformResult, PlatformType};

use crate::state::AppState;

const OUTCOMES: [&str; 4] = ["live", "offline", "untracked", "degraded"];

/// Counters for served lookups. Only the API layer mutates these; the
/// aggregator itself stays stateless.
#[derive(Debug, Default)]
pub struct LookupMetrics {
    lookups: AtomicU64,
    platform_results: DashMap<(PlatformType, &'static str), u64>,
    last_lookup_ms: AtomicI64,
}

impl LookupMetrics {
    pub fn record(&self, status: &AggregateStatus) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        for result in &status.results {
            *self
                .platform_results
                .entry((result.platform, outcome_label(result)))
                .or_default() += 1;
        }
        self.last_lookup_ms
            .fetch_max(status.checked_at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn platform_count(&self, platform: PlatformType, outcome: &'static str) -> u64 {
        self.platform_results
            .get(&(platform, outcome))
            .map(|count| *count)
            .unwrap_or(0)
    }
}

fn outcome_label(result: &PlatformResult) -> &'static str {
    match result.outcome {
        FetchOutcome::Fetched if result.is_live() => "live",
        FetchOutcome::Fetched => "offline",
        FetchOutcome::Untracked => "untracked",
        FetchOutcome::Degraded { .. } => "degraded",
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = &state.metrics;
    let mut out = String::with_capacity(2048);

    writeln!(out, "# TYPE live_status_lookups counter").unwrap();
    writeln!(out, "# HELP live_status_lookups Streamer lookups served").unwrap();
    writeln!(out, "live_status_lookups_total {}", metrics.lookups()).unwrap();

    writeln!(out, "# TYPE live_status_platform_results counter").unwrap();
    writeln!(
        out,
        "# HELP live_status_platform_results Platform entries by outcome"
    )
    .unwrap();
    for platform in PlatformType::ALL {
        for outcome in OUTCOMES {
            writeln!(
                out,
                "live_status_platform_results_total{{platform=\"{}\",outcome=\"{}\"}} {}",
                platform,
                outcome,
                metrics.platform_count(platform, outcome)
            )
            .unwrap();
        }
    }

    writeln!(out, "# TYPE live_status_configured_platforms gauge").unwrap();
    writeln!(
        out,
        "# HELP live_status_configured_platforms Platforms with a configured client"
    )
    .unwrap();
    let configured = state.aggregator.platforms();
    for platform in PlatformType::ALL {
        writeln!(
            out,
            "live_status_configured_platforms{{platform=\"{}\"}} {}",
            platform,
            if configured.contains(&platform) { 1 } else { 0 }
        )
        .unwrap();
    }

    let last_ms = metrics.last_lookup_ms.load(Ordering::Relaxed);
    if last_ms > 0 {
        writeln!(out, "# TYPE live_status_last_lookup_timestamp_seconds gauge").unwrap();
        writeln!(
            out,
            "# HELP live_status_last_lookup_timestamp_seconds Unix timestamp of the last lookup"
        )
        .unwrap();
        writeln!(
            out,
            "live_status_last_lookup_timestamp_seconds {:.3}",
            last_ms as f64 / 1000.0
        )
        .unwrap();
    }

    writeln!(out, "# EOF").unwrap();

    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        out,
    )
}

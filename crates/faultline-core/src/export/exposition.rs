//! Pull-based text exposition of error counts

use crate::config::ExpositionConfig;
use crate::telemetry::{SharedMetricsCollector, Snapshot};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Content type of the rendered page
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders collector snapshots in the text exposition format
#[derive(Debug, Clone)]
pub struct ExpositionExporter {
    collector: SharedMetricsCollector,
    namespace: String,
    enabled: bool,
}

impl ExpositionExporter {
    pub fn new(collector: SharedMetricsCollector, config: &ExpositionConfig) -> Self {
        Self {
            collector,
            namespace: config.namespace.clone(),
            enabled: config.enabled,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current page, or an empty string when disabled
    pub fn render(&self) -> String {
        if !self.enabled {
            return String::new();
        }
        let snapshot = self.collector.snapshot();
        self.render_snapshot(&snapshot)
    }

    /// Format `snapshot`; runs entirely outside the collector lock
    pub fn render_snapshot(&self, snapshot: &Snapshot) -> String {
        let ns = &self.namespace;
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "# HELP {ns}_errors_total Total number of application errors");
        let _ = writeln!(out, "# TYPE {ns}_errors_total counter");
        let _ = writeln!(out, "{ns}_errors_total {}", snapshot.total_errors);
        out.push('\n');

        let _ = writeln!(
            out,
            "# HELP {ns}_errors_by_code Errors grouped by application error code"
        );
        let _ = writeln!(out, "# TYPE {ns}_errors_by_code gauge");
        for (code, count) in &snapshot.error_counts {
            let _ = writeln!(out, "{ns}_errors_by_code{{error_code=\"{code}\"}} {count}");
        }
        out.push('\n');

        let status_counts = status_counts(snapshot);
        if !status_counts.is_empty() {
            let _ = writeln!(
                out,
                "# HELP {ns}_errors_by_status Errors grouped by transport status code"
            );
            let _ = writeln!(out, "# TYPE {ns}_errors_by_status gauge");
            for (status, count) in &status_counts {
                let _ = writeln!(out, "{ns}_errors_by_status{{status_code=\"{status}\"}} {count}");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "# HELP {ns}_error_buckets Time buckets inside the retention window");
        let _ = writeln!(out, "# TYPE {ns}_error_buckets gauge");
        let _ = writeln!(out, "{ns}_error_buckets {}", snapshot.bucket_count);

        out
    }
}

/// Status counts from recent events
///
/// With no recent events, codes in 400..600 are assumed to mirror their
/// status and reported as such.
fn status_counts(snapshot: &Snapshot) -> BTreeMap<u32, u64> {
    let from_events: BTreeMap<u32, u64> = snapshot
        .status_counts()
        .into_iter()
        .map(|(status, count)| (u32::from(status), count))
        .collect();
    if !from_events.is_empty() {
        return from_events;
    }

    snapshot
        .error_counts
        .iter()
        .filter(|(code, _)| (400..600).contains(*code))
        .map(|(code, count)| (*code, *count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::telemetry::{ErrorOccurrence, MetricsCollector};
    use chrono::Utc;
    use std::sync::Arc;

    fn exporter(namespace: &str) -> ExpositionExporter {
        let collector = Arc::new(MetricsCollector::new(MetricsConfig::default()).unwrap());
        let config = ExpositionConfig {
            enabled: true,
            namespace: namespace.to_string(),
        };
        ExpositionExporter::new(collector, &config)
    }

    #[test]
    fn test_render_empty() {
        let page = exporter("shop").render();
        assert!(page.contains("# TYPE shop_errors_total counter"));
        assert!(page.contains("shop_errors_total 0\n"));
        assert!(!page.contains("shop_errors_by_status"));
        assert!(page.ends_with("shop_error_buckets 0\n"));
    }

    #[test]
    fn test_render_counts_sorted_by_code() {
        let exporter = exporter("faultline");
        exporter
            .collector
            .record(ErrorOccurrence::new(500, "Internal", 500, "boom"));
        exporter
            .collector
            .record(ErrorOccurrence::new(404, "NotFound", 404, "missing"));
        exporter
            .collector
            .record(ErrorOccurrence::new(404, "NotFound", 404, "missing"));

        let page = exporter.render();
        assert!(page.contains("faultline_errors_total 3\n"));
        let by_404 = page
            .find("faultline_errors_by_code{error_code=\"404\"} 2")
            .unwrap();
        let by_500 = page
            .find("faultline_errors_by_code{error_code=\"500\"} 1")
            .unwrap();
        assert!(by_404 < by_500);
        assert!(page.contains("faultline_errors_by_status{status_code=\"404\"} 2"));
        assert!(page.contains("faultline_error_buckets 1"));
        assert!(page.contains("\n\n# HELP faultline_errors_by_code"));
    }

    #[test]
    fn test_status_fallback_without_recent_events() {
        let exporter = exporter("faultline");
        let snapshot = Snapshot {
            total_errors: 5,
            error_counts: BTreeMap::from([(201, 2), (404, 3)]),
            recent_events: Vec::new(),
            bucket_count: 1,
            timestamp: Utc::now(),
        };

        let page = exporter.render_snapshot(&snapshot);
        assert!(page.contains("faultline_errors_by_status{status_code=\"404\"} 3"));
        assert!(!page.contains("status_code=\"201\""));
    }

    #[test]
    fn test_disabled_renders_nothing() {
        let collector = Arc::new(MetricsCollector::new(MetricsConfig::default()).unwrap());
        let config = ExpositionConfig {
            enabled: false,
            namespace: "faultline".to_string(),
        };
        let exporter = ExpositionExporter::new(collector, &config);
        exporter
            .collector
            .record(ErrorOccurrence::new(1, "X", 500, "x"));
        assert_eq!(exporter.render(), "");
    }
}

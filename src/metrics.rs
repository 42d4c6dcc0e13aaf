use std::sync::OnceLock;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Only one recorder can exist per process, so repeated calls return the
/// handle installed by the first one.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            // Pre-register counters so they appear even before the first increment.
            counter!("quotes_created_total").absolute(0);
            counter!("quotes_rejected_total").absolute(0);
            counter!("bets_confirmed_total").absolute(0);
            counter!("cartelas_cancelled_total").absolute(0);
            counter!("ledger_entries_total").absolute(0);

            histogram!("quote_latency_seconds").record(0.0);

            handle
        })
        .clone()
}

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Build the Prometheus recorder and register all application metrics.
///
/// The recorder is installed globally on the first call only; later calls
/// (integration tests build several apps per process) get a detached handle.
/// Callers own upkeep via `PrometheusHandle::run_upkeep`.
pub fn init_metrics() -> PrometheusHandle {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::debug!("Prometheus recorder already installed");
        return handle;
    }

    // Pre-register counters so they appear even before the first increment.
    counter!("wallet_analyses_total").absolute(0);
    counter!("indexed_transactions_total").absolute(0);
    counter!("external_call_failures_total").absolute(0);
    counter!("token_cache_hits_total").absolute(0);
    counter!("demo_data_served_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("analysis_latency_seconds").record(0.0);

    handle
}

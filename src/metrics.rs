use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "sentiment_pairs_scored_total",
            "(document, keyword) pairs scored."
        );
        describe_counter!(
            "sentiment_fetch_failures_total",
            "Collocation lookups that failed and were scored as zero."
        );
        describe_counter!(
            "sentiment_documents_dropped_total",
            "Corpus rows without a score row after the merge."
        );
        describe_counter!(
            "sentiment_result_cache_hits_total",
            "Scoring requests answered from the result cache."
        );
        describe_histogram!("sentiment_run_ms", "Corpus scoring time in milliseconds.");
        describe_histogram!(
            "sentiment_remote_call_ms",
            "Text statistics API call time in milliseconds."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Fails if another recorder is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

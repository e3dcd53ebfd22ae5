use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use formfit::{set_match_metrics, FormRegistry, MatchMetrics};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Template registry (shared across requests)
    pub registry: Arc<FormRegistry>,

    /// Prometheus renderer; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Open the configured store and build the state around it.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let registry_config = config.registry_config()?;
        let registry = FormRegistry::open(&registry_config)?;
        Self::with_registry(config, Arc::new(registry))
    }

    /// Build state around an existing registry.
    pub fn with_registry(config: ServerConfig, registry: Arc<FormRegistry>) -> ServerResult<Self> {
        let metrics = if config.metrics_enabled {
            Some(install_metrics()?)
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            registry,
            metrics,
        })
    }
}

/// Install the process-wide Prometheus recorder and match observer once.
fn install_metrics() -> ServerResult<PrometheusHandle> {
    static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
    HANDLE
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| ServerError::Config(format!("metrics recorder: {e}")))?;
            set_match_metrics(Some(Arc::new(PrometheusMatchMetrics)));
            Ok(handle)
        })
        .cloned()
}

/// Feeds matcher observations into the `metrics` facade.
struct PrometheusMatchMetrics;

impl MatchMetrics for PrometheusMatchMetrics {
    fn record_match(&self, latency: Duration, candidate_count: usize, matched: bool) {
        let outcome = if matched { "matched" } else { "unmatched" };
        metrics::counter!("formfit_match_requests_total", "outcome" => outcome).increment(1);
        metrics::histogram!("formfit_match_latency_seconds").record(latency.as_secs_f64());
        metrics::histogram!("formfit_match_candidates").record(candidate_count as f64);
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}

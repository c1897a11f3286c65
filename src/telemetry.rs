use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    // try_init: a subscriber may already be installed by an embedding process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}

#[cfg(feature = "metrics-exporter")]
pub fn init_metrics(port: u16) {
    use metrics_exporter_prometheus::PrometheusBuilder;

    match PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
    {
        Ok(()) => {
            tracing::info!(port, "Prometheus exporter listening on /metrics");
            metrics::gauge!("orion_up").set(1.0);
        }
        Err(e) => tracing::warn!(error = %e, port, "Prometheus exporter not installed"),
    }
}

#[cfg(not(feature = "metrics-exporter"))]
pub fn init_metrics(_port: u16) { /* no-op */ }

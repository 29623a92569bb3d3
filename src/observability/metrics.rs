use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Metrics collection for the menu service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Database metrics
    pub database_operations_total: CounterVec,
    pub database_operation_duration_seconds: HistogramVec,
    pub database_connections_active: Gauge,

    // Business logic metrics
    pub menu_operations_total: CounterVec,
    pub rating_submissions_total: CounterVec,
    pub rating_recompute_conflicts_total: Counter,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        // HTTP metrics
        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        // Database metrics
        let database_operations_total = CounterVec::new(
            Opts::new(
                "database_operations_total",
                "Total number of database operations",
            ),
            &["operation", "table", "status"],
        )?;

        let database_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "database_operation_duration_seconds",
                "Database operation duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["operation", "table"],
        )?;

        let database_connections_active = Gauge::new(
            "database_connections_active",
            "Number of active database connections",
        )?;

        // Business logic metrics
        let menu_operations_total = CounterVec::new(
            Opts::new(
                "menu_operations_total",
                "Total number of menu browsing operations",
            ),
            &["operation", "status"],
        )?;

        let rating_submissions_total = CounterVec::new(
            Opts::new(
                "rating_submissions_total",
                "Total number of rating submissions",
            ),
            &["status"],
        )?;

        let rating_recompute_conflicts_total = Counter::new(
            "rating_recompute_conflicts_total",
            "Number of aggregate rating writes retried due to version conflicts",
        )?;

        // Register all metrics
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(database_operations_total.clone()))?;
        registry.register(Box::new(database_operation_duration_seconds.clone()))?;
        registry.register(Box::new(database_connections_active.clone()))?;
        registry.register(Box::new(menu_operations_total.clone()))?;
        registry.register(Box::new(rating_submissions_total.clone()))?;
        registry.register(Box::new(rating_recompute_conflicts_total.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            database_operations_total,
            database_operation_duration_seconds,
            database_connections_active,
            menu_operations_total,
            rating_submissions_total,
            rating_recompute_conflicts_total,
        })
    }

    /// Get the metrics registry for exposing metrics endpoint
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Record database operation metrics
    pub fn record_database_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };

        self.database_operations_total
            .with_label_values(&[operation, table, status])
            .inc();

        self.database_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_seconds);
    }

    /// Record menu browsing operation metrics
    pub fn record_menu_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.menu_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record a rating submission outcome
    pub fn record_rating_submission(&self, success: bool) {
        let status = if success { "success" } else { "error" };

        self.rating_submissions_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record one CAS retry during aggregate rating recomputation
    pub fn record_rating_recompute_conflict(&self) {
        self.rating_recompute_conflicts_total.inc();
    }

    /// Increment in-flight requests
    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    /// Decrement in-flight requests
    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }

    /// Set active database connections
    pub fn set_active_connections(&self, count: f64) {
        self.database_connections_active.set(count);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_http_request_recording() {
        let metrics = Metrics::new().unwrap();

        metrics.record_http_request("GET", "/api/dish", 200, 0.123);
        metrics.record_http_request("POST", "/api/dish/:dish_id/rating", 204, 0.456);

        let encoded = metrics.encode();
        assert!(encoded.is_ok());

        let metrics_text = encoded.unwrap();
        assert!(metrics_text.contains("http_requests_total"));
        assert!(metrics_text.contains("http_request_duration_seconds"));
    }

    #[test]
    fn test_database_operation_recording() {
        let metrics = Metrics::new().unwrap();

        metrics.record_database_operation("get_item", "Dishes", true, 0.050);
        metrics.record_database_operation("query", "DishRatings", false, 0.100);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("database_operations_total"));
        assert!(encoded.contains("database_operation_duration_seconds"));
    }

    #[test]
    fn test_business_metrics_recording() {
        let metrics = Metrics::new().unwrap();

        metrics.record_menu_operation("list_menu", true);
        metrics.record_rating_submission(true);
        metrics.record_rating_submission(false);
        metrics.record_rating_recompute_conflict();

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("menu_operations_total"));
        assert!(encoded.contains("rating_submissions_total"));
        assert!(encoded.contains("rating_recompute_conflicts_total"));
    }

    #[test]
    fn test_in_flight_requests() {
        let metrics = Metrics::new().unwrap();

        metrics.increment_in_flight("GET", "/api/dish");
        metrics.increment_in_flight("GET", "/api/dish");
        metrics.decrement_in_flight("GET", "/api/dish");

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("http_requests_in_flight"));
    }
}

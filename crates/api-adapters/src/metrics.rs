//! Prometheus counters for the HTTP layer.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub status: String,
}

#[derive(Debug)]
pub struct HttpMetrics {
    registry: Registry,
    responses: Family<HttpLabels, Counter>,
}

impl Default for HttpMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("devpub");
        let responses = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_responses",
            "HTTP responses by request method and status code",
            responses.clone(),
        );
        Self { registry, responses }
    }

    pub fn record(&self, method: &str, status: u16) {
        self.responses
            .get_or_create(&HttpLabels { method: method.to_string(), status: status.to_string() })
            .inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_method_and_status() {
        let metrics = HttpMetrics::new();
        metrics.record("GET", 200);
        metrics.record("GET", 200);
        metrics.record("POST", 401);

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"devpub_http_responses_total{method="GET",status="200"} 2"#));
        assert!(text.contains(r#"devpub_http_responses_total{method="POST",status="401"} 1"#));
        assert!(text.ends_with("# EOF\n"));
    }
}

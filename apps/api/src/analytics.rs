/// Analytics mirroring for experiment funnel events.
///
/// ARCHITECTURAL RULE: nothing in a product flow may depend on the collector.
/// `capture` never returns an error; failures are logged at `warn!` and
/// discarded at this boundary. The durable event row in Postgres is the
/// source of truth, the collector is a mirror.
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

const CAPTURE_TIMEOUT_SECS: u64 = 5;

/// Destination for mirrored product events.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Delivers one event. Infallible by contract: implementations swallow
    /// their own failures.
    async fn capture(&self, distinct_id: &str, event: &str, properties: Value);
}

/// HTTP collector sink (PostHog-compatible capture endpoint).
pub struct HttpAnalyticsSink {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpAnalyticsSink {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(CAPTURE_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    async fn capture(&self, distinct_id: &str, event: &str, properties: Value) {
        let url = format!("{}/capture/", self.base_url);
        let body = json!({
            "api_key": self.api_key,
            "event": event,
            "distinct_id": distinct_id,
            "properties": properties,
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("Analytics collector returned {}", response.status());
            }
            Ok(_) => {}
            Err(e) => warn!("Analytics capture failed: {e}"),
        }
    }
}

/// Sink used when no collector is configured.
pub struct NoopAnalyticsSink;

#[async_trait]
impl AnalyticsSink for NoopAnalyticsSink {
    async fn capture(&self, distinct_id: &str, event: &str, _properties: Value) {
        debug!("Analytics disabled, dropping event {event} for {distinct_id}");
    }
}

/// Collector-side event name for an experiment funnel event.
pub fn experiment_event_name(experiment_id: &str, event_name: &str) -> String {
    format!("exp:{experiment_id}:{event_name}")
}

/// Mirrored payload: the assigned variant plus the caller's free-form
/// properties. Caller keys win on collision, matching the durable row.
pub fn experiment_event_properties(variant: &str, properties: &Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("variant".to_string(), Value::String(variant.to_string()));
    if let Some(extra) = properties.as_object() {
        for (key, value) in extra {
            map.insert(key.clone(), value.clone());
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_pattern() {
        assert_eq!(
            experiment_event_name("onboarding-cta", "signup_clicked"),
            "exp:onboarding-cta:signup_clicked"
        );
    }

    #[test]
    fn test_properties_include_variant() {
        let merged = experiment_event_properties("treatment", &json!({"step": 2}));
        assert_eq!(merged["variant"], "treatment");
        assert_eq!(merged["step"], 2);
    }

    #[test]
    fn test_caller_properties_win_on_collision() {
        let merged = experiment_event_properties("treatment", &json!({"variant": "override"}));
        assert_eq!(merged["variant"], "override");
    }

    #[test]
    fn test_non_object_properties_ignored() {
        let merged = experiment_event_properties("control", &json!("not-a-map"));
        assert_eq!(merged, json!({"variant": "control"}));
    }
}

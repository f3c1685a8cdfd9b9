//! Format negotiation against the probe-only test endpoint.

use std::time::Duration;

use chatlink_core::{
    AttemptPhase, CandidateSchema, DiagnosticRecord, MessageContext, PayloadInput, formats,
};
use chrono::Utc;

use crate::config::ClientConfig;
use crate::transport::Transport;

/// Text sent with every probe; the test endpoint never feeds it to a model.
pub const PROBE_MESSAGE: &str = "connection test";

pub struct SchemaProbe {
    endpoint: String,
    timeout: Duration,
}

impl SchemaProbe {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.test_endpoint(),
            timeout: config.probe_timeout,
        }
    }

    /// Try every candidate format in catalog order and report each outcome.
    /// The sweep does not stop at the first success.
    pub async fn probe_all(
        &self,
        transport: &Transport,
        client_id: &str,
        auth_token: Option<&str>,
    ) -> Vec<DiagnosticRecord> {
        let context = MessageContext::default();
        let mut records = Vec::with_capacity(formats::all_formats().len());

        for format in formats::all_formats() {
            let payload = format.build_payload(&PayloadInput {
                message: PROBE_MESSAGE,
                client_id,
                conversation_id: None,
                context: &context,
                timestamp: Utc::now(),
            });
            let url = format.endpoint(&self.endpoint);
            let timed = transport
                .post_json(&url, &payload, auth_token, self.timeout)
                .await;

            let record = match timed.result {
                Ok(exchange) => match exchange.status_error() {
                    None => DiagnosticRecord::success(
                        format.name,
                        AttemptPhase::Probe,
                        exchange.status,
                        timed.latency_ms,
                    ),
                    Some(err) => DiagnosticRecord::failure(
                        format.name,
                        AttemptPhase::Probe,
                        Some(exchange.status),
                        timed.latency_ms,
                        err.to_string(),
                    ),
                },
                Err(err) => DiagnosticRecord::failure(
                    format.name,
                    AttemptPhase::Probe,
                    None,
                    timed.latency_ms,
                    err.to_string(),
                ),
            };

            tracing::debug!(
                format = %format.name,
                success = record.success,
                status = ?record.http_status,
                latency_ms = record.latency_ms,
                "probe attempt"
            );
            records.push(record);
        }

        records
    }

    /// First successful format in catalog order. Latency is not compared.
    pub fn select(records: &[DiagnosticRecord]) -> Option<&'static CandidateSchema> {
        records
            .iter()
            .filter(|r| r.success)
            .find_map(|r| formats::find(&r.format))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn probe_for(server: &MockServer) -> SchemaProbe {
        SchemaProbe::new(&ClientConfig::new(server.uri()).with_timeouts(
            Duration::from_millis(300),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ))
    }

    #[tokio::test]
    async fn sweeps_every_format_in_order() {
        let server = MockServer::start().await;
        // Only the nested metadata shape carries a `metadata` object.
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .and(body_partial_json(json!({"metadata": {"client_id": "client_x"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "pong"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .respond_with(ResponseTemplate::new(422))
            .expect(3)
            .mount(&server)
            .await;

        let transport = Transport::new().unwrap();
        let records = probe_for(&server)
            .probe_all(&transport, "client_x", None)
            .await;

        let names: Vec<&str> = records.iter().map(|r| r.format.as_str()).collect();
        assert_eq!(
            names,
            ["minimal", "with_language", "func_query", "nested_metadata"]
        );
        let outcomes: Vec<bool> = records.iter().map(|r| r.success).collect();
        assert_eq!(outcomes, [false, false, false, true]);
        assert!(records[..3].iter().all(|r| r.http_status == Some(422)));
        assert!(records.iter().all(|r| r.phase == AttemptPhase::Probe));
        assert_eq!(SchemaProbe::select(&records).map(|f| f.name), Some("nested_metadata"));
    }

    #[tokio::test]
    async fn query_variant_hits_suffixed_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .and(query_param("func", "chat"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let transport = Transport::new().unwrap();
        let records = probe_for(&server).probe_all(&transport, "c", None).await;
        assert_eq!(SchemaProbe::select(&records).map(|f| f.name), Some("func_query"));
    }

    #[tokio::test]
    async fn first_success_wins_even_if_slower() {
        let server = MockServer::start().await;
        // Only the minimal shape omits `language`; it answers slowest.
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .and(|req: &wiremock::Request| {
                req.body_json::<serde_json::Value>()
                    .map(|body| body.get("language").is_none())
                    .unwrap_or(false)
            })
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let probe = SchemaProbe::new(&ClientConfig::new(server.uri()).with_timeouts(
            Duration::from_secs(2),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ));
        let transport = Transport::new().unwrap();
        let records = probe.probe_all(&transport, "c", None).await;
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.success));
        assert_eq!(records[0].format, "minimal");
        assert!(records[0].latency_ms >= 400);
        assert!(records[1..].iter().all(|r| r.latency_ms < records[0].latency_ms));
        assert_eq!(SchemaProbe::select(&records).map(|f| f.name), Some("minimal"));
    }

    #[tokio::test]
    async fn unreachable_backend_records_errors_without_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = Transport::new().unwrap();
        let records = probe_for(&server).probe_all(&transport, "c", None).await;
        assert_eq!(records.len(), 4);
        for record in &records {
            assert!(!record.success);
            assert_eq!(record.http_status, None);
            assert!(record.error.as_deref().unwrap().contains("timed out"));
        }
        assert!(SchemaProbe::select(&records).is_none());
    }
}

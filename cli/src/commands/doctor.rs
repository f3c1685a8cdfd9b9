use chatlink_client::ChatClient;
use chatlink_core::HealthTier;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::util::{EXIT_OK, EXIT_REMOTE_ERROR, auth_hint, describe_token, emit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
enum Level {
    Ok,
    Warn,
    Error,
}

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: Level,
    detail: String,
}

#[derive(Default)]
struct Checks {
    items: Vec<Check>,
}

impl Checks {
    fn push(&mut self, name: &'static str, status: Level, detail: impl Into<String>) {
        self.items.push(Check {
            name,
            status,
            detail: detail.into(),
        });
    }

    fn overall(&self) -> Level {
        self.items
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(Level::Ok)
    }
}

/// Health, credentials and format negotiation in one report.
pub async fn run(client: &mut ChatClient) -> i32 {
    let mut checks = Checks::default();
    let base_url = client.config().base_url.clone();

    // 1. Backend reachable
    let status = client.check_health(true).await;
    let latency = status
        .latency_ms
        .map(|ms| format!("{ms}ms"))
        .unwrap_or_else(|| "-".to_string());
    match status.tier {
        HealthTier::Healthy => {
            checks.push("backend_reachable", Level::Ok, format!("{base_url} ({latency})"));
        }
        HealthTier::Degraded => {
            checks.push(
                "backend_reachable",
                Level::Warn,
                format!("{base_url} responded slowly ({latency})"),
            );
        }
        HealthTier::Down => {
            let reason = status.error.as_deref().unwrap_or("unreachable");
            checks.push("backend_reachable", Level::Error, format!("{base_url}: {reason}"));
            // Nothing else can succeed without a backend.
            return report(&checks, client);
        }
    }

    // 2. Auth configured
    let token = client.bearer_token();
    match token.as_deref() {
        Some(t) => checks.push("auth_configured", Level::Ok, describe_token(t)),
        None => checks.push(
            "auth_configured",
            Level::Warn,
            format!("No bearer token. {}", auth_hint()),
        ),
    }

    // 3. Format negotiation
    let records = client.probe_all(token.as_deref()).await;
    let accepted: Vec<&str> = records
        .iter()
        .filter(|r| r.success)
        .map(|r| r.format.as_str())
        .collect();
    if accepted.is_empty() {
        let last = records
            .iter()
            .rev()
            .find_map(|r| r.error.as_deref())
            .unwrap_or("no attempts made");
        checks.push(
            "format_negotiation",
            Level::Error,
            format!("no format accepted by the test endpoint (last error: {last})"),
        );
    } else {
        checks.push(
            "format_negotiation",
            Level::Ok,
            format!(
                "accepted: {}; using {}",
                accepted.join(", "),
                client.cached_format().unwrap_or("-")
            ),
        );
    }

    report(&checks, client)
}

fn report(checks: &Checks, client: &ChatClient) -> i32 {
    let overall = checks.overall();
    let output = json!({
        "checks": checks.items,
        "overall": overall,
        "client_id": client.client_id(),
        "diagnostics": client.ledger().summary(),
        "generated_at": Utc::now(),
    });
    let code = if overall == Level::Error {
        EXIT_REMOTE_ERROR
    } else {
        EXIT_OK
    };
    emit(&output, code)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chatlink_client::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::util::test_client;

    #[tokio::test]
    async fn down_backend_stops_after_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = test_client(&server.uri(), Arc::new(MemoryStore::new()));
        assert_eq!(run(&mut client).await, EXIT_REMOTE_ERROR);
        assert!(client.diagnostics().is_empty());
        assert_eq!(client.cached_format(), None);
    }

    #[tokio::test]
    async fn healthy_backend_with_accepted_format_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(4)
            .mount(&server)
            .await;

        let mut client = test_client(&server.uri(), Arc::new(MemoryStore::new()));
        assert_eq!(run(&mut client).await, EXIT_OK);
        assert_eq!(client.cached_format(), Some("minimal"));
        assert_eq!(client.diagnostics().len(), 4);
    }

    #[tokio::test]
    async fn rejected_formats_make_the_report_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/test"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let mut client = test_client(&server.uri(), Arc::new(MemoryStore::new()));
        assert_eq!(run(&mut client).await, EXIT_REMOTE_ERROR);
        assert_eq!(client.cached_format(), None);
    }

    #[test]
    fn overall_is_the_worst_check() {
        let mut checks = Checks::default();
        assert_eq!(checks.overall(), Level::Ok);
        checks.push("a", Level::Ok, "fine");
        checks.push("b", Level::Warn, "meh");
        assert_eq!(checks.overall(), Level::Warn);
        checks.push("c", Level::Error, "broken");
        checks.push("d", Level::Ok, "fine again");
        assert_eq!(checks.overall(), Level::Error);
    }

    #[test]
    fn levels_serialize_lowercase() {
        assert_eq!(json!(Level::Warn), json!("warn"));
    }
}

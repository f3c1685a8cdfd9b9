use chatlink_client::ChatClient;
use chatlink_core::HealthTier;

use crate::util::{EXIT_CONNECTION_ERROR, EXIT_OK, emit};

pub async fn run(client: &mut ChatClient, force: bool) -> i32 {
    let status = client.check_health(force).await;
    let code = match status.tier {
        HealthTier::Healthy | HealthTier::Degraded => EXIT_OK,
        HealthTier::Down => EXIT_CONNECTION_ERROR,
    };
    emit(&status, code)
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
    async fn down_backend_exits_with_connection_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = test_client(&server.uri(), Arc::new(MemoryStore::new()));
        assert_eq!(run(&mut client, false).await, EXIT_CONNECTION_ERROR);
        assert_eq!(client.connection_status().tier, HealthTier::Down);
    }

    #[tokio::test]
    async fn healthy_backend_exits_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut client = test_client(&server.uri(), Arc::new(MemoryStore::new()));
        assert_eq!(run(&mut client, true).await, EXIT_OK);
        assert_eq!(client.connection_status().tier, HealthTier::Healthy);
    }
}

use chatlink_client::ChatClient;
use serde_json::json;

use crate::util::{EXIT_OK, EXIT_REMOTE_ERROR, emit};

/// Re-run format negotiation and report every attempt.
pub async fn run(client: &mut ChatClient) -> i32 {
    let token = client.bearer_token();
    let records = client.probe_all(token.as_deref()).await;
    let accepted: Vec<&str> = records
        .iter()
        .filter(|r| r.success)
        .map(|r| r.format.as_str())
        .collect();

    let output = json!({
        "attempts": records,
        "accepted": accepted,
        "cached_format": client.cached_format(),
    });
    let code = if accepted.is_empty() {
        EXIT_REMOTE_ERROR
    } else {
        EXIT_OK
    };
    emit(&output, code)
}

use chatlink_client::ChatClient;
use chatlink_core::MessageContext;

use crate::util::{emit, exit_code_for_error};

pub async fn send(
    client: &mut ChatClient,
    message: &str,
    language: Option<String>,
    stream: bool,
) -> i32 {
    let context = MessageContext { language, stream };
    let reply = client.send(message, &context).await;
    if reply.degraded {
        tracing::warn!(
            error = reply.error.as_deref().unwrap_or("-"),
            "backend unavailable; showing fallback reply"
        );
    }
    emit(&reply, exit_code_for_error(reply.error.as_deref()))
}

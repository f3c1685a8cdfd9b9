use chatlink_client::ChatClient;
use serde_json::json;

use crate::util::{EXIT_OK, emit};

/// Forget the conversation (and, unless `format_only`, the negotiated format).
pub fn reset(client: &mut ChatClient, format_only: bool) -> i32 {
    let previous = client.conversation_id().map(str::to_string);
    if format_only {
        client.clear_format_cache();
    } else {
        client.reset();
    }
    emit(
        &json!({
            "reset": if format_only { "format" } else { "conversation_and_format" },
            "previous_conversation_id": previous,
            "conversation_id": client.conversation_id(),
            "cached_format": client.cached_format(),
        }),
        EXIT_OK,
    )
}

pub fn status(client: &ChatClient, state_location: &str) -> i32 {
    let mut output = json!(client.snapshot());
    output["state"] = json!(state_location);
    emit(&output, EXIT_OK)
}

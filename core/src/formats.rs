//! Request shapes the chat backend has been observed to accept.
//!
//! The backend's contract changes without notice, so the client keeps a list of
//! candidate shapes and discovers which one is currently accepted. Order is
//! priority: probes walk the list front to back and the first success wins.

use serde_json::{Value, json};

use crate::message::PayloadInput;

/// Query suffix some deployments need to route to the chat handler.
pub const FUNC_CHAT_SUFFIX: &str = "?func=chat";

/// One candidate request shape.
#[derive(Clone, Copy)]
pub struct CandidateSchema {
    pub name: &'static str,
    /// Appended verbatim to the endpoint URL. Empty for most formats.
    pub endpoint_suffix: &'static str,
    build: fn(&PayloadInput<'_>) -> Value,
}

impl CandidateSchema {
    pub fn build_payload(&self, input: &PayloadInput<'_>) -> Value {
        (self.build)(input)
    }

    pub fn endpoint(&self, base: &str) -> String {
        format!("{base}{}", self.endpoint_suffix)
    }
}

impl std::fmt::Debug for CandidateSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateSchema")
            .field("name", &self.name)
            .field("endpoint_suffix", &self.endpoint_suffix)
            .finish()
    }
}

impl PartialEq for CandidateSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

fn minimal(input: &PayloadInput<'_>) -> Value {
    json!({
        "message": input.message,
        "client_id": input.client_id,
        "conversation_id": input.conversation_id,
    })
}

fn with_language(input: &PayloadInput<'_>) -> Value {
    json!({
        "message": input.message,
        "client_id": input.client_id,
        "conversation_id": input.conversation_id,
        "language": input.context.language(),
        "stream": input.context.stream,
    })
}

fn nested_metadata(input: &PayloadInput<'_>) -> Value {
    json!({
        "message": input.message,
        "conversation_id": input.conversation_id,
        "language": input.context.language(),
        "stream": input.context.stream,
        "metadata": {
            "client_id": input.client_id,
            "timestamp": input.timestamp.to_rfc3339(),
        },
    })
}

const FORMATS: [CandidateSchema; 4] = [
    CandidateSchema {
        name: "minimal",
        endpoint_suffix: "",
        build: minimal,
    },
    CandidateSchema {
        name: "with_language",
        endpoint_suffix: "",
        build: with_language,
    },
    CandidateSchema {
        name: "func_query",
        endpoint_suffix: FUNC_CHAT_SUFFIX,
        build: with_language,
    },
    CandidateSchema {
        name: "nested_metadata",
        endpoint_suffix: "",
        build: nested_metadata,
    },
];

/// All candidate formats in probe order.
pub fn all_formats() -> &'static [CandidateSchema] {
    &FORMATS
}

/// The format used when nothing has been negotiated yet.
pub fn default_format() -> &'static CandidateSchema {
    &FORMATS[0]
}

pub fn find(name: &str) -> Option<&'static CandidateSchema> {
    FORMATS.iter().find(|f| f.name == name)
}

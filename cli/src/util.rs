use std::path::PathBuf;
use std::sync::Arc;

use chatlink_client::config::{DEFAULT_API_URL, DEFAULT_API_VERSION};
use chatlink_client::token::API_KEY_ENV;
use chatlink_client::{
    ChatClient, ClientConfig, EnvToken, FileStore, MemoryStore, StateStore, StaticToken,
    TokenProvider,
};
use chatlink_core::error::codes;
use clap::Args;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const EXIT_OK: i32 = 0;
pub const EXIT_REMOTE_ERROR: i32 = 1;
pub const EXIT_CONNECTION_ERROR: i32 = 3;
pub const EXIT_USAGE_ERROR: i32 = 4;

const DEFAULT_LOG_FILTER: &str = "chatlink_client=info,chatlink_cli=info";

/// Where the backend lives and how this process identifies itself to it.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Chat backend base URL
    #[arg(long, env = "CHATLINK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API version path segment
    #[arg(long, env = "CHATLINK_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Bearer token (falls back to CHATLINK_API_KEY at request time)
    #[arg(long)]
    pub token: Option<String>,

    /// State file holding client id, conversation and negotiated format
    #[arg(long, env = "CHATLINK_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Keep state in memory only; nothing is read from or written to disk
    #[arg(long)]
    pub ephemeral: bool,
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", render(&err));
    std::process::exit(EXIT_USAGE_ERROR);
}

/// Pretty JSON on stdout for success, on stderr otherwise. Returns `exit_code`.
pub fn emit<T: Serialize>(value: &T, exit_code: i32) -> i32 {
    let formatted = render(value);
    if exit_code == EXIT_OK {
        println!("{formatted}");
    } else {
        eprintln!("{formatted}");
    }
    exit_code
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| json!({"error": "cli_error", "message": e.to_string()}).to_string())
}

/// Exit code for a machine-readable error code carried by a reply.
pub fn exit_code_for_error(code: Option<&str>) -> i32 {
    match code {
        None => EXIT_OK,
        Some(codes::AUTH_REQUIRED) | Some(codes::EMPTY_MESSAGE) => EXIT_USAGE_ERROR,
        Some(codes::NETWORK_UNAVAILABLE) => EXIT_CONNECTION_ERROR,
        Some(_) => EXIT_REMOTE_ERROR,
    }
}

pub fn init_tracing(json_logs: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let plain = (!json_logs).then(|| fmt::layer().with_writer(std::io::stderr));
    let structured = json_logs.then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .init();
}

pub fn build_client(args: &ConnectionArgs) -> ChatClient {
    let config = ClientConfig::new(&args.api_url)
        .with_api_version(args.api_version.clone())
        .with_env_overrides();

    let store: Arc<dyn StateStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let path = args.state_file.clone().unwrap_or_else(FileStore::default_path);
        Arc::new(FileStore::open(path))
    };

    let tokens: Arc<dyn TokenProvider> = match args.token.as_deref() {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(EnvToken::default()),
    };

    ChatClient::new(config, store, tokens).unwrap_or_else(|e| {
        exit_error(
            &e.to_string(),
            Some("Check --api-url / CHATLINK_API_URL and --api-version."),
        )
    })
}

/// Short, non-secret description of the configured credential.
pub fn describe_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}... ({} chars)", token.chars().count())
}

pub fn auth_hint() -> String {
    format!("Pass --token or set {API_KEY_ENV}.")
}

/// Client against `base_url` with in-memory state and a fixed token.
#[cfg(test)]
pub(crate) fn test_client(base_url: &str, store: Arc<dyn StateStore>) -> ChatClient {
    use std::time::Duration;

    let config = ClientConfig::new(base_url).with_timeouts(
        Duration::from_secs(1),
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken::new("tok"));
    ChatClient::new(config, store, tokens).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_exit_codes() {
        assert_eq!(exit_code_for_error(None), EXIT_OK);
        assert_eq!(exit_code_for_error(Some(codes::AUTH_REQUIRED)), EXIT_USAGE_ERROR);
        assert_eq!(exit_code_for_error(Some(codes::EMPTY_MESSAGE)), EXIT_USAGE_ERROR);
        assert_eq!(
            exit_code_for_error(Some(codes::NETWORK_UNAVAILABLE)),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(exit_code_for_error(Some(codes::SERVER_ERROR)), EXIT_REMOTE_ERROR);
        assert_eq!(
            exit_code_for_error(Some(codes::VALIDATION_REJECTED)),
            EXIT_REMOTE_ERROR
        );
    }

    #[test]
    fn token_description_hides_the_secret() {
        let described = describe_token("sk-live-0123456789abcdef");
        assert_eq!(described, "sk-liv... (24 chars)");
    }
}

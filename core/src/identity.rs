use rand::Rng;

const CLIENT_ID_PREFIX: &str = "client_";

/// Generate a client installation id.
/// Format: `client_` + 16 random bytes hex-encoded.
pub fn generate_client_id() -> String {
    format!("{CLIENT_ID_PREFIX}{}", random_hex(16))
}

/// Whether a persisted id is usable. Ids from other installers are fine as long
/// as they are non-blank and free of whitespace.
pub fn is_valid_client_id(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && !id.chars().any(char::is_whitespace)
}

/// Generate `n` random bytes and return as hex string.
fn random_hex(n: usize) -> String {
    let bytes: Vec<u8> = (0..n).map(|_| rand::thread_rng().r#gen::<u8>()).collect();
    hex::encode(&bytes)
}

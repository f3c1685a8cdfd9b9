//! Bearer credentials for the message endpoint.
//!
//! Issuing and refreshing tokens belongs to the identity provider; the client only
//! asks for the current token right before each send.

pub const API_KEY_ENV: &str = "CHATLINK_API_KEY";

pub trait TokenProvider: Send + Sync {
    /// The current bearer token, or `None` when the user has to authenticate.
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token (or a fixed absence of one).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        non_blank(self.0.clone())
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(API_KEY_ENV)
    }
}

impl TokenProvider for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        non_blank(std::env::var(&self.var).ok())
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        non_blank(self())
    }
}

fn non_blank(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token() {
        assert_eq!(StaticToken::new("abc").bearer_token().as_deref(), Some("abc"));
        assert_eq!(StaticToken::none().bearer_token(), None);
    }

    #[test]
    fn blank_tokens_count_as_missing() {
        assert_eq!(StaticToken::new("   ").bearer_token(), None);
        assert_eq!(StaticToken::new(" tok ").bearer_token().as_deref(), Some("tok"));
    }

    #[test]
    fn closure_provider() {
        let provider = || Some("from-closure".to_string());
        assert_eq!(provider.bearer_token().as_deref(), Some("from-closure"));
    }

    #[test]
    fn env_provider_reads_named_var() {
        // A name no other test touches.
        let provider = EnvToken::new("CHATLINK_TEST_TOKEN_UNSET_9F2C");
        assert_eq!(provider.bearer_token(), None);
    }
}

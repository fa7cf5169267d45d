/// Supplies a bearer token for each request.
///
/// Tokens are short-lived, so callers ask again before every request rather
/// than caching a value. `None` means anonymous access.
#[async_trait::async_trait]
pub trait AuthTokenProvider: Send + Sync {
    async fn token(&self) -> Option<String>;
}

/// Never sends a token.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

#[async_trait::async_trait]
impl AuthTokenProvider for Anonymous {
    async fn token(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl AuthTokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call, so a token
/// rotated by an outside process is picked up mid-poll.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait::async_trait]
impl AuthTokenProvider for EnvToken {
    async fn token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

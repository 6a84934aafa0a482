//! Token seam for the external identity provider.

use async_trait::async_trait;

/// Supplies the bearer token for authenticated API calls.
///
/// Implementations wrap the identity provider. The client asks for the
/// token fresh on every call and never caches it; caching beyond the
/// provider's own defaults is the provider's business.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current bearer token, or None when no session exists.
    async fn bearer_token(&self) -> Option<String>;
}

/// Provider for a signed-out session: every authenticated call fails with
/// `Unauthenticated` before any network traffic.
pub struct NoSession;

#[async_trait]
impl TokenProvider for NoSession {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Fixed-token provider, mainly for tests and scripted use.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

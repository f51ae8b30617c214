use async_trait::async_trait;

/// Re-derives a currently valid link for a stored image URL.
///
/// Implementations must never fail: when a URL cannot be refreshed the
/// original is returned unchanged.
#[async_trait]
pub trait UrlRefresher: Send + Sync {
    async fn refresh_url(&self, previous_url: &str) -> String;
}

/// Refresher that hands every URL back untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRefresher;

#[async_trait]
impl UrlRefresher for PassthroughRefresher {
    async fn refresh_url(&self, previous_url: &str) -> String {
        previous_url.to_string()
    }
}

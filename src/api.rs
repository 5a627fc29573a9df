use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::Result,
    types::{ContentPage, DetailQuery, ListQuery},
};

/// Core abstraction over the remote content API
///
/// Implementors provide read-only access to list and detail endpoints of a
/// headless CMS service. The concrete implementation talks HTTP; tests
/// substitute in-memory implementations.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Fetch one page of records from an endpoint
    ///
    /// Returns `FetchError::NotFound` if the endpoint doesn't exist
    async fn fetch_page(&self, endpoint: &str, query: &ListQuery) -> Result<ContentPage>;

    /// Fetch a single record by its identifier
    ///
    /// Returns `FetchError::Status` for any non-200 response
    async fn fetch_content(
        &self,
        endpoint: &str,
        content_id: &str,
        query: &DetailQuery,
    ) -> Result<Value>;

    /// Get a human-readable identifier for this API (for logging/debugging)
    fn identifier(&self) -> String;
}

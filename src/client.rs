use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::{
    api::ContentApi,
    credentials::{CredentialCheck, Credentials},
    error::{FetchError, Result},
    types::{ContentPage, DetailQuery, ListQuery},
};

/// Header carrying the API key on every request
const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Hard cap on any single request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// microCMS-backed implementation of [`ContentApi`]
///
/// Fetches content using:
/// - `{base}/api/v1/{endpoint}` for listings
/// - `{base}/api/v1/{endpoint}/{id}` for single records
#[derive(Clone)]
pub struct MicrocmsClient {
    client: Client,
    credentials: Credentials,
    base_url: String,
}

impl MicrocmsClient {
    /// Create a client for the service domain the credentials name
    pub fn new(credentials: Credentials) -> Self {
        let base_url = format!("https://{}.microcms.io", credentials.service_domain());
        Self::with_base_url(credentials, base_url)
    }

    /// Create a client against an explicit base URL
    ///
    /// # Arguments
    /// * `credentials` - Service credentials; the API key is sent on every request
    /// * `base_url` - Scheme and host, without the `/api/v1` suffix
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("microcms-fetch/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build the listing URL for an endpoint
    fn list_url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, endpoint)
    }

    /// Build the URL for a single record
    fn detail_url(&self, endpoint: &str, content_id: &str) -> String {
        format!("{}/api/v1/{}/{}", self.base_url, endpoint, content_id)
    }

    fn get(&self, url: &str, pairs: &[(&'static str, String)]) -> RequestBuilder {
        self.client
            .get(url)
            .header(API_KEY_HEADER, self.credentials.api_key())
            .query(pairs)
    }

    /// Probe the service and report whether the API key is usable
    ///
    /// A 401 answer is a definite rejection and fails with
    /// `FetchError::InvalidApiKey`. A transport-level failure reports
    /// [`CredentialCheck::Inconclusive`] instead of an error; any other
    /// answer counts as [`CredentialCheck::Verified`].
    pub async fn verify_credentials(&self) -> Result<CredentialCheck> {
        let url = format!("{}/api/v1/", self.base_url);

        let response = match self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.credentials.api_key())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Credential probe did not reach the service: {}", e);
                return Ok(CredentialCheck::Inconclusive);
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(FetchError::InvalidApiKey);
        }

        Ok(CredentialCheck::Verified)
    }
}

#[async_trait]
impl ContentApi for MicrocmsClient {
    async fn fetch_page(&self, endpoint: &str, query: &ListQuery) -> Result<ContentPage> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(FetchError::MissingInput { field: "Endpoint" });
        }

        let url = self.list_url(endpoint);
        debug!("GET {}", url);

        let response = self.get(&url, &query.query_pairs()).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(FetchError::InvalidApiKey),
            StatusCode::NOT_FOUND => Err(FetchError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            status if status.is_server_error() => Err(FetchError::Server {
                status: status.as_u16(),
            }),
            status if status.is_client_error() => {
                let status = status.as_u16();
                let message = response
                    .text()
                    .await
                    .ok()
                    .and_then(|body| serde_json::from_str::<Value>(&body).ok())
                    .and_then(|data| {
                        data.get("message").and_then(Value::as_str).map(String::from)
                    })
                    .unwrap_or_else(|| format!("HTTP {}", status));
                Err(FetchError::Api { status, message })
            }
            _ => {
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
        }
    }

    async fn fetch_content(
        &self,
        endpoint: &str,
        content_id: &str,
        query: &DetailQuery,
    ) -> Result<Value> {
        let url = self.detail_url(endpoint, content_id);
        debug!("GET {}", url);

        let response = self.get(&url, &query.query_pairs()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn identifier(&self) -> String {
        format!("microcms://{}", self.credentials.service_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> MicrocmsClient {
        let credentials = Credentials::new("my-service", "test-key").unwrap();
        MicrocmsClient::new(credentials)
    }

    #[test]
    fn test_urls_derive_from_service_domain() {
        let client = test_client();
        assert_eq!(
            client.list_url("blogs"),
            "https://my-service.microcms.io/api/v1/blogs"
        );
        assert_eq!(
            client.detail_url("blogs", "a1"),
            "https://my-service.microcms.io/api/v1/blogs/a1"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let credentials = Credentials::new("my-service", "test-key").unwrap();
        let client = MicrocmsClient::with_base_url(credentials, "http://127.0.0.1:9999/");
        assert_eq!(client.list_url("news"), "http://127.0.0.1:9999/api/v1/news");
    }

    #[test]
    fn test_identifier() {
        assert_eq!(test_client().identifier(), "microcms://my-service");
    }

    #[tokio::test]
    async fn test_fetch_page_requires_endpoint() {
        let client = test_client();
        let err = client
            .fetch_page("   ", &ListQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Endpoint is required");
    }
}

use crate::error::{FetchError, Result};

/// Environment variable holding the service domain
pub const SERVICE_DOMAIN_ENV: &str = "MICROCMS_SERVICE_DOMAIN";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "MICROCMS_API_KEY";

/// Access credentials for a microCMS service
///
/// Both values are trimmed on construction and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    service_domain: String,
    api_key: String,
}

impl Credentials {
    /// Create credentials from explicit values
    ///
    /// # Arguments
    /// * `service_domain` - The `xxxx` of `https://xxxx.microcms.io`
    /// * `api_key` - Key sent in the `X-MICROCMS-API-KEY` header
    ///
    /// Returns `FetchError::MissingInput` when either value is empty or
    /// whitespace.
    pub fn new(service_domain: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let service_domain = service_domain.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();

        if service_domain.is_empty() {
            return Err(FetchError::MissingInput {
                field: "Service domain",
            });
        }
        if api_key.is_empty() {
            return Err(FetchError::MissingInput { field: "API key" });
        }

        Ok(Self {
            service_domain,
            api_key,
        })
    }

    /// Read credentials from the environment
    ///
    /// Looks up `MICROCMS_SERVICE_DOMAIN` and `MICROCMS_API_KEY`; a missing
    /// variable fails the same way as an empty explicit value.
    pub fn from_env() -> Result<Self> {
        let service_domain = std::env::var(SERVICE_DOMAIN_ENV).unwrap_or_default();
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(service_domain, api_key)
    }

    pub fn service_domain(&self) -> &str {
        &self.service_domain
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Outcome of a credential probe
///
/// Only a definite rejection by the service is conclusive; transport
/// failures and unexpected responses leave validity undetermined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// The service answered without rejecting the key
    Verified,
    /// The probe could not determine whether the key is valid
    Inconclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_values() {
        let credentials = Credentials::new("  my-service  ", " key-123 ").unwrap();
        assert_eq!(credentials.service_domain(), "my-service");
        assert_eq!(credentials.api_key(), "key-123");
    }

    #[test]
    fn test_empty_service_domain_rejected() {
        let err = Credentials::new("   ", "key").unwrap_err();
        assert_eq!(err.to_string(), "Service domain is required");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let err = Credentials::new("my-service", "").unwrap_err();
        assert_eq!(err.to_string(), "API key is required");
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(SERVICE_DOMAIN_ENV, "env-service");
        std::env::set_var(API_KEY_ENV, "env-key");

        let credentials = Credentials::from_env().unwrap();
        assert_eq!(credentials.service_domain(), "env-service");
        assert_eq!(credentials.api_key(), "env-key");

        std::env::remove_var(SERVICE_DOMAIN_ENV);
        std::env::remove_var(API_KEY_ENV);

        assert!(matches!(
            Credentials::from_env(),
            Err(FetchError::MissingInput { .. })
        ));
    }
}

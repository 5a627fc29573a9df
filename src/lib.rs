pub mod api;
pub mod bulk;
pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

pub use api::ContentApi;
pub use bulk::{BulkFetcher, FetchEvent};
pub use client::MicrocmsClient;
pub use credentials::{CredentialCheck, Credentials};
pub use error::{FetchError, Result};
pub use types::{AggregateResult, ContentPage, DetailFailure, DetailQuery, ListQuery};

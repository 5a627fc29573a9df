use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::{
    api::ContentApi,
    error::{FetchError, Result},
    types::{AggregateResult, DetailFailure, DetailQuery, ListQuery},
};

/// Default number of detail fetches in flight
pub const DEFAULT_CONCURRENCY: usize = 5;

const CONCURRENCY_MIN: usize = 1;
const CONCURRENCY_MAX: usize = 10;

/// A progress event is emitted once per this many completions
const PROGRESS_INTERVAL: usize = 5;

/// Buffer of the event channel handed to the consumer
const EVENT_BUFFER: usize = 32;

/// One notification from a running full-contents fetch
///
/// Exactly one terminal event ends every run: `Finished` when an aggregate
/// was produced (even one where every record failed), `Failed` when input
/// validation or the listing phase aborted the run.
#[derive(Debug)]
pub enum FetchEvent {
    /// Informational text notice
    Info(String),
    /// Cumulative completion count across the detail fetches
    Progress { completed: usize, total: usize },
    /// Terminal: the combined result
    Finished(AggregateResult),
    /// Terminal: the run aborted before any aggregate existed
    Failed(FetchError),
}

/// Outcome of one detail fetch, reported by a worker task
enum DetailOutcome {
    Success(Value),
    Failure(DetailFailure),
}

/// Two-phase fetcher that expands a listing into full content records
///
/// Lists identifiers first with a minimal projection, then fans the detail
/// fetches out across a bounded number of concurrent workers. A failing
/// record never aborts the run; its error is collected alongside the
/// successes of its siblings.
pub struct BulkFetcher {
    api: Arc<dyn ContentApi>,
    semaphore: Arc<Semaphore>,
}

impl BulkFetcher {
    /// Create a fetcher with the default concurrency
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self::with_concurrency(api, DEFAULT_CONCURRENCY)
    }

    /// Create a fetcher with an explicit concurrency, clamped into [1, 10]
    pub fn with_concurrency(api: Arc<dyn ContentApi>, concurrency: usize) -> Self {
        Self {
            api,
            semaphore: Arc::new(Semaphore::new(
                concurrency.clamp(CONCURRENCY_MIN, CONCURRENCY_MAX),
            )),
        }
    }

    /// Start a full-contents fetch and return its event stream
    ///
    /// The returned stream yields `Info` and `Progress` events while the
    /// fetch runs and ends with a single terminal event. Dropping the stream
    /// does not cancel the work already in flight.
    ///
    /// `list_query` controls which identifiers are listed; its field
    /// projection is replaced by `id`. `detail_query` applies to every
    /// per-record fetch.
    pub fn fetch_all(
        &self,
        endpoint: &str,
        list_query: ListQuery,
        detail_query: DetailQuery,
    ) -> ReceiverStream<FetchEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let api = self.api.clone();
        let semaphore = self.semaphore.clone();
        let endpoint = endpoint.trim().to_string();

        tokio::spawn(async move {
            run_fetch(api, semaphore, endpoint, list_query, detail_query, tx).await;
        });

        ReceiverStream::new(rx)
    }

    /// Run a full-contents fetch to completion and return the aggregate
    ///
    /// Drains the event stream, discarding notices. A stream that ends
    /// without a terminal event reports `FetchError::Incomplete`.
    pub async fn collect_all(
        &self,
        endpoint: &str,
        list_query: ListQuery,
        detail_query: DetailQuery,
    ) -> Result<AggregateResult> {
        let mut events = self.fetch_all(endpoint, list_query, detail_query);

        while let Some(event) = events.next().await {
            match event {
                FetchEvent::Finished(result) => return Ok(result),
                FetchEvent::Failed(e) => return Err(e),
                FetchEvent::Info(_) | FetchEvent::Progress { .. } => {}
            }
        }

        Err(FetchError::Incomplete)
    }
}

/// Narrow a listing query to the identifier-only projection
///
/// Keeps pagination, ordering, search and filters; forces `fields` to `id`
/// and drops everything that only affects record bodies.
fn id_projection(query: &ListQuery) -> ListQuery {
    ListQuery {
        limit: query.limit,
        offset: query.offset,
        orders: query.orders.clone(),
        q: query.q.clone(),
        filters: query.filters.clone(),
        fields: Some("id".to_string()),
        ids: None,
        depth: None,
        draft_key: None,
        rich_editor_format: None,
    }
}

async fn run_fetch(
    api: Arc<dyn ContentApi>,
    semaphore: Arc<Semaphore>,
    endpoint: String,
    list_query: ListQuery,
    detail_query: DetailQuery,
    tx: mpsc::Sender<FetchEvent>,
) {
    // Event sends are best-effort throughout: a consumer that dropped the
    // stream must not abort collection.
    if endpoint.is_empty() {
        let _ = tx
            .send(FetchEvent::Failed(FetchError::MissingInput {
                field: "Endpoint",
            }))
            .await;
        return;
    }

    let source = api.identifier();
    debug!("Fetching full contents of '{}' from {}", endpoint, source);

    let _ = tx
        .send(FetchEvent::Info(
            "Step 1: Retrieving content list...".to_string(),
        ))
        .await;

    let page = match api.fetch_page(&endpoint, &id_projection(&list_query)).await {
        Ok(page) => page,
        Err(e) => {
            let _ = tx.send(FetchEvent::Failed(e)).await;
            return;
        }
    };

    let ids = match page.content_ids() {
        Ok(ids) => ids,
        Err(e) => {
            let _ = tx.send(FetchEvent::Failed(e)).await;
            return;
        }
    };

    if ids.is_empty() {
        let _ = tx
            .send(FetchEvent::Info(
                "No content found matching the criteria".to_string(),
            ))
            .await;
        let _ = tx
            .send(FetchEvent::Finished(AggregateResult::empty(&page)))
            .await;
        return;
    }

    let _ = tx
        .send(FetchEvent::Info(format!(
            "Found {} content items. Step 2: Fetching full details...",
            ids.len()
        )))
        .await;

    let total = ids.len();

    // Sized so every worker can report without waiting on the collector
    let (outcome_tx, mut outcome_rx) = mpsc::channel(total);

    for content_id in ids {
        let api = api.clone();
        let semaphore = semaphore.clone();
        let endpoint = endpoint.clone();
        let detail_query = detail_query.clone();
        let outcome_tx = outcome_tx.clone();

        tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");

            let outcome = match api.fetch_content(&endpoint, &content_id, &detail_query).await {
                Ok(value) => DetailOutcome::Success(value),
                Err(e) => DetailOutcome::Failure(DetailFailure {
                    content_id,
                    error: e.to_string(),
                }),
            };

            let _ = outcome_tx.send(outcome).await;
        });
    }
    drop(outcome_tx);

    let mut contents = Vec::new();
    let mut errors = Vec::new();
    let mut completed = 0;

    while completed < total {
        match outcome_rx.recv().await {
            Some(outcome) => {
                completed += 1;
                match outcome {
                    DetailOutcome::Success(value) => contents.push(value),
                    DetailOutcome::Failure(failure) => {
                        debug!(
                            "Detail fetch failed for '{}': {}",
                            failure.content_id, failure.error
                        );
                        errors.push(failure);
                    }
                }

                if completed % PROGRESS_INTERVAL == 0 || completed == total {
                    let _ = tx.send(FetchEvent::Progress { completed, total }).await;
                }
            }
            None => {
                warn!("A detail task stopped without reporting an outcome");
                break;
            }
        }
    }

    let _ = tx
        .send(FetchEvent::Info(format!(
            "Completed! Retrieved {} full content details from endpoint '{}' (total available: {})",
            contents.len(),
            endpoint,
            page.total_count
        )))
        .await;

    if !errors.is_empty() {
        let _ = tx
            .send(FetchEvent::Info(format!(
                "Warning: {} items failed to retrieve",
                errors.len()
            )))
            .await;
    }

    let _ = tx
        .send(FetchEvent::Finished(AggregateResult {
            total_count: page.total_count,
            limit: page.limit,
            offset: page.offset,
            contents,
            errors,
        }))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentPage;
    use async_trait::async_trait;

    struct NullApi;

    #[async_trait]
    impl ContentApi for NullApi {
        async fn fetch_page(&self, _: &str, _: &ListQuery) -> Result<ContentPage> {
            Err(FetchError::NotFound)
        }

        async fn fetch_content(&self, _: &str, _: &str, _: &DetailQuery) -> Result<Value> {
            Err(FetchError::NotFound)
        }

        fn identifier(&self) -> String {
            "null://".to_string()
        }
    }

    fn null_api() -> Arc<dyn ContentApi> {
        Arc::new(NullApi)
    }

    #[test]
    fn test_concurrency_clamped() {
        assert_eq!(
            BulkFetcher::with_concurrency(null_api(), 50)
                .semaphore
                .available_permits(),
            10
        );
        assert_eq!(
            BulkFetcher::with_concurrency(null_api(), 0)
                .semaphore
                .available_permits(),
            1
        );
        assert_eq!(BulkFetcher::new(null_api()).semaphore.available_permits(), 5);
    }

    #[test]
    fn test_id_projection_forces_fields() {
        let query = ListQuery {
            q: Some("search".to_string()),
            fields: Some("title,body".to_string()),
            draft_key: Some("k".to_string()),
            ..Default::default()
        };

        let projected = id_projection(&query);
        assert_eq!(projected.fields.as_deref(), Some("id"));
        assert_eq!(projected.q.as_deref(), Some("search"));
        assert_eq!(projected.limit, Some(10));
        assert!(projected.depth.is_none());
        assert!(projected.draft_key.is_none());
        assert!(projected.rich_editor_format.is_none());
    }

    #[tokio::test]
    async fn test_empty_endpoint_rejected() {
        let fetcher = BulkFetcher::new(null_api());
        let err = fetcher
            .collect_all("   ", ListQuery::default(), DetailQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Endpoint is required");
    }

    #[tokio::test]
    async fn test_listing_error_surfaces_as_failed_event() {
        let fetcher = BulkFetcher::new(null_api());
        let mut events = fetcher.fetch_all("blogs", ListQuery::default(), DetailQuery::default());

        let mut saw_failed = false;
        while let Some(event) = events.next().await {
            match event {
                FetchEvent::Failed(FetchError::NotFound) => saw_failed = true,
                FetchEvent::Finished(_) => panic!("run must not finish after a listing error"),
                _ => {}
            }
        }
        assert!(saw_failed);
    }
}

/// Fetch every record of an endpoint with full details
///
/// Reads `MICROCMS_SERVICE_DOMAIN` and `MICROCMS_API_KEY` from the
/// environment, lists the `blogs` endpoint, then expands each record while
/// printing the notices and progress the fetch emits.

use std::sync::Arc;

use futures::StreamExt;
use microcms_fetch::{
    BulkFetcher, ContentApi, Credentials, DetailQuery, FetchEvent, ListQuery, MicrocmsClient,
};

#[tokio::main]
async fn main() -> microcms_fetch::Result<()> {
    let credentials = Credentials::from_env()?;
    let client = MicrocmsClient::new(credentials);

    let page = client.fetch_page("blogs", &ListQuery::default()).await?;
    println!("{}", page.summary("blogs"));

    let fetcher = BulkFetcher::new(Arc::new(client) as Arc<dyn ContentApi>);
    let mut events = fetcher.fetch_all("blogs", ListQuery::default(), DetailQuery::default());

    while let Some(event) = events.next().await {
        match event {
            FetchEvent::Info(text) => println!("{}", text),
            FetchEvent::Progress { completed, total } => {
                println!("Progress: {}/{} items fetched...", completed, total);
            }
            FetchEvent::Finished(result) => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            FetchEvent::Failed(e) => return Err(e),
        }
    }

    Ok(())
}

use tollgate_application::AnalyticsStore;
use tollgate_core::AppResult;

use super::InMemoryAnalyticsStore;

#[tokio::test]
async fn counts_requests_blocks_sources_and_endpoints() -> AppResult<()> {
    let store = InMemoryAnalyticsStore::new();
    store
        .record_request("203.0.113.7", "/api/properties/search", false)
        .await?;
    store
        .record_request("203.0.113.7", "/api/properties/search", true)
        .await?;
    store
        .record_request("198.51.100.1", "/api/properties/12", false)
        .await?;

    let counters = store.counters().await?;

    assert_eq!(counters.total_requests, 3);
    assert_eq!(counters.blocked_requests, 1);
    assert_eq!(counters.unique_sources, 2);
    let mut endpoints = counters.endpoint_counts;
    endpoints.sort();
    assert_eq!(
        endpoints,
        vec![
            ("/api/properties/12".to_owned(), 1),
            ("/api/properties/search".to_owned(), 2),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn empty_store_reports_zeroes() -> AppResult<()> {
    let counters = InMemoryAnalyticsStore::new().counters().await?;

    assert_eq!(counters.total_requests, 0);
    assert_eq!(counters.unique_sources, 0);
    assert!(counters.endpoint_counts.is_empty());
    Ok(())
}

use chrono::{Duration, TimeZone, Utc};
use tollgate_application::ViolationLog;
use tollgate_core::AppResult;
use tollgate_domain::Violation;

use super::InMemoryViolationLog;

fn violation_at(source_id: &str, minutes_ago: i64) -> Violation {
    let now = Utc
        .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    Violation::new(
        source_id,
        "/api/properties/search",
        now - Duration::minutes(minutes_ago),
        101,
        100,
    )
}

#[tokio::test]
async fn entries_are_ordered_by_occurrence_regardless_of_append_order() -> AppResult<()> {
    let log = InMemoryViolationLog::new();
    let newest = violation_at("203.0.113.7", 1);
    let oldest = violation_at("198.51.100.1", 30);
    let middle = violation_at("198.51.100.2", 10);
    log.append(&newest).await?;
    log.append(&oldest).await?;
    log.append(&middle).await?;

    let since = oldest.occurred_at - Duration::minutes(1);
    let ascending: Vec<Violation> = log
        .entries_since(since)
        .await?
        .iter()
        .map(|entry| entry.decode())
        .collect::<AppResult<_>>()?;
    assert_eq!(ascending, vec![oldest.clone(), middle.clone(), newest.clone()]);

    let latest: Vec<Violation> = log
        .latest(2)
        .await?
        .iter()
        .map(|entry| entry.decode())
        .collect::<AppResult<_>>()?;
    assert_eq!(latest, vec![newest, middle]);
    Ok(())
}

#[tokio::test]
async fn prune_removes_only_entries_before_cutoff() -> AppResult<()> {
    let log = InMemoryViolationLog::new();
    let stale = violation_at("203.0.113.7", 25 * 60);
    let fresh = violation_at("203.0.113.7", 5);
    log.append(&stale).await?;
    log.append(&fresh).await?;

    let pruned = log.prune_before(fresh.occurred_at - Duration::hours(24)).await?;

    assert_eq!(pruned, 1);
    assert_eq!(log.latest(10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn source_counts_survive_pruning() -> AppResult<()> {
    let log = InMemoryViolationLog::new();
    let stale = violation_at("203.0.113.7", 25 * 60);
    log.append(&stale).await?;
    assert_eq!(log.increment_source_count("203.0.113.7").await?, 1);
    assert_eq!(log.increment_source_count("203.0.113.7").await?, 2);

    log.prune_before(stale.occurred_at + Duration::hours(1)).await?;

    assert_eq!(
        log.source_counts().await?,
        vec![("203.0.113.7".to_owned(), 2)]
    );
    Ok(())
}

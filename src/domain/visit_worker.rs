//! Background persistence of redirect visits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::entities::NewRedirectVisit;
use crate::domain::repositories::VisitRepository;
use crate::domain::visit_event::VisitEvent;

/// Attempts per event, including the first one.
pub const MAX_ATTEMPTS: usize = 3;

fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(10)
        .factor(5)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(MAX_ATTEMPTS - 1)
}

/// Drains `rx` and records every event through `repository`.
///
/// At most `concurrency` writes are in flight at once. Each write is retried
/// up to [`MAX_ATTEMPTS`] times; an event that still fails is logged, counted
/// in `visits_failed_total` and discarded. Returns once the channel is closed
/// and every in-flight write has finished.
pub async fn run_visit_worker<R>(
    mut rx: mpsc::Receiver<VisitEvent>,
    repository: Arc<R>,
    concurrency: usize,
) where
    R: VisitRepository + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(ev) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            let _permit = permit;
            record_with_retry(repository.as_ref(), ev).await;
        });
    }

    // Wait for in-flight writes.
    let _ = permits.acquire_many(concurrency as u32).await;
    tracing::info!("Visit worker stopped");
}

async fn record_with_retry<R>(repository: &R, ev: VisitEvent)
where
    R: VisitRepository + ?Sized,
{
    let short_code = ev.short_code.clone();
    let visit: NewRedirectVisit = ev.into();

    let result = Retry::spawn(retry_strategy(), || {
        let visit = visit.clone();
        async move { repository.record(visit).await }
    })
    .await;

    match result {
        Ok(recorded) => {
            tracing::debug!(
                short_code = %short_code,
                visit_id = recorded.id,
                variant_id = ?recorded.variant_id,
                "Visit recorded"
            );
        }
        Err(e) => {
            metrics::counter!("visits_failed_total").increment(1);
            tracing::error!(
                short_code = %short_code,
                error = %e,
                attempts = MAX_ATTEMPTS,
                "Failed to record visit"
            );
        }
    }
}

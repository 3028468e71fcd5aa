//! Background refresh job.
//!
//! One repeated job invokes the service's refresh on a fixed interval. The
//! interval is deliberately coarse — the vendor serves a storefront and the
//! single account must not hammer it. Failures are already absorbed by the
//! service; the job just logs the outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use argent_service::PriceService;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    service: Arc<PriceService>,
    interval_secs: u64,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(Duration::from_secs(interval_secs), move |_uuid, _lock| {
        let service = Arc::clone(&service);
        Box::pin(async move {
            tracing::info!("scheduler: periodic refresh starting");
            let refreshed = service.refresh_now().await;
            tracing::info!(refreshed, "scheduler: periodic refresh finished");
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(interval_secs, "refresh job registered");
    Ok(scheduler)
}

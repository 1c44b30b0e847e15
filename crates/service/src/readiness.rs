//! Polling the destination until it accepts work.

use aedelore_migrate_core::env_config::ReadinessPolicy;
use aedelore_migrate_storage::Destination;

use crate::error::Result;
use crate::progress::Progress;

/// Probe `destination` up to `policy.attempts` times, `policy.interval`
/// apart. Returns `Ok(false)` once the attempts are used up.
///
/// A probe that fails outright (the container program cannot be run at all)
/// ends the wait with an error instead of retrying.
pub async fn wait_until_ready(
    destination: &dyn Destination,
    policy: ReadinessPolicy,
    mut on_progress: impl FnMut(Progress),
) -> Result<bool> {
    on_progress(Progress::WaitingForDestination { backend: destination.name() });

    for attempt in 1..=policy.attempts {
        if destination.probe().await? {
            tracing::info!(backend = destination.name(), attempt, "destination ready");
            on_progress(Progress::DestinationReady { attempt });
            return Ok(true);
        }
        tracing::debug!(backend = destination.name(), attempt, attempts = policy.attempts, "destination not ready");
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    let waited = policy.interval.saturating_mul(policy.attempts.saturating_sub(1));
    tracing::warn!(backend = destination.name(), attempts = policy.attempts, "destination never became ready");
    on_progress(Progress::DestinationUnavailable { attempts: policy.attempts, waited });
    Ok(false)
}

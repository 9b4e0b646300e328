//! Bounded polling helpers shared by every [`ComputeClient`].
//!
//! Both loops fetch the server at a fixed interval until a condition holds
//! or the policy deadline passes. Retrying lives here and only here; the
//! scenario driver treats these waits as opaque.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::debug;

use crate::compute::{ComputeClient, LifecycleError, Server, ServerStatus};

/// Polls until the server reports `target` with no task in flight.
///
/// # Errors
///
/// Returns [`LifecycleError::NotFound`] when the server disappears,
/// [`LifecycleError::Fault`] when it enters `ERROR` while another status is
/// expected, [`LifecycleError::Timeout`] when the deadline passes, and any
/// error raised by the client while fetching.
pub async fn wait_for_server_status<C>(
    client: &C,
    id: &str,
    target: &ServerStatus,
) -> Result<Server, C::Error>
where
    C: ComputeClient + ?Sized,
{
    let policy = client.wait_policy();
    let deadline = deadline_for(policy.timeout);
    let mut last_status: Option<ServerStatus> = None;

    while before_deadline(deadline) {
        let Some(server) = client.fetch_server(id).await? else {
            return Err(LifecycleError::NotFound {
                server_id: id.to_owned(),
            }
            .into());
        };

        if last_status.as_ref() != Some(&server.status) {
            debug!(
                server_id = id,
                status = %server.status,
                task_state = server.task_state.as_deref().unwrap_or("none"),
                target = %target,
                "observed server status"
            );
        }

        if server.has_settled_in(target) {
            return Ok(server);
        }

        if server.status == ServerStatus::Error && *target != ServerStatus::Error {
            return Err(LifecycleError::Fault {
                server_id: id.to_owned(),
                target: target.clone(),
                status: server.status,
            }
            .into());
        }

        last_status = Some(server.status);
        sleep(policy.interval).await;
    }

    Err(LifecycleError::Timeout {
        server_id: id.to_owned(),
        target: target.clone(),
        last_status,
    }
    .into())
}

/// Polls until the server is no longer reported by the service.
///
/// # Errors
///
/// Returns [`LifecycleError::Residual`] when the server is still visible at
/// the deadline, or any error raised by the client while fetching.
pub async fn wait_for_server_deletion<C>(client: &C, id: &str) -> Result<(), C::Error>
where
    C: ComputeClient + ?Sized,
{
    let policy = client.wait_policy();
    let deadline = deadline_for(policy.timeout);

    while before_deadline(deadline) {
        if client.fetch_server(id).await?.is_none() {
            debug!(server_id = id, "server is gone");
            return Ok(());
        }
        sleep(policy.interval).await;
    }

    Err(LifecycleError::Residual {
        server_id: id.to_owned(),
    }
    .into())
}

/// A timeout too large to represent as an instant means "wait forever".
fn deadline_for(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

fn before_deadline(deadline: Option<Instant>) -> bool {
    deadline.is_none_or(|limit| Instant::now() <= limit)
}

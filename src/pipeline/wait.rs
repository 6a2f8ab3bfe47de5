//! Blocking wait for a task to reach a terminal state.
//!
//! ## Poll schedule
//!
//! The first poll happens immediately. After each non-terminal answer the
//! delay doubles from `poll_interval` up to `max_poll_interval`, so short
//! conversions are picked up quickly while long ones cost few requests.
//! The overall deadline is enforced between polls; a single slow request is
//! bounded by the client's own request timeout.

use crate::api::{CloudApi, Task, TaskStatus};
use crate::config::WaitPolicy;
use crate::error::ConvertError;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Poll `task_id` until it finishes.
///
/// # Errors
/// - [`ConvertError::TaskFailed`] when the task ends in `error`
/// - [`ConvertError::WaitTimeout`] when `policy.timeout` elapses first
/// - any error from [`CloudApi::get_task`]
pub async fn wait_for_task<A>(
    api: &A,
    task_id: &str,
    policy: &WaitPolicy,
) -> Result<Task, ConvertError>
where
    A: CloudApi + ?Sized,
{
    let start = Instant::now();
    let mut polls: u32 = 0;

    loop {
        let task = api.get_task(task_id).await?;
        polls += 1;

        match task.status {
            TaskStatus::Finished => {
                debug!(
                    "Task {} finished after {} polls ({:?})",
                    task.label(),
                    polls,
                    start.elapsed()
                );
                return Ok(task);
            }
            TaskStatus::Error => return Err(task.failure()),
            TaskStatus::Unknown => warn!("Task {}: unrecognised status", task.label()),
            TaskStatus::Waiting | TaskStatus::Processing => {}
        }

        let mut delay = policy.delay_after(polls);
        if let Some(limit) = policy.timeout {
            let elapsed = start.elapsed();
            if elapsed >= limit {
                return Err(ConvertError::WaitTimeout {
                    task: task.label().to_string(),
                    waited: elapsed,
                    last_status: task.status.to_string(),
                });
            }
            delay = delay.min(limit - elapsed);
        }

        debug!("Task {} is {}; next poll in {:?}", task.label(), task.status, delay);
        sleep(delay).await;
    }
}

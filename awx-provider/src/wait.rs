//! Waiting for a project's SCM update before writing a job template
//!
//! AWX rejects a job template whose playbook is not yet present in the
//! project checkout, so writes wait for the project's current (or last)
//! update job to report a completion time.

use std::time::Duration;

use awx_core::provider::{ProviderError, ProviderResult};
use log::{debug, info};
use tokio::sync::watch;

use crate::api::{AwxApi, filters};

/// Polling settings for the project update wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Sleep between polls
    pub interval: Duration,
    /// Give up after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

/// Resolves once the cancel flag is raised. A dropped sender never cancels.
async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    loop {
        let Some(rx) = cancel.as_mut() else {
            return std::future::pending().await;
        };
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            *cancel = None;
        }
    }
}

/// Block until the pending update job of `project_id` has finished.
///
/// Returns immediately when the project has no current or last job.
pub async fn wait_for_project_sync(
    api: &dyn AwxApi,
    project_id: i64,
    options: &WaitOptions,
    cancel: Option<watch::Receiver<bool>>,
) -> ProviderResult<()> {
    let projects = api
        .list_projects(&filters([("id", project_id.to_string())]))
        .await?;
    let Some(project) = projects.into_iter().next() else {
        return Err(ProviderError::not_found(format!(
            "Project {} not found",
            project_id
        )));
    };

    let Some(job_id) = project.pending_job_id() else {
        debug!("Project {} has no update job to wait for", project_id);
        return Ok(());
    };

    let poll = poll_until_finished(api, job_id, options.interval, cancel);
    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, poll).await.map_err(|_| {
            ProviderError::timeout(format!(
                "Timed out after {:?} waiting for project update {} of project {}",
                limit, job_id, project_id
            ))
        })?,
        None => poll.await,
    }
}

async fn poll_until_finished(
    api: &dyn AwxApi,
    job_id: i64,
    interval: Duration,
    mut cancel: Option<watch::Receiver<bool>>,
) -> ProviderResult<()> {
    loop {
        let update = api.get_project_update(job_id).await?.ok_or_else(|| {
            ProviderError::not_found(format!("Project update {} not found", job_id))
        })?;

        if let Some(finished) = update.finished {
            info!("Project update {} finished at {}", job_id, finished);
            return Ok(());
        }
        debug!(
            "Project update {} is {}, polling again in {:?}",
            job_id, update.status, interval
        );

        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                return Err(ProviderError::cancelled(format!(
                    "Cancelled while waiting for project update {}",
                    job_id
                )));
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryAwx;
    use crate::api::models::Project;
    use awx_core::provider::ErrorKind;
    use chrono::Utc;

    fn fast() -> WaitOptions {
        WaitOptions {
            interval: Duration::from_millis(5),
            timeout: None,
        }
    }

    #[tokio::test]
    async fn returns_once_update_finishes() {
        let awx = InMemoryAwx::new();
        awx.script_project_update(5, 40, vec![None, None, Some(Utc::now())]);

        wait_for_project_sync(&awx, 5, &fast(), None).await.unwrap();
        assert_eq!(awx.call_count("get_project_update(40)"), 3);
    }

    #[tokio::test]
    async fn project_without_jobs_does_not_poll() {
        let awx = InMemoryAwx::new();
        awx.insert_project(Project {
            id: 5,
            name: "playbooks".to_string(),
            ..Default::default()
        });

        wait_for_project_sync(&awx, 5, &fast(), None).await.unwrap();
        assert_eq!(awx.call_count("get_project_update"), 0);
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let awx = InMemoryAwx::new();
        let err = wait_for_project_sync(&awx, 5, &fast(), None)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn times_out_when_update_never_finishes() {
        let awx = InMemoryAwx::new();
        awx.script_project_update(5, 40, vec![None]);
        let options = WaitOptions {
            interval: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(50)),
        };

        let err = wait_for_project_sync(&awx, 5, &options, None)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn cancel_signal_stops_the_wait() {
        let awx = InMemoryAwx::new();
        awx.script_project_update(5, 40, vec![None]);
        let (tx, rx) = watch::channel(false);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
            tx
        });

        let err = wait_for_project_sync(&awx, 5, &fast(), Some(rx))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Cancelled));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let awx = InMemoryAwx::new();
        awx.script_project_update(5, 40, vec![None, None, Some(Utc::now())]);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        wait_for_project_sync(&awx, 5, &fast(), Some(rx)).await.unwrap();
    }
}

//! Bounded fixed-interval status polling with cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::job::{JobStatus, StatusPayload};

/// Fixed schedule: 60 polls 2 s apart, roughly a two-minute budget.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const MAX_POLLS: u32 = 60;

/// Schedule overrides, mainly for tests; the service contract is the
/// default.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        }
    }
}

/// Cooperative cancellation handle for the poll loop. Clones share one flag;
/// cancellation takes effect between iterations, never mid-request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Poll a job until a terminal status, cancellation, or the schedule
    /// runs out.
    ///
    /// `completed` returns the payload immediately; `failed`/`error` raises
    /// the server-supplied message. Transport or HTTP failure on any
    /// iteration is immediately fatal. `on_progress` is invoked once per
    /// non-terminal poll with the 1-based attempt count and the reported
    /// status.
    pub async fn poll_job(
        &self,
        job_id: &str,
        options: PollOptions,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u32, &JobStatus),
    ) -> Result<StatusPayload> {
        for poll in 0..options.max_polls {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let payload = self.job_status(job_id).await?;
            let status = JobStatus::parse(&payload.status);
            debug!("poll {} - status: {}", poll + 1, status);

            match &status {
                JobStatus::Completed => return Ok(payload),
                JobStatus::Failed | JobStatus::Error => {
                    let message = payload
                        .error
                        .clone()
                        .unwrap_or_else(|| "job processing failed".to_string());
                    return Err(Error::JobFailed(message));
                }
                JobStatus::Unknown(other) => {
                    warn!("unrecognized job status '{}', still waiting", other);
                    on_progress(poll + 1, &status);
                }
                _ => on_progress(poll + 1, &status),
            }

            tokio::select! {
                _ = tokio::time::sleep(options.interval) => {}
                _ = cancel.cancelled() => return Err(Error::Cancelled),
            }
        }

        Err(Error::JobTimeout(options.max_polls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use mockito::Server;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    fn build_client(api_base: String) -> Client {
        let config = ServiceConfig::default()
            .with_api_base(api_base)
            .with_user_id("user-1");
        Client::new(config).unwrap()
    }

    fn fast(max_polls: u32) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(1),
            max_polls,
        }
    }

    #[tokio::test]
    async fn returns_on_fourth_call_after_three_processing_polls() {
        let mut server = Server::new_async().await;
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mock = server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(200)
            .with_body_from_request(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    json!({"status": "processing"}).to_string().into_bytes()
                } else {
                    json!({"status": "completed", "result": {"mediaUrl": "https://x/out.png"}})
                        .to_string()
                        .into_bytes()
                }
            })
            .expect(4)
            .create_async()
            .await;

        let client = build_client(server.url());
        let mut progress = Vec::new();
        let payload = client
            .poll_job(
                "job-1",
                fast(60),
                &CancelToken::new(),
                |attempt, status| progress.push((attempt, status.clone())),
            )
            .await
            .expect("poll should complete");

        assert_eq!(payload.result_url().unwrap(), "https://x/out.png");
        // one delay per non-terminal poll
        assert_eq!(progress.len(), 3);
        assert_eq!(progress[0], (1, JobStatus::Processing));
        assert_eq!(progress[2].0, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn times_out_after_exactly_max_polls() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(200)
            .with_body(json!({"status": "processing"}).to_string())
            .expect(60)
            .create_async()
            .await;

        let client = build_client(server.url());
        let err = client
            .poll_job("job-1", fast(60), &CancelToken::new(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::JobTimeout(60)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_status_carries_server_message() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(200)
            .with_body(json!({"status": "failed", "error": "bad input"}).to_string())
            .create_async()
            .await;

        let client = build_client(server.url());
        let err = client
            .poll_job("job-1", fast(60), &CancelToken::new(), |_, _| {})
            .await
            .unwrap_err();

        match err {
            Error::JobFailed(message) => assert_eq!(message, "bad input"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_without_message_uses_generic_one() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(200)
            .with_body(json!({"status": "error"}).to_string())
            .create_async()
            .await;

        let client = build_client(server.url());
        let err = client
            .poll_job("job-1", fast(60), &CancelToken::new(), |_, _| {})
            .await
            .unwrap_err();

        match err {
            Error::JobFailed(message) => assert_eq!(message, "job processing failed"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_immediately_fatal() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = build_client(server.url());
        let err = client
            .poll_job("job-1", fast(60), &CancelToken::new(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Poll(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_status_keeps_polling_within_bound() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(200)
            .with_body(json!({"status": "cancelled"}).to_string())
            .create_async()
            .await;

        let client = build_client(server.url());
        let mut seen = Vec::new();
        let err = client
            .poll_job("job-1", fast(3), &CancelToken::new(), |_, status| {
                seen.push(status.clone())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::JobTimeout(3)));
        assert_eq!(seen.len(), 3);
        assert!(seen
            .iter()
            .all(|s| *s == JobStatus::Unknown("cancelled".to_string())));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_any_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .expect(0)
            .create_async()
            .await;

        let cancel = CancelToken::new();
        cancel.cancel();

        let client = build_client(server.url());
        let err = client
            .poll_job("job-1", fast(60), &cancel, |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_sleep() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/image-gen/user-1/job-1/status")
            .with_status(200)
            .with_body(json!({"status": "processing"}).to_string())
            .create_async()
            .await;

        let options = PollOptions {
            interval: Duration::from_secs(60),
            max_polls: 60,
        };
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let client = build_client(server.url());
        let err = client
            .poll_job("job-1", options, &cancel, |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
    }
}

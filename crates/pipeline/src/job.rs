//! Generation job submission and the service's wire types

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::Client;
use crate::error::{Error, Result};

pub(crate) const ACCEPT_HEADER: &str = "application/json, text/plain, */*";

/// Job status reported by the service.
///
/// Unrecognized strings parse to `Unknown` and are treated as still running;
/// the poll loop logs them so the fallthrough stays visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Error,
    Unknown(String),
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-effects request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageJobRequest<'a> {
    model: &'a str,
    tool_type: &'a str,
    effect_id: &'a str,
    image_url: &'a str,
    user_id: &'a str,
    remove_watermark: bool,
    is_private: bool,
}

/// Video-effects request body; the image URL is array-wrapped and there is
/// no tool type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoJobRequest<'a> {
    image_url: [&'a str; 1],
    effect_id: &'a str,
    user_id: &'a str,
    remove_watermark: bool,
    model: &'a str,
    is_private: bool,
}

/// Submission receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    pub job_id: String,
    pub status: String,
}

/// Status payload re-fetched on every poll; remote state, never mutated
/// locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: String,
    #[serde(default)]
    pub result: Option<ResultField>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The service returns either a single result item or an array of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultField {
    One(ResultItem),
    Many(Vec<ResultItem>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ResultItem {
    /// First non-empty of mediaUrl, video, image.
    fn url(&self) -> Option<&str> {
        [
            self.media_url.as_deref(),
            self.video.as_deref(),
            self.image.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty())
    }
}

impl StatusPayload {
    /// Canonical output URL of a completed job. Arrays contribute their
    /// first item; a job with no recognized output field is a hard error.
    pub fn result_url(&self) -> Result<&str> {
        let item = match &self.result {
            Some(ResultField::One(item)) => Some(item),
            Some(ResultField::Many(items)) => items.first(),
            None => None,
        };
        item.and_then(ResultItem::url).ok_or(Error::MissingResult)
    }
}

impl Client {
    /// Submit a generation job for an uploaded image URL.
    pub async fn submit_job(&self, image_url: &str) -> Result<JobTicket> {
        let endpoint = self.config.gen_endpoint();
        let model = self.config.model.as_str();

        let request = self.http.post(&endpoint).header("Accept", ACCEPT_HEADER);
        let request = if self.config.model.is_video() {
            request.json(&VideoJobRequest {
                image_url: [image_url],
                effect_id: &self.config.effect_id,
                user_id: &self.config.user_id,
                remove_watermark: true,
                model,
                is_private: true,
            })
        } else {
            request.json(&ImageJobRequest {
                model,
                tool_type: model,
                effect_id: &self.config.effect_id,
                image_url,
                user_id: &self.config.user_id,
                remove_watermark: true,
                is_private: true,
            })
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Submission(format!("failed to submit job: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Submission(format!(
                "failed to submit job: {}",
                response.status()
            )));
        }

        let ticket: JobTicket = response
            .json()
            .await
            .map_err(|e| Error::Submission(format!("invalid submission response: {e}")))?;
        info!("job submitted: {} (status: {})", ticket.job_id, ticket.status);
        Ok(ticket)
    }

    /// Fetch the current status payload for a job.
    pub async fn job_status(&self, job_id: &str) -> Result<StatusPayload> {
        let endpoint = self.config.status_endpoint(job_id);
        let response = self
            .http
            .get(&endpoint)
            .header("Accept", ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| Error::Poll(format!("failed to check status: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Poll(format!(
                "failed to check status: {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::Poll(format!("invalid status response: {e}")))
    }
}

//! Explicit pipeline session: one uploaded asset, one phase, a busy guard
//!
//! The session replaces the page-controller habit of module-global state
//! with an object that can be tested in isolation and driven concurrently
//! without racing on the uploaded-asset slot.

use std::path::Path;

use tracing::{error, info};

use crate::client::Client;
use crate::download::Download;
use crate::error::{Error, Result};
use crate::poll::{CancelToken, PollOptions};
use crate::render::{MediaKind, ResultView};
use crate::status::PipelinePhase;
use crate::upload::UploadedAsset;

/// Completed generation, ready to display or download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub result_url: String,
    pub kind: MediaKind,
}

pub struct Session {
    client: Client,
    uploaded: Option<UploadedAsset>,
    phase: PipelinePhase,
    view: ResultView,
    cancel: CancelToken,
    poll_options: PollOptions,
}

impl Session {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            uploaded: None,
            phase: PipelinePhase::Idle,
            view: ResultView::new(),
            cancel: CancelToken::new(),
            poll_options: PollOptions::default(),
        }
    }

    /// With a poll schedule override
    pub fn with_poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = options;
        self
    }

    pub fn phase(&self) -> &PipelinePhase {
        &self.phase
    }

    pub fn uploaded(&self) -> Option<&UploadedAsset> {
        self.uploaded.as_ref()
    }

    pub fn view(&self) -> &ResultView {
        &self.view
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Cancellation handle for this session's poll loop. A cancelled token
    /// stays cancelled until `reset`.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.phase.is_busy() {
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Upload a newly selected file, replacing any previous asset. The slot
    /// holds at most one asset; the last successful upload wins.
    pub async fn select_file(&mut self, path: &Path) -> Result<UploadedAsset> {
        self.ensure_idle()?;
        self.phase = PipelinePhase::Uploading;
        match self.client.upload_file(path).await {
            Ok(asset) => {
                self.uploaded = Some(asset.clone());
                self.view.set_preview(&asset.url);
                self.phase = PipelinePhase::Ready;
                Ok(asset)
            }
            Err(err) => {
                error!("upload failed: {}", err);
                self.phase = PipelinePhase::Error;
                Err(err)
            }
        }
    }

    /// Run submit, poll, and result extraction for the uploaded asset.
    ///
    /// `on_progress` observes every phase change, including the final
    /// `Complete` or `Error`.
    pub async fn generate(
        &mut self,
        mut on_progress: impl FnMut(&PipelinePhase),
    ) -> Result<GenerationOutcome> {
        self.ensure_idle()?;
        let image_url = self.uploaded.as_ref().ok_or(Error::NoUpload)?.url.clone();

        match self.run_generate(&image_url, &mut on_progress).await {
            Ok(outcome) => {
                self.phase = PipelinePhase::Complete;
                on_progress(&self.phase);
                Ok(outcome)
            }
            Err(err) => {
                error!("generation failed: {}", err);
                self.phase = PipelinePhase::Error;
                on_progress(&self.phase);
                Err(err)
            }
        }
    }

    async fn run_generate(
        &mut self,
        image_url: &str,
        on_progress: &mut impl FnMut(&PipelinePhase),
    ) -> Result<GenerationOutcome> {
        self.phase = PipelinePhase::Submitting;
        on_progress(&self.phase);
        let ticket = self.client.submit_job(image_url).await?;

        self.phase = PipelinePhase::Queued;
        on_progress(&self.phase);

        let cancel = self.cancel.clone();
        let client = &self.client;
        let phase = &mut self.phase;
        let payload = client
            .poll_job(&ticket.job_id, self.poll_options, &cancel, |attempt, _| {
                *phase = PipelinePhase::Processing { polls: attempt };
                on_progress(phase);
            })
            .await?;

        let result_url = payload.result_url()?.to_string();
        let kind = self.view.show(&result_url);
        info!("result url: {}", result_url);
        Ok(GenerationOutcome { result_url, kind })
    }

    /// Download a result through the tier chain. The phase is restored in
    /// all outcomes, mirroring the control's label/enabled restore.
    pub async fn download(&mut self, url: &str, dest_dir: &Path) -> Result<Download> {
        self.ensure_idle()?;
        let previous = std::mem::replace(&mut self.phase, PipelinePhase::Downloading);
        let outcome = self.client.download_result(url, dest_dir).await;
        self.phase = previous;
        outcome
    }

    /// Clear the uploaded asset and the view, renew the cancel token, and
    /// return to idle.
    pub fn reset(&mut self) {
        self.uploaded = None;
        self.phase = PipelinePhase::Idle;
        self.view.reset();
        self.cancel = CancelToken::new();
    }
}

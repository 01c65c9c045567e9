//! Client pipeline for the Chroma Studio effects service
//!
//! Covers the full flow against the hosted API: upload an image to CDN
//! storage through a signed URL, submit a generation job, poll the job until
//! a terminal state, classify the resulting media, and download it through a
//! tiered fallback.

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod ident;
pub mod job;
pub mod poll;
pub mod render;
pub mod session;
pub mod status;
pub mod upload;

pub use client::Client;
pub use config::{EffectModel, ServiceConfig};
pub use download::Download;
pub use error::{Error, Result};
pub use job::{JobStatus, JobTicket, StatusPayload};
pub use poll::{CancelToken, PollOptions, MAX_POLLS, POLL_INTERVAL};
pub use render::{MediaKind, ResultView};
pub use session::{GenerationOutcome, Session};
pub use status::{control_state, ControlState, PipelinePhase};
pub use upload::UploadedAsset;

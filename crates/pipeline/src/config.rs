//! Service endpoints and identity for the hosted effects API
//!
//! The live service is addressed through fixed constants; the builder exists
//! for CLI overrides and for pointing tests at a mock server.

pub const DEFAULT_API_BASE: &str = "https://api.chromastudio.ai";
pub const DEFAULT_CONTENT_BASE: &str = "https://contents.maxstudio.ai";
pub const DEFAULT_USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";
pub const DEFAULT_EFFECT_ID: &str = "phototo3d";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Effect family; selects the generation endpoint and payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectModel {
    ImageEffects,
    VideoEffects,
}

impl EffectModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageEffects => "image-effects",
            Self::VideoEffects => "video-effects",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image-effects" => Some(Self::ImageEffects),
            "video-effects" => Some(Self::VideoEffects),
            _ => None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::VideoEffects)
    }

    /// Path segment shared by the submit and status endpoints.
    pub fn endpoint_segment(&self) -> &'static str {
        if self.is_video() {
            "video-gen"
        } else {
            "image-gen"
        }
    }
}

impl std::fmt::Display for EffectModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// API endpoint base, no trailing slash
    pub api_base: String,

    /// Public content-serving domain uploads become readable from
    pub content_base: String,

    /// Fixed user identifier sent with every job
    pub user_id: String,

    /// Effect applied by the generation job
    pub effect_id: String,

    /// Effect family (image vs video)
    pub model: EffectModel,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            content_base: DEFAULT_CONTENT_BASE.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            effect_id: DEFAULT_EFFECT_ID.to_string(),
            model: EffectModel::ImageEffects,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// With API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// With content-serving base URL
    pub fn with_content_base(mut self, base: impl Into<String>) -> Self {
        self.content_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// With user identifier
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// With effect identifier
    pub fn with_effect_id(mut self, effect_id: impl Into<String>) -> Self {
        self.effect_id = effect_id.into();
        self
    }

    /// With effect model
    pub fn with_model(mut self, model: EffectModel) -> Self {
        self.model = model;
        self
    }

    /// With HTTP timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Signed-URL endpoint for a storage filename.
    pub fn signed_upload_endpoint(&self, file_name: &str) -> String {
        format!(
            "{}/get-emd-upload-url?fileName={}",
            self.api_base,
            urlencoding::encode(file_name)
        )
    }

    /// Public download URL for an uploaded filename. Derived, no round trip.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.content_base, file_name)
    }

    /// Generation endpoint for the configured model.
    pub fn gen_endpoint(&self) -> String {
        format!("{}/{}", self.api_base, self.model.endpoint_segment())
    }

    /// Status endpoint for a submitted job.
    pub fn status_endpoint(&self, job_id: &str) -> String {
        format!("{}/{}/{}/status", self.gen_endpoint(), self.user_id, job_id)
    }

    /// Server-side download proxy for a result URL.
    pub fn proxy_endpoint(&self, url: &str) -> String {
        format!(
            "{}/download-proxy?url={}",
            self.api_base,
            urlencoding::encode(url)
        )
    }
}

//! Result media classification and the result-area view state

use std::time::{SystemTime, UNIX_EPOCH};

/// Media kind of a result URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `.mp4`/`.webm` at the end of the path (any case, optional query
    /// string) render as video; everything else is treated as an image.
    pub fn classify(url: &str) -> Self {
        let path = url.split('?').next().unwrap_or(url).to_ascii_lowercase();
        if path.ends_with(".mp4") || path.ends_with(".webm") {
            Self::Video
        } else {
            Self::Image
        }
    }
}

/// Video surface, created lazily on the first video result and reused for
/// later ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSurface {
    pub src: String,
    pub autoplay: bool,
    pub looped: bool,
    pub controls: bool,
}

/// View state for the result area.
///
/// Invariant: after a render exactly one of {image, video} is visible and
/// the preview/placeholder is hidden.
#[derive(Debug, Default)]
pub struct ResultView {
    image_src: Option<String>,
    video: Option<VideoSurface>,
    visible: Option<MediaKind>,
    preview_src: Option<String>,
    preview_visible: bool,
    last_buster: u64,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the uploaded image as a preview until a result renders.
    pub fn set_preview(&mut self, url: &str) {
        self.preview_src = Some(url.to_string());
        self.preview_visible = true;
    }

    /// Render a result URL, routing it to the image or video surface.
    pub fn show(&mut self, url: &str) -> MediaKind {
        let kind = MediaKind::classify(url);
        match kind {
            MediaKind::Video => {
                let surface = self.video.get_or_insert_with(|| VideoSurface {
                    src: String::new(),
                    autoplay: true,
                    looped: true,
                    controls: true,
                });
                surface.src = url.to_string();
            }
            MediaKind::Image => {
                self.image_src = Some(format!("{}?t={}", url, self.next_buster()));
            }
        }
        self.visible = Some(kind);
        self.preview_visible = false;
        kind
    }

    // Strictly increasing so consecutive renders never share a parameter.
    fn next_buster(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last_buster = now.max(self.last_buster + 1);
        self.last_buster
    }

    pub fn image_src(&self) -> Option<&str> {
        self.image_src.as_deref()
    }

    pub fn video(&self) -> Option<&VideoSurface> {
        self.video.as_ref()
    }

    pub fn visible(&self) -> Option<MediaKind> {
        self.visible
    }

    pub fn image_visible(&self) -> bool {
        self.visible == Some(MediaKind::Image)
    }

    pub fn video_visible(&self) -> bool {
        self.visible == Some(MediaKind::Video)
    }

    pub fn preview_src(&self) -> Option<&str> {
        self.preview_src.as_deref()
    }

    pub fn preview_visible(&self) -> bool {
        self.preview_visible
    }

    /// Placeholder shows until the first render and again after reset.
    pub fn placeholder_visible(&self) -> bool {
        self.visible.is_none()
    }

    /// Clear everything back to the empty state. The cache-buster watermark
    /// is kept so a later render still gets a fresh parameter.
    pub fn reset(&mut self) {
        self.image_src = None;
        self.video = None;
        self.visible = None;
        self.preview_src = None;
        self.preview_visible = false;
    }
}

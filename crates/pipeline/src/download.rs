//! Tiered result download: proxy fetch, direct fetch, then a plain link

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::ident;

/// Outcome of a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Result bytes were fetched and saved locally.
    File { path: PathBuf },
    /// Both fetch tiers failed; the caller should hand the unmodified URL
    /// to the browser.
    BrowserLink { url: String },
}

/// Fetch tiers in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Proxy,
    Direct,
}

impl Client {
    /// Download a result URL into `dest_dir`, first success wins.
    ///
    /// Tier failures are logged and swallowed; when both fetch tiers fail
    /// the link tier takes over, which cannot fail observably.
    pub async fn download_result(&self, url: &str, dest_dir: &Path) -> Result<Download> {
        for tier in [Tier::Proxy, Tier::Direct] {
            match self.try_tier(tier, url, dest_dir).await {
                Ok(path) => return Ok(Download::File { path }),
                Err(err) => warn!("{:?} download tier failed: {}", tier, err),
            }
        }
        info!("falling back to a direct link for {}", url);
        Ok(Download::BrowserLink {
            url: url.to_string(),
        })
    }

    async fn try_tier(&self, tier: Tier, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        match tier {
            Tier::Proxy => {
                let proxy_url = self.config.proxy_endpoint(url);
                debug!("proxy download via {}", proxy_url);
                let response = self
                    .http
                    .get(&proxy_url)
                    .send()
                    .await
                    .map_err(|e| Error::Download(format!("proxy fetch failed: {e}")))?;
                if !response.status().is_success() {
                    return Err(Error::Download(format!(
                        "proxy fetch failed: {}",
                        response.status()
                    )));
                }

                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| Error::Download(format!("proxy body read failed: {e}")))?;
                save_bytes(dest_dir, infer_extension(&content_type, url), &bytes).await
            }
            Tier::Direct => {
                let fetch_url = with_cache_buster(url);
                debug!("direct download via {}", fetch_url);
                let response = self
                    .http
                    .get(&fetch_url)
                    .send()
                    .await
                    .map_err(|e| Error::Download(format!("direct fetch failed: {e}")))?;
                if !response.status().is_success() {
                    return Err(Error::Download(format!(
                        "direct fetch failed: {}",
                        response.status()
                    )));
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| Error::Download(format!("direct body read failed: {e}")))?;
                save_bytes(dest_dir, "png", &bytes).await
            }
        }
    }
}

async fn save_bytes(dest_dir: &Path, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| Error::Download(format!("create output dir: {e}")))?;
    let path = dest_dir.join(format!(
        "result_{}.{}",
        ident::generate(ident::DOWNLOAD_ID_LEN),
        extension
    ));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| Error::Download(format!("write {}: {e}", path.display())))?;
    info!("saved result to {}", path.display());
    Ok(path)
}

/// Extension for a saved result: the content-type header wins, the URL
/// suffix is the fallback, `png` the default.
fn infer_extension(content_type: &str, url: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    let u = url.to_ascii_lowercase();
    if ct.contains("jpeg") || u.contains(".jpg") || u.contains(".jpeg") {
        "jpg"
    } else if ct.contains("webp") || u.contains(".webp") {
        "webp"
    } else if ct.contains("mp4") || u.contains(".mp4") {
        "mp4"
    } else {
        "png"
    }
}

fn with_cache_buster(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{url}{sep}t={t}")
}

//! CDN upload: signed-URL fetch, byte transfer, public-URL derivation

use std::path::Path;

use tracing::{debug, info};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::ident;

/// Public handle of a successfully uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub url: String,
}

impl Client {
    /// Upload a local file and return its public URL.
    ///
    /// The storage filename is `<random id>.<ext>` with the extension taken
    /// from the local filename, `jpg` when absent. Two network calls, neither
    /// retried; the first failure aborts the upload.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedAsset> {
        let bytes = tokio::fs::read(path).await?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("jpg");
        let file_name = format!("{}.{}", ident::generate(ident::FILE_ID_LEN), extension);
        info!(
            "uploading {} ({} bytes) as {}",
            path.display(),
            bytes.len(),
            file_name
        );
        self.upload_bytes(bytes, &file_name, content_type_for(extension))
            .await
    }

    /// Upload raw bytes under an already-derived storage filename.
    pub async fn upload_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadedAsset> {
        let signed_url = self.fetch_signed_url(file_name).await?;
        debug!("got signed url for {}", file_name);

        let response = self
            .http
            .put(&signed_url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("failed to upload file: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Upload(format!(
                "failed to upload file: {}",
                response.status()
            )));
        }

        let url = self.config.public_url(file_name);
        info!("uploaded to {}", url);
        Ok(UploadedAsset { url })
    }

    async fn fetch_signed_url(&self, file_name: &str) -> Result<String> {
        let endpoint = self.config.signed_upload_endpoint(file_name);
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("failed to get signed url: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Upload(format!(
                "failed to get signed url: {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| Error::Upload(format!("failed to read signed url: {e}")))
    }
}

/// Content type sent with the PUT, matched from the file extension.
fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use mockito::{Matcher, Server};

    fn build_client(api_base: String) -> Client {
        Client::new(ServiceConfig::default().with_api_base(api_base)).unwrap()
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("JPG"), "image/jpeg");
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn upload_puts_bytes_to_signed_url_and_derives_public_url() {
        let mut server = Server::new_async().await;
        let signed = server
            .mock("GET", "/get-emd-upload-url")
            .match_query(Matcher::UrlEncoded(
                "fileName".into(),
                "photo.png".into(),
            ))
            .with_status(200)
            .with_body(format!("{}/storage/photo.png", server.url()))
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/storage/photo.png")
            .match_header("content-type", "image/png")
            .match_body("pixels")
            .with_status(200)
            .create_async()
            .await;

        let client = build_client(server.url());
        let asset = client
            .upload_bytes(b"pixels".to_vec(), "photo.png", "image/png")
            .await
            .expect("upload should succeed");

        assert_eq!(asset.url, "https://contents.maxstudio.ai/photo.png");
        signed.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn signed_url_failure_aborts_without_put() {
        let mut server = Server::new_async().await;
        let signed = server
            .mock("GET", "/get-emd-upload-url")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = build_client(server.url());
        let err = client
            .upload_bytes(b"pixels".to_vec(), "photo.png", "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
        assert!(err.to_string().contains("signed url"));
        signed.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn put_failure_never_returns_public_url() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/get-emd-upload-url")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!("{}/storage/photo.png", server.url()))
            .create_async()
            .await;
        server
            .mock("PUT", "/storage/photo.png")
            .with_status(403)
            .create_async()
            .await;

        let client = build_client(server.url());
        let err = client
            .upload_bytes(b"pixels".to_vec(), "photo.png", "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn upload_file_names_blob_from_extension() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/get-emd-upload-url")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!("{}/storage/blob", server.url()))
            .create_async()
            .await;
        server
            .mock("PUT", "/storage/blob")
            .match_header("content-type", "image/png")
            .with_status(200)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"pixels").unwrap();

        let client = build_client(server.url());
        let asset = client.upload_file(&path).await.expect("upload");

        let name = asset
            .url
            .strip_prefix("https://contents.maxstudio.ai/")
            .expect("public url uses the content domain");
        let (stem, ext) = name.split_once('.').expect("filename has an extension");
        assert_eq!(ext, "png");
        assert_eq!(stem.len(), crate::ident::FILE_ID_LEN);
        assert!(stem.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

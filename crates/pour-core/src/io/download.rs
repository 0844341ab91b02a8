//! Download with streaming SHA256 verification.
//!
//! One GET per artifact. The body is hashed while it is written, and a
//! mismatching file is removed before the error is returned. There is no
//! retry: a failed request is surfaced as-is.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use pour_schema::{PackageName, Sha256Digest, Version};

use crate::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: Sha256Digest,
        actual: Sha256Digest,
    },
}

impl DownloadError {
    fn http(url: &str, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.to_string(),
            source,
        }
    }
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    pub client: &'a Client,
    pub pkg_name: &'a PackageName,
    pub version: &'a Version,
    pub url: &'a str,
    pub dest: &'a Path,
    pub expected_hash: &'a Sha256Digest,
    pub reporter: &'a R,
}

impl<'a, R: Reporter + ?Sized> DownloadRequest<'a, R> {
    pub fn new(
        client: &'a Client,
        pkg_name: &'a PackageName,
        version: &'a Version,
        url: &'a str,
        dest: &'a Path,
        expected_hash: &'a Sha256Digest,
        reporter: &'a R,
    ) -> Self {
        Self {
            client,
            pkg_name,
            version,
            url,
            dest,
            expected_hash,
            reporter,
        }
    }

    /// Execute the download, returning the verified digest.
    pub async fn execute(self) -> Result<Sha256Digest, DownloadError> {
        download_and_verify(self).await
    }
}

async fn send(client: &Client, url: &str) -> Result<reqwest::Response, DownloadError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await
        .map_err(|e| DownloadError::http(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response)
}

/// Streams `url` into `dest`, verifying the SHA256 on the fly.
///
/// On any failure after `dest` was created, including a hash mismatch, the
/// partial file is removed.
pub async fn download_and_verify<R: Reporter + ?Sized>(
    req: DownloadRequest<'_, R>,
) -> Result<Sha256Digest, DownloadError> {
    let result = stream_to_file(&req).await;
    if result.is_err() {
        tokio::fs::remove_file(req.dest).await.ok();
    }
    result
}

async fn stream_to_file<R: Reporter + ?Sized>(
    req: &DownloadRequest<'_, R>,
) -> Result<Sha256Digest, DownloadError> {
    let response = send(req.client, req.url).await?;
    let total_size = response.content_length();
    req.reporter
        .downloading(req.pkg_name, req.version, 0, total_size);

    let mut file = File::create(req.dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::http(req.url, e))?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        req.reporter
            .downloading(req.pkg_name, req.version, downloaded, total_size);
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    req.reporter.verifying(req.pkg_name, req.version);
    let actual = Sha256Digest::from_hasher(hasher);
    tracing::debug!(url = req.url, bytes = downloaded, sha256 = %actual, "downloaded");

    if &actual != req.expected_hash {
        return Err(DownloadError::HashMismatch {
            url: req.url.to_string(),
            expected: req.expected_hash.clone(),
            actual,
        });
    }

    Ok(actual)
}

/// Fetch `url` and return the digest of its body without keeping the bytes.
///
/// Used when authoring a new release to compute the checksums to publish.
pub async fn fetch_digest(client: &Client, url: &str) -> Result<Sha256Digest, DownloadError> {
    let response = send(client, url).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::http(url, e))?;
        hasher.update(&chunk);
    }

    Ok(Sha256Digest::from_hasher(hasher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use mockito::Server;

    fn ids() -> (PackageName, Version) {
        (PackageName::new("td"), Version::parse("1.0.0").unwrap())
    }

    #[tokio::test]
    async fn verified_download_lands_on_disk() {
        let mut server = Server::new_async().await;
        let body = b"td archive bytes".to_vec();
        let _m = server
            .mock("GET", "/td.tar.gz")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("td.tar.gz");
        let url = format!("{}/td.tar.gz", server.url());
        let expected = Sha256Digest::compute(&body);
        let (name, version) = ids();

        let client = Client::new();
        let digest = DownloadRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &expected,
            &NullReporter,
        )
        .execute()
        .await
        .unwrap();

        assert_eq!(digest, expected);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn mismatch_removes_partial_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/td.tar.gz")
            .with_status(200)
            .with_body("tampered")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("td.tar.gz");
        let url = format!("{}/td.tar.gz", server.url());
        let expected = Sha256Digest::compute(b"original");
        let (name, version) = ids();

        let client = Client::new();
        let err = DownloadRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &expected,
            &NullReporter,
        )
        .execute()
        .await
        .unwrap_err();

        match err {
            DownloadError::HashMismatch {
                expected: e,
                actual,
                ..
            } => {
                assert_eq!(e, expected);
                assert_eq!(actual, Sha256Digest::compute(b"tampered"));
            }
            other => panic!("expected hash mismatch, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn http_error_status_is_reported_with_url() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/missing.tar.gz")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.tar.gz");
        let url = format!("{}/missing.tar.gz", server.url());
        let (name, version) = ids();

        let client = Client::new();
        let err = DownloadRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &Sha256Digest::compute(b""),
            &NullReporter,
        )
        .execute()
        .await
        .unwrap_err();

        assert!(matches!(
            &err,
            DownloadError::Status { status, .. } if status.as_u16() == 404
        ));
        assert!(err.to_string().contains(&url));
        assert!(!dest.exists());
        // Exactly one request: no retry.
        m.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        // Bind then drop a listener so the port is (almost certainly) closed.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{port}/td.tar.gz");

        let err = fetch_digest(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, DownloadError::Http { .. }));
    }

    #[tokio::test]
    async fn fetch_digest_hashes_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/td.tar.gz")
            .with_status(200)
            .with_body("release bytes")
            .create_async()
            .await;

        let url = format!("{}/td.tar.gz", server.url());
        let digest = fetch_digest(&Client::new(), &url).await.unwrap();
        assert_eq!(digest, Sha256Digest::compute(b"release bytes"));
    }
}

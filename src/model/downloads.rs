//! Local storage locations and byte fetching for offline tracks

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::types::Track;

const DOWNLOADS_SUBDIR: &str = "downloads";

/// Where downloaded audio lives: `<root>/downloads/<id>.mp3`
#[derive(Clone, Debug)]
pub struct DownloadDir {
    root: PathBuf,
}

impl DownloadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn location_for(&self, track: &Track) -> Result<PathBuf> {
        let dir = self.root.join(DOWNLOADS_SUBDIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(dir.join(format!("{}.mp3", sanitize_file_component(&track.id))))
    }
}

// Keeps ASCII letters, digits and `-`. Every other byte, `_` included,
// becomes `_` plus two hex digits, so distinct ids never share a file.
fn sanitize_file_component(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }
    let mut cleaned = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            cleaned.push(char::from(byte));
        } else {
            cleaned.push_str(&format!("_{byte:02x}"));
        }
    }
    cleaned
}

/// Copies remote audio bytes to a local file
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {status} downloading {url}"));
        }

        // Only complete transfers appear at `dest`.
        let partial = dest.with_extension("part");
        let written = match copy_body(response, url, &partial, dest).await {
            Ok(written) => written,
            Err(e) => {
                match tokio::fs::remove_file(&partial).await {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => tracing::warn!(
                        path = %partial.display(),
                        error = %err,
                        "Failed to remove partial download"
                    ),
                }
                return Err(e);
            }
        };
        tracing::debug!(url, dest = %dest.display(), bytes = written, "Download complete");
        Ok(())
    }
}

async fn copy_body(
    response: reqwest::Response,
    url: &str,
    partial: &Path,
    dest: &Path,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .with_context(|| format!("failed to create {}", partial.display()))?;

    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.with_context(|| format!("download interrupted for {url}"))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(partial, dest)
        .await
        .with_context(|| format!("failed to move download to {}", dest.display()))?;
    Ok(written)
}

//! Hosts' side of a download: where saved artifacts end up.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use migrator_shared::error::MigrationError;
use reqwest::Client;
use tracing::{error, info};

use crate::{presenter::SaveRequest, transport::network_error};

#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Performs the save and returns where the artifact went.
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, MigrationError>;
}

/// Writes artifacts into a local directory, fetching remote ones over HTTP.
pub struct DirectorySink {
    http: Client,
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_client(Client::new(), dir)
    }

    pub fn with_client(http: Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MigrationError> {
        let response = self.http.get(url).send().await.map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(network_error)?;
            error!(%url, status = status.as_u16(), body = %body, "migrated file download failed");
            return Err(MigrationError::Service {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await.map_err(network_error)?;
        Ok(bytes.to_vec())
    }

    async fn write(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, MigrationError> {
        let save_error = |e: std::io::Error| MigrationError::Save {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(save_error)?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, contents).await.map_err(save_error)?;
        info!(path = %path.display(), size_bytes = contents.len(), "artifact saved");
        Ok(path)
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, MigrationError> {
        match request {
            SaveRequest::SaveText {
                file_name,
                contents,
            } => self.write(&file_name, contents.as_bytes()).await,
            SaveRequest::FetchAndSave { url, file_name } => {
                let bytes = self.fetch(&url).await?;
                self.write(&file_name, &bytes).await
            }
        }
    }
}

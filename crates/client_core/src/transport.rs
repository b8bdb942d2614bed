//! HTTP access to the conversion and retrieval endpoints.

use async_trait::async_trait;
use migrator_shared::{
    domain::Format,
    error::MigrationError,
    protocol::{
        UploadResponse, DOWNLOAD_FILENAME_PARAM, DOWNLOAD_MIGRATED_PATH, FIELD_FILE,
        FIELD_SOURCE_FORMAT, FIELD_TARGET_FORMAT, UPLOAD_PATH,
    },
};
use reqwest::{multipart, Client};
use tracing::{debug, error, info};
use url::Url;

use crate::selection::SelectedFile;

/// Built at submission time and dropped once the request resolves.
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub file: SelectedFile,
    pub source_format: Format,
    pub target_format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub status: u16,
    pub response: UploadResponse,
}

#[async_trait]
pub trait ConversionService: Send + Sync {
    async fn upload(&self, request: MigrationRequest) -> Result<UploadOutcome, MigrationError>;
    /// Retrieval URL for a server-assigned migrated file reference.
    fn migrated_file_url(&self, migrated_file_ref: &str) -> String;
}

pub struct HttpConversionService {
    http: Client,
    base_url: Url,
}

impl HttpConversionService {
    pub fn new(server_url: &str) -> Result<Self, MigrationError> {
        Ok(Self::with_client(Client::new(), parse_base_url(server_url)?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

pub fn parse_base_url(server_url: &str) -> Result<Url, MigrationError> {
    Url::parse(server_url)
        .map_err(|e| MigrationError::validation(format!("invalid server url `{server_url}`: {e}")))
}

/// `GET /download-migrated?filename=...` with the reference percent-encoded the way
/// `encodeURIComponent` does it.
pub fn build_migrated_file_url(base_url: &str, migrated_file_ref: &str) -> String {
    format!(
        "{}{DOWNLOAD_MIGRATED_PATH}?{DOWNLOAD_FILENAME_PARAM}={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(migrated_file_ref)
    )
}

pub(crate) fn network_error(err: reqwest::Error) -> MigrationError {
    MigrationError::Network(err.to_string())
}

#[async_trait]
impl ConversionService for HttpConversionService {
    async fn upload(&self, request: MigrationRequest) -> Result<UploadOutcome, MigrationError> {
        let MigrationRequest {
            file,
            source_format,
            target_format,
        } = request;
        let url = self.endpoint(UPLOAD_PATH);
        info!(%url, file = %file.name, %source_format, %target_format, "sending upload request");

        let form = multipart::Form::new()
            .part(
                FIELD_FILE,
                multipart::Part::bytes(file.bytes).file_name(file.name),
            )
            .text(FIELD_SOURCE_FORMAT, source_format.as_str())
            .text(FIELD_TARGET_FORMAT, target_format.as_str());

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), "upload response status");
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "server error response");
            return Err(MigrationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let response = UploadResponse::parse(status.as_u16(), &body)?;
        Ok(UploadOutcome {
            status: status.as_u16(),
            response,
        })
    }

    fn migrated_file_url(&self, migrated_file_ref: &str) -> String {
        build_migrated_file_url(self.base_url.as_str(), migrated_file_ref)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

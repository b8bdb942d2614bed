use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Format, MigrationResult},
    error::MigrationError,
};

pub const UPLOAD_PATH: &str = "/upload";
pub const DOWNLOAD_MIGRATED_PATH: &str = "/download-migrated";

pub const FIELD_FILE: &str = "file";
pub const FIELD_SOURCE_FORMAT: &str = "sourceFormat";
pub const FIELD_TARGET_FORMAT: &str = "targetFormat";

pub const DOWNLOAD_FILENAME_PARAM: &str = "filename";

/// Success body of `POST /upload`. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file: String,
    pub source: String,
    pub target: String,
    pub message: String,
    pub migrated_file: String,
}

impl UploadResponse {
    pub fn parse(status: u16, body: &str) -> Result<Self, MigrationError> {
        serde_json::from_str(body).map_err(|e| MigrationError::MalformedResponse {
            status,
            reason: e.to_string(),
        })
    }

    pub fn into_result(
        self,
        status: u16,
        completed_at: DateTime<Utc>,
    ) -> Result<MigrationResult, MigrationError> {
        let malformed = |reason: String| MigrationError::MalformedResponse { status, reason };
        let source_format = self
            .source
            .parse::<Format>()
            .map_err(|e| malformed(format!("source: {e}")))?;
        let target_format = self
            .target
            .parse::<Format>()
            .map_err(|e| malformed(format!("target: {e}")))?;

        Ok(MigrationResult {
            original_file_name: self.file,
            source_format,
            target_format,
            completed_at,
            status_message: self.message,
            migrated_file_ref: Some(self.migrated_file).filter(|name| !name.is_empty()),
        })
    }
}

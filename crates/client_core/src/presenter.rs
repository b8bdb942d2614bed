//! Holds the last completed migration and derives the two downloadable artifacts.

use chrono::{DateTime, SecondsFormat, Utc};
use migrator_shared::{domain::MigrationResult, error::MigrationError};

/// A save the host should perform on behalf of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    /// Locally generated content, no network involved.
    SaveText { file_name: String, contents: String },
    /// Content the host has to fetch from `url` before saving.
    FetchAndSave { url: String, file_name: String },
}

impl SaveRequest {
    pub fn file_name(&self) -> &str {
        match self {
            SaveRequest::SaveText { file_name, .. }
            | SaveRequest::FetchAndSave { file_name, .. } => file_name,
        }
    }
}

pub fn render_report(result: &MigrationResult) -> String {
    format!(
        "Migration Report\n=================\n\nFile: {}\nSource Format: {}\nTarget Format: {}\nTimestamp: {}\n\nResult:\n{}",
        result.original_file_name,
        result.source_format.display_name(),
        result.target_format.display_name(),
        result
            .completed_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        result.status_message,
    )
}

pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!("migration-report-{}.txt", now.timestamp_millis())
}

pub fn migrated_file_name(result: &MigrationResult, now: DateTime<Utc>) -> String {
    format!(
        "migrated-{}.{}",
        now.timestamp_millis(),
        result.target_format.file_extension()
    )
}

#[derive(Debug, Default)]
pub struct ResultPresenter {
    last_result: Option<MigrationResult>,
}

impl ResultPresenter {
    /// Replaces any earlier result.
    pub fn publish(&mut self, result: MigrationResult) {
        self.last_result = Some(result);
    }

    pub fn last_result(&self) -> Option<&MigrationResult> {
        self.last_result.as_ref()
    }

    pub fn report_request(&self, now: DateTime<Utc>) -> Result<SaveRequest, MigrationError> {
        let result = self
            .last_result
            .as_ref()
            .ok_or_else(|| MigrationError::state("no result"))?;
        Ok(SaveRequest::SaveText {
            file_name: report_file_name(now),
            contents: render_report(result),
        })
    }

    /// `url_for` turns the opaque reference into a retrieval URL; the reference
    /// itself is passed through untouched.
    pub fn migrated_file_request(
        &self,
        now: DateTime<Utc>,
        url_for: impl FnOnce(&str) -> String,
    ) -> Result<SaveRequest, MigrationError> {
        let (result, migrated_file_ref) = self
            .last_result
            .as_ref()
            .and_then(|result| {
                result
                    .migrated_file_ref
                    .as_deref()
                    .map(|reference| (result, reference))
            })
            .ok_or_else(|| MigrationError::state("no migrated file"))?;
        Ok(SaveRequest::FetchAndSave {
            url: url_for(migrated_file_ref),
            file_name: migrated_file_name(result, now),
        })
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;

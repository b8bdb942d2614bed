use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Data formats understood by the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Sql,
    Excel,
    Csv,
    Json,
    Sqlite,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Sql,
        Format::Excel,
        Format::Csv,
        Format::Json,
        Format::Sqlite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Sql => "sql",
            Format::Excel => "excel",
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Sqlite => "sqlite",
        }
    }

    /// Maps a lowercase file suffix to the format it implies, if any.
    pub fn from_file_extension(ext: &str) -> Option<Self> {
        match ext {
            "sql" => Some(Format::Sql),
            "xlsx" | "xls" => Some(Format::Excel),
            "csv" => Some(Format::Csv),
            "json" => Some(Format::Json),
            "db" | "sqlite" => Some(Format::Sqlite),
            _ => None,
        }
    }

    /// Extension used when saving a file converted into this format.
    pub fn file_extension(self) -> &'static str {
        match self {
            Format::Excel => "xlsx",
            other => other.as_str(),
        }
    }

    pub fn display_name(self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported format `{0}`; expected one of sql, excel, csv, json, sqlite")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.as_str() == value)
            .ok_or_else(|| UnknownFormat(value.to_string()))
    }
}

/// Source and target selector values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFormats {
    pub source: Format,
    pub target: Format,
}

impl Default for MigrationFormats {
    fn default() -> Self {
        Self {
            source: Format::Sql,
            target: Format::Json,
        }
    }
}

/// Outcome of the most recent successful migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub original_file_name: String,
    pub source_format: Format,
    pub target_format: Format,
    pub completed_at: DateTime<Utc>,
    pub status_message: String,
    pub migrated_file_ref: Option<String>,
}

impl MigrationResult {
    /// Completion summary shown once the progress indicator is hidden.
    pub fn summary(&self) -> String {
        format!(
            "Migration Complete!\nFile: {}\nSource Format: {}\nTarget Format: {}\nStatus: {}",
            self.original_file_name,
            self.source_format.display_name(),
            self.target_format.display_name(),
            self.status_message,
        )
    }
}

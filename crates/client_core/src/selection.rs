//! Current file choice and the source-format inference derived from it.

use std::path::Path;

use migrator_shared::{
    domain::{Format, MigrationFormats},
    error::MigrationError,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Browse,
    Drop,
}

/// A file handed over by the picker or the drop zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, MigrationError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                MigrationError::validation(format!("{} does not name a file", path.display()))
            })?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            MigrationError::validation(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self { name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub file: SelectedFile,
    /// `None` when the suffix matches no known format.
    pub inferred_source_format: Option<Format>,
}

/// Lowercased text after the last `.`; the whole name when there is no dot.
pub fn file_extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

pub fn infer_source_format(name: &str) -> Option<Format> {
    Format::from_file_extension(&file_extension(name))
}

#[derive(Debug, Default)]
pub struct SelectionManager {
    current: Option<FileSelection>,
    formats: MigrationFormats,
}

impl SelectionManager {
    pub fn new(formats: MigrationFormats) -> Self {
        Self {
            current: None,
            formats,
        }
    }

    /// Replaces the current selection. The source selector follows the inferred
    /// format and keeps its prior value when nothing could be inferred.
    pub fn select_file(&mut self, file: SelectedFile, origin: SelectionOrigin) -> &FileSelection {
        let inferred_source_format = infer_source_format(&file.name);
        match inferred_source_format {
            Some(format) => self.formats.source = format,
            None => debug!(file = %file.name, "no source format inferred from extension"),
        }
        info!(
            file = %file.name,
            size_bytes = file.len(),
            ?origin,
            source_format = %self.formats.source,
            "file selected"
        );
        self.current.insert(FileSelection {
            file,
            inferred_source_format,
        })
    }

    pub fn current(&self) -> Option<&FileSelection> {
        self.current.as_ref()
    }

    pub fn selected_file_name(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.file.name.as_str())
    }

    pub fn formats(&self) -> MigrationFormats {
        self.formats
    }

    pub fn set_source_format(&mut self, format: Format) {
        self.formats.source = format;
    }

    pub fn set_target_format(&mut self, format: Format) {
        self.formats.target = format;
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;

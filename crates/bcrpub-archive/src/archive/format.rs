//! Archive format dispatch by file name suffix.

use std::path::Path;

use crate::{ArchiveError, Result};

/// Supported archive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    Zip,
}

impl ArchiveFormat {
    /// Detect the archive type from the file name.
    ///
    /// Suffixes are checked in order `.tar.gz`, `.tar.xz`, `.zip`; the first
    /// match wins. Anything else is rejected with the file's dotted extension,
    /// i.e. everything after the first `.` of the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        if file_name.ends_with(".tar.gz") {
            Ok(ArchiveFormat::TarGz)
        } else if file_name.ends_with(".tar.xz") {
            Ok(ArchiveFormat::TarXz)
        } else if file_name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Err(ArchiveError::UnsupportedFormat {
                extension: dotted_extension(&file_name).to_string(),
            })
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarXz => "tar.xz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

fn dotted_extension(file_name: &str) -> &str {
    file_name
        .split_once('.')
        .map(|(_, extension)| extension)
        .unwrap_or("")
}

//! Archive extraction (tar.gz, tar.xz, zip).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::decompress::{stream_unpack, TarSink, XzDecompressor};
use super::format::ArchiveFormat;
use crate::{ArchiveError, Result};

/// Archive extractor
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Extract an archive into `dest_dir`, choosing the strategy from its file name.
    pub async fn extract(archive_path: &Path, dest_dir: &Path) -> Result<ArchiveFormat> {
        let format = ArchiveFormat::from_path(archive_path)?;
        Self::extract_with_format(archive_path, dest_dir, format).await?;
        Ok(format)
    }

    /// Extract an archive with explicit format
    pub async fn extract_with_format(
        archive_path: &Path,
        dest_dir: &Path,
        format: ArchiveFormat,
    ) -> Result<()> {
        tokio::fs::create_dir_all(dest_dir).await?;
        log::debug!(
            "Extracting {} ({}) into {}",
            archive_path.display(),
            format.extension(),
            dest_dir.display()
        );

        match format {
            ArchiveFormat::TarGz => {
                Self::blocking(archive_path, dest_dir, Self::extract_tar_gz).await
            }
            ArchiveFormat::TarXz => {
                stream_unpack(archive_path, &XzDecompressor, TarSink::new(dest_dir)).await
            }
            ArchiveFormat::Zip => Self::blocking(archive_path, dest_dir, Self::extract_zip).await,
        }
    }

    async fn blocking(
        archive_path: &Path,
        dest_dir: &Path,
        extract: fn(&Path, &Path) -> Result<()>,
    ) -> Result<()> {
        let archive_path: PathBuf = archive_path.to_path_buf();
        let dest_dir: PathBuf = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract(&archive_path, &dest_dir))
            .await
            .map_err(|e| ArchiveError::Extraction(format!("Extraction task failed: {}", e)))?
    }

    /// Extract a gzipped tar archive
    fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
        let file = File::open(archive_path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        tar::Archive::new(decoder).unpack(dest_dir).map_err(|e| {
            ArchiveError::Extraction(format!("Failed to unpack {}: {}", archive_path.display(), e))
        })
    }

    /// Extract a zip archive
    fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| {
            ArchiveError::Extraction(format!("Failed to open zip {}: {}", archive_path.display(), e))
        })?;
        archive.extract(dest_dir).map_err(|e| {
            ArchiveError::Extraction(format!("Failed to unpack {}: {}", archive_path.display(), e))
        })
    }
}

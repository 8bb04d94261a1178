//! Release archive lifecycle: fetch, extract, locate, clean up.
//!
//! ```no_run
//! use bcrpub_archive::{ArchiveFetcher, FetchConfig};
//!
//! # async fn example() -> bcrpub_archive::Result<()> {
//! let fetcher = ArchiveFetcher::new(FetchConfig::from_env()?)?;
//! let mut archive = fetcher
//!     .fetch(
//!         "https://github.com/owner/rules_foo/releases/download/v1.0.0/rules_foo-v1.0.0.tar.gz",
//!         "rules_foo-1.0.0",
//!     )
//!     .await?;
//!
//! let result = archive.extract().await;
//! if let Ok(module) = &result {
//!     println!("{}", module.read_to_string().await?);
//! }
//! archive.cleanup().await?;
//! result?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveExtractor, ArchiveFormat};
use crate::http::HttpClient;
use crate::module_file::{locate_module_file, ModuleFile};
use crate::{ArchiveError, FetchConfig, Result};

const TEMP_DIR_PREFIX: &str = "bcrpub-";

/// Downloads release archives into fresh temporary directories.
pub struct ArchiveFetcher {
    http_client: HttpClient,
}

impl ArchiveFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self::with_client(HttpClient::with_config(config)?))
    }

    pub fn with_client(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    pub async fn fetch(&self, url: &str, strip_prefix: &str) -> Result<ReleaseArchive> {
        self.fetch_with_progress(url, strip_prefix, None::<fn(u64, u64)>)
            .await
    }

    /// Download `url` into a new temporary directory.
    ///
    /// The archive keeps the file name of the URL's last path segment. If the
    /// download fails the temporary directory is removed before returning.
    pub async fn fetch_with_progress<F>(
        &self,
        url: &str,
        strip_prefix: &str,
        progress: Option<F>,
    ) -> Result<ReleaseArchive>
    where
        F: Fn(u64, u64),
    {
        let file_name = archive_file_name(url)?;
        let temp_dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()?
            .keep();
        let disk_path = temp_dir.join(&file_name);

        log::debug!("Fetching {} into {}", url, disk_path.display());

        if let Err(e) = self.http_client.download(url, &disk_path, progress).await {
            if let Err(cleanup) = remove_dir_all_if_exists(&temp_dir).await {
                log::warn!(
                    "Failed to remove {} after download error: {}",
                    temp_dir.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        Ok(ReleaseArchive {
            url: url.to_string(),
            disk_path,
            strip_prefix: strip_prefix.to_string(),
            extract_dir: None,
        })
    }
}

/// A downloaded release archive.
///
/// Only [`ArchiveFetcher`] creates these. The owner must call
/// [`cleanup`](Self::cleanup) once done with the located module file; nothing
/// is removed on drop.
#[derive(Debug)]
pub struct ReleaseArchive {
    url: String,
    disk_path: PathBuf,
    strip_prefix: String,
    extract_dir: Option<PathBuf>,
}

impl ReleaseArchive {
    /// Unpack next to the downloaded file and locate `MODULE.bazel`.
    ///
    /// May run once per archive. The extraction directory is recorded before
    /// unpacking starts so that [`cleanup`](Self::cleanup) also removes
    /// whatever a failed extraction left behind.
    pub async fn extract(&mut self) -> Result<ModuleFile> {
        if self.extract_dir.is_some() {
            return Err(ArchiveError::AlreadyExtracted);
        }

        let extract_dir = self
            .disk_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                ArchiveError::Extraction(format!(
                    "{} has no parent directory",
                    self.disk_path.display()
                ))
            })?;
        self.extract_dir = Some(extract_dir.clone());

        ArchiveExtractor::extract(&self.disk_path, &extract_dir).await?;
        locate_module_file(&extract_dir, &self.strip_prefix).await
    }

    /// Remove the downloaded file and, if extraction ran, the extraction directory.
    ///
    /// Missing files are not an error, so this can be called any number of times.
    pub async fn cleanup(&mut self) -> Result<()> {
        log::trace!("Removing {}", self.disk_path.display());
        match tokio::fs::remove_file(&self.disk_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(extract_dir) = &self.extract_dir {
            log::trace!("Removing {}", extract_dir.display());
            remove_dir_all_if_exists(extract_dir).await?;
        }

        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn disk_path(&self) -> &Path {
        &self.disk_path
    }

    pub fn strip_prefix(&self) -> &str {
        &self.strip_prefix
    }

    pub fn extract_dir(&self) -> Option<&Path> {
        self.extract_dir.as_deref()
    }

    pub fn format(&self) -> Result<ArchiveFormat> {
        ArchiveFormat::from_path(&self.disk_path)
    }
}

fn archive_file_name(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| ArchiveError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ArchiveError::InvalidUrl {
            url: url.to_string(),
            reason: "URL path does not end in a file name".to_string(),
        })
}

async fn remove_dir_all_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

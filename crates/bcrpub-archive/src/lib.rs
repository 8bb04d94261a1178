pub mod archive;
pub mod config;
pub mod error;
pub mod http;
pub mod module_file;
pub mod release;

pub use archive::{ArchiveExtractor, ArchiveFormat};
pub use config::FetchConfig;
pub use error::{ArchiveError, Result};
pub use http::HttpClient;
pub use module_file::{locate_module_file, ModuleFile, MODULE_FILE_NAME};
pub use release::{ArchiveFetcher, ReleaseArchive};

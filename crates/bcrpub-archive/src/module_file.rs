//! Locating `MODULE.bazel` inside an extracted archive.

use std::path::{Component, Path, PathBuf};

use crate::{ArchiveError, Result};

pub const MODULE_FILE_NAME: &str = "MODULE.bazel";

/// Handle to a `MODULE.bazel` on disk. Its contents are not inspected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    path: PathBuf,
}

impl ModuleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub async fn read_to_string(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

/// Find `<extract_dir>/<strip_prefix>/MODULE.bazel`.
///
/// The prefix must stay inside `extract_dir`: absolute prefixes and `..`
/// components are reported as a missing module file.
pub async fn locate_module_file(extract_dir: &Path, strip_prefix: &str) -> Result<ModuleFile> {
    let relative = Path::new(strip_prefix).join(MODULE_FILE_NAME);
    let missing = || ArchiveError::MissingModuleFile {
        path: relative.to_string_lossy().into_owned(),
        strip_prefix: strip_prefix.to_string(),
    };

    if !is_contained(Path::new(strip_prefix)) {
        log::debug!("Strip prefix {:?} leaves the extracted archive", strip_prefix);
        return Err(missing());
    }

    let path = extract_dir.join(&relative);
    if !tokio::fs::try_exists(&path).await? {
        return Err(missing());
    }

    log::debug!("Located {}", path.display());
    Ok(ModuleFile::new(path))
}

fn is_contained(prefix: &Path) -> bool {
    prefix
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locate_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rules_foo-1.2.3")).unwrap();
        std::fs::write(dir.path().join("rules_foo-1.2.3/MODULE.bazel"), "module()").unwrap();

        let module = locate_module_file(dir.path(), "rules_foo-1.2.3").await.unwrap();

        assert_eq!(module.path(), dir.path().join("rules_foo-1.2.3/MODULE.bazel"));
        assert_eq!(module.read_to_string().await.unwrap(), "module()");
    }

    #[tokio::test]
    async fn test_locate_without_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MODULE.bazel"), "module()").unwrap();

        let module = locate_module_file(dir.path(), "").await.unwrap();
        assert_eq!(module.into_path(), dir.path().join("MODULE.bazel"));
    }

    #[tokio::test]
    async fn test_missing_module_file_names_path_and_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MODULE.bazel"), "module()").unwrap();

        let err = locate_module_file(dir.path(), "wrong-prefix").await.unwrap_err();
        match &err {
            ArchiveError::MissingModuleFile { path, strip_prefix } => {
                assert_eq!(path, "wrong-prefix/MODULE.bazel");
                assert_eq!(strip_prefix, "wrong-prefix");
            }
            other => panic!("Expected MissingModuleFile, got {:?}", other),
        }
        assert!(err.to_string().contains("wrong-prefix/MODULE.bazel"));
        assert!(err.to_string().contains("'wrong-prefix'"));
    }

    #[tokio::test]
    async fn test_absolute_prefix_is_rejected() {
        let extracted = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("MODULE.bazel"), "module()").unwrap();
        let prefix = outside.path().to_str().unwrap();

        let err = locate_module_file(extracted.path(), prefix).await.unwrap_err();
        match err {
            ArchiveError::MissingModuleFile { strip_prefix, .. } => {
                assert_eq!(strip_prefix, prefix);
            }
            other => panic!("Expected MissingModuleFile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parent_dir_prefix_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let extracted = root.path().join("extracted");
        std::fs::create_dir_all(extracted.join("inner")).unwrap();
        std::fs::write(root.path().join("MODULE.bazel"), "module()").unwrap();

        for prefix in ["..", "inner/../.."] {
            let err = locate_module_file(&extracted, prefix).await.unwrap_err();
            assert!(
                matches!(err, ArchiveError::MissingModuleFile { .. }),
                "prefix {:?} gave {:?}",
                prefix,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_current_dir_prefix_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("r-1.0")).unwrap();
        std::fs::write(dir.path().join("r-1.0/MODULE.bazel"), "module()").unwrap();

        let module = locate_module_file(dir.path(), "./r-1.0").await.unwrap();
        assert_eq!(module.read_to_string().await.unwrap(), "module()");
    }
}

//! Source description: where a release archive lives and how to step into it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Contents of a `source.json` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceSpec {
    pub url: Option<String>,

    #[serde(default)]
    pub strip_prefix: String,
}

impl SourceSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Command line values take precedence over the file.
    pub fn with_overrides(mut self, url: Option<String>, strip_prefix: Option<String>) -> Self {
        if url.is_some() {
            self.url = url;
        }
        if let Some(strip_prefix) = strip_prefix {
            self.strip_prefix = strip_prefix;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let spec = SourceSpec::parse(
            r#"{
                "url": "https://github.com/o/r/releases/download/v1.0.0/r-v1.0.0.tar.gz",
                "strip_prefix": "r-1.0.0",
                "integrity": "sha256-abc"
            }"#,
        )
        .unwrap();

        assert_eq!(
            spec.url.as_deref(),
            Some("https://github.com/o/r/releases/download/v1.0.0/r-v1.0.0.tar.gz")
        );
        assert_eq!(spec.strip_prefix, "r-1.0.0");
    }

    #[test]
    fn test_strip_prefix_defaults_to_empty() {
        let spec = SourceSpec::parse(r#"{"url": "https://example.com/a.zip"}"#).unwrap();
        assert_eq!(spec.strip_prefix, "");
    }

    #[test]
    fn test_overrides() {
        let spec = SourceSpec::parse(r#"{"url": "https://example.com/a.zip", "strip_prefix": "a"}"#)
            .unwrap()
            .with_overrides(None, Some("b".to_string()));
        assert_eq!(spec.url.as_deref(), Some("https://example.com/a.zip"));
        assert_eq!(spec.strip_prefix, "b");

        let spec = SourceSpec::default().with_overrides(Some("https://example.com/c.tar.xz".to_string()), None);
        assert_eq!(spec.url.as_deref(), Some("https://example.com/c.tar.xz"));
        assert_eq!(spec.strip_prefix, "");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.json");
        std::fs::write(&path, r#"{"url": "https://example.com/a.tar.gz", "strip_prefix": "a-1"}"#).unwrap();

        let spec = SourceSpec::load(&path).unwrap();
        assert_eq!(spec.strip_prefix, "a-1");

        let err = SourceSpec::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}

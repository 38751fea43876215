//! File-backed document host for the CLI.
//!
//! Information Hiding: how a document maps to the filesystem. The engine
//! only sees the `DocumentHost` trait; path handling and the extension to
//! language table stay here.

use crate::engine::DocumentHost;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Document host over a file on disk. Without a path there is no active
/// document: content reads as empty and apply is rejected.
pub struct FileDocument {
    path: Option<PathBuf>,
}

impl FileDocument {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl DocumentHost for FileDocument {
    fn language(&self) -> String {
        self.path
            .as_deref()
            .map(language_for_path)
            .unwrap_or_else(|| "plaintext".to_string())
    }

    async fn content(&self) -> Result<String> {
        let Some(path) = self.path.as_deref() else {
            return Ok(String::new());
        };

        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            // A path that does not exist yet is an empty document
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(Error::Document(format!("failed to read {:?}: {}", path, e))),
        }
    }

    async fn apply(&self, text: &str) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Err(Error::Document(
                "no active document; pass --file to target one".to_string(),
            ));
        };

        tokio::fs::write(path, text)
            .await
            .map_err(|e| Error::Document(format!("failed to write {:?}: {}", path, e)))?;

        tracing::info!("[FileDocument] Wrote {} bytes to {:?}", text.len(), path);
        Ok(())
    }
}

/// Editor-style language name for a file path.
pub fn language_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let name = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "md" => "markdown",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "rb" => "ruby",
        "sh" => "shell",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "sql" => "sql",
        "" => "plaintext",
        other => other,
    };

    name.to_string()
}

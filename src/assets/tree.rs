// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Immutable in-memory asset tree.
//!
//! Built once at startup from the web client's build output and shared
//! read-only for the process lifetime. Only regular files become entries, so
//! a directory can never be served as an asset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use axum::body::Bytes;
use walkdir::WalkDir;

/// Errors while building the asset tree.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Error scanning asset directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to read asset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One static file.
#[derive(Debug, Clone)]
pub struct Asset {
    content: Bytes,
    content_type: String,
    modified: Option<SystemTime>,
}

impl Asset {
    /// Build an asset; the content type is inferred from `path`.
    pub fn new(path: &str, content: impl Into<Bytes>, modified: Option<SystemTime>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type_for(path),
            modified,
        }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }
}

/// Content type from the file extension; text gets an explicit UTF-8 charset.
fn content_type_for(path: &str) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let is_text = mime.type_() == mime_guess::mime::TEXT
        || mime.essence_str() == "application/javascript"
        || mime.essence_str() == "application/json";

    if is_text {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}

/// Read-only mapping from relative path (`/`-separated, no leading slash) to asset.
#[derive(Debug, Clone, Default)]
pub struct AssetTree {
    assets: HashMap<String, Asset>,
}

impl AssetTree {
    /// Load every regular file under `root`.
    pub fn load(root: &Path) -> Result<Self, AssetError> {
        let mut assets = HashMap::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(key) = tree_key(root, path) else {
                continue;
            };

            let content = std::fs::read(path).map_err(|source| AssetError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let modified = entry.metadata().ok().and_then(|m| m.modified().ok());

            assets.insert(key.clone(), Asset::new(&key, content, modified));
        }

        Ok(Self { assets })
    }

    /// Build a tree from `(path, content)` pairs without touching the disk.
    pub fn from_entries<I, K, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<Bytes>,
    {
        let assets = entries
            .into_iter()
            .map(|(key, content)| {
                let key = key.into();
                let asset = Asset::new(&key, content, None);
                (key, asset)
            })
            .collect();
        Self { assets }
    }

    pub fn get(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// `root`-relative key with `/` separators.
fn tree_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_keeps_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::create_dir_all(dir.path().join("assets/img")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("assets/img/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let tree = AssetTree::load(dir.path()).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(tree.get("assets").is_none());
        assert!(tree.get("assets/img").is_none());
        assert_eq!(&tree.get("assets/app.js").unwrap().content()[..], b"console.log(1)");
        assert!(tree.get("index.html").unwrap().modified().is_some());
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("a/app.css"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("logo.png"), "image/png");
        assert_eq!(content_type_for("blob.unknownext"), "application/octet-stream");
    }

    #[test]
    fn from_entries_builds_lookup() {
        let tree = AssetTree::from_entries([("index.html", "home"), ("logo.svg", "<svg/>")]);
        assert_eq!(tree.len(), 2);
        assert!(!tree.is_empty());
        assert!(tree.get("/index.html").is_none());
        assert_eq!(tree.get("logo.svg").unwrap().content_type(), "image/svg+xml");
    }
}

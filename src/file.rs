//! Carrier files.
//!
//! A [`CarrierFile`] is the in-memory rendition of a file chosen in the picker: its
//! display name, a guessed MIME type and the raw bytes. The bytes are reference
//! counted, so handing the same selection to the preview and to a request is cheap.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, ensure};
use bytes::Bytes;
use fast_glob::glob_match;
use walkdir::WalkDir;

use crate::config::{EXCLUDED_PATTERNS, OUTPUT_PREFIX};
use crate::types::{Medium, Operation, Route};

const FALLBACK_MIME: &str = "application/octet-stream";

static EXCLUSION_MATCHERS: LazyLock<Vec<String>> = LazyLock::new(|| EXCLUDED_PATTERNS.iter().map(|s| (*s).to_owned()).collect());

/// A user-selected carrier file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierFile {
    name: String,
    mime: String,
    bytes: Bytes,
}

impl CarrierFile {
    /// Wraps bytes already in memory. The MIME type is guessed from the name.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = guess_mime_type(&name).to_owned();
        Self { name, mime, bytes: bytes.into() }
    }

    /// Reads a file from disk.
    ///
    /// Only the final path component is kept as the name, so the output name never
    /// carries directories.
    pub async fn load(path: &Path) -> Result<Self> {
        ensure!(!path.is_dir(), "path is a directory: {}", path.display());

        let bytes = tokio::fs::read(path).await.with_context(|| format!("failed to read file: {}", path.display()))?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "carrier".to_owned());

        Ok(Self::new(name, bytes))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Name the encoded carrier is saved under: `photo.png` becomes `encrypted_photo.png`.
    pub fn output_name(&self) -> String {
        format!("{OUTPUT_PREFIX}{}", self.name)
    }

    /// Advisory check against a route's picker filter.
    ///
    /// Returns a warning when the file does not look like what the route expects.
    /// The selection is accepted either way; the service has the final word.
    pub fn format_warning(&self, route: &Route) -> Option<String> {
        if route.accepts(&self.mime) {
            return None;
        }
        Some(format!("{} ({}) does not match the expected {} format; the service may reject it", self.name, self.mime, route.accept))
    }
}

/// Guesses a MIME type from a file name's extension.
pub fn guess_mime_type(name: &str) -> &'static str {
    mime_guess::from_path(name).first_raw().unwrap_or(FALLBACK_MIME)
}

/// Checks whether a path matches one of the discovery exclusion patterns.
pub fn is_excluded(path: &Path) -> bool {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let path_str = path_str.strip_prefix("./").unwrap_or(&path_str);

    EXCLUSION_MATCHERS.iter().any(|pattern| glob_match(pattern, path_str) || path.components().any(|comp| glob_match(pattern, comp.as_os_str().to_str().unwrap_or(""))))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Lists candidate carriers below `root` whose guessed type passes the route filter.
///
/// Encode skips outputs of a previous encode; decode is where those are wanted.
pub fn discover(root: &Path, operation: Operation, medium: Medium) -> Vec<PathBuf> {
    let route = Route::of(operation, medium);
    let skip_outputs = operation == Operation::Encode;

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| !is_hidden(path) && !is_excluded(path.strip_prefix(root).unwrap_or(path)))
        .filter(|path| {
            path.file_name().is_some_and(|name| {
                let name = name.to_string_lossy();
                route.accepts(guess_mime_type(&name)) && !(skip_outputs && name.starts_with(OUTPUT_PREFIX))
            })
        })
        .collect();

    found.sort();
    found
}

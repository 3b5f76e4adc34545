//! Preview resources for selected carriers.
//!
//! A selected image gets an ephemeral local URL so it can be shown without being
//! uploaded. Those URLs are platform resources, so they are minted and revoked
//! through the [`ObjectUrlStore`] seam:
//!
//! - [`MemoryBlobStore`] keeps the bytes in memory behind `blob:` URLs.
//! - [`TempFileStore`] writes each preview to a temporary file behind a `file://` URL,
//!   which is what the terminal front end uses so the preview can be opened in a viewer.
//!
//! [`PreviewResource`] is the scoped acquisition: whoever owns it owns the URL, and
//! dropping it revokes the URL. [`PreviewResourceManager`] keeps at most one of them
//! alive per form.

use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use hashbrown::HashMap;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::file::CarrierFile;
use crate::types::{Medium, Operation, Route};

/// A local URL referencing a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObjectUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints and revokes object URLs.
pub trait ObjectUrlStore: Send + Sync {
    /// Allocates a new URL for the file.
    fn create(&self, file: &CarrierFile) -> io::Result<ObjectUrl>;

    /// Frees a URL previously returned by [`create`](Self::create).
    fn revoke(&self, url: &ObjectUrl);
}

/// Running totals of URL allocations, shared by the stores.
#[derive(Debug, Default)]
pub struct UrlLedger {
    created: AtomicU64,
    revoked: AtomicU64,
}

impl UrlLedger {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn revoked(&self) -> u64 {
        self.revoked.load(Ordering::SeqCst)
    }

    /// URLs created and not yet revoked.
    pub fn live(&self) -> u64 {
        self.created() - self.revoked()
    }

    fn next(&self) -> u64 {
        self.created.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) {
        self.revoked.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory store handing out `blob:` URLs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<ObjectUrl, Bytes>>,
    ledger: UrlLedger,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &UrlLedger {
        &self.ledger
    }

    /// Looks up the bytes behind a live URL.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Bytes> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner).get(url).cloned()
    }
}

impl ObjectUrlStore for MemoryBlobStore {
    fn create(&self, file: &CarrierFile) -> io::Result<ObjectUrl> {
        let url = ObjectUrl(format!("blob:hushbox/{}", self.ledger.next()));
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner).insert(url.clone(), file.bytes().clone());
        Ok(url)
    }

    fn revoke(&self, url: &ObjectUrl) {
        if self.blobs.lock().unwrap_or_else(PoisonError::into_inner).remove(url).is_some() {
            self.ledger.release();
        }
    }
}

/// Store that materializes previews as temporary files.
///
/// Everything still live is removed when the store itself is dropped.
#[derive(Debug)]
pub struct TempFileStore {
    dir: TempDir,
    files: Mutex<HashMap<ObjectUrl, PathBuf>>,
    ledger: UrlLedger,
}

impl TempFileStore {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("hushbox-preview-").tempdir()?;
        Ok(Self { dir, files: Mutex::new(HashMap::new()), ledger: UrlLedger::default() })
    }

    pub fn ledger(&self) -> &UrlLedger {
        &self.ledger
    }
}

impl ObjectUrlStore for TempFileStore {
    fn create(&self, file: &CarrierFile) -> io::Result<ObjectUrl> {
        let id = self.ledger.created() + 1;
        let path = self.dir.path().join(format!("{id}-{}", file.name()));
        std::fs::write(&path, file.bytes())?;

        self.ledger.next();
        let url = ObjectUrl(format!("file://{}", path.display()));
        self.files.lock().unwrap_or_else(PoisonError::into_inner).insert(url.clone(), path);
        Ok(url)
    }

    fn revoke(&self, url: &ObjectUrl) {
        let Some(path) = self.files.lock().unwrap_or_else(PoisonError::into_inner).remove(url) else {
            return;
        };
        if let Err(err) = std::fs::remove_file(&path) {
            debug!(path = %path.display(), %err, "preview file already gone");
        }
        self.ledger.release();
    }
}

/// A selected file together with the URL allocated for it.
///
/// The URL is revoked exactly once, when this value is dropped.
pub struct PreviewResource {
    file: CarrierFile,
    url: Option<ObjectUrl>,
    store: Arc<dyn ObjectUrlStore>,
}

impl PreviewResource {
    pub fn file(&self) -> &CarrierFile {
        &self.file
    }

    /// The preview URL; `None` for audio or when allocation failed.
    pub fn url(&self) -> Option<&ObjectUrl> {
        self.url.as_ref()
    }
}

impl Drop for PreviewResource {
    fn drop(&mut self) {
        if let Some(url) = self.url.take() {
            debug!(%url, "revoking preview url");
            self.store.revoke(&url);
        }
    }
}

impl std::fmt::Debug for PreviewResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewResource").field("file", &self.file.name()).field("url", &self.url).finish()
    }
}

/// Owns the current selection of one form and its preview URL.
pub struct PreviewResourceManager {
    route: Route,
    medium: Medium,
    store: Arc<dyn ObjectUrlStore>,
    current: Option<PreviewResource>,
    warning: Option<String>,
}

impl PreviewResourceManager {
    pub fn new(operation: Operation, medium: Medium, store: Arc<dyn ObjectUrlStore>) -> Self {
        Self { route: Route::of(operation, medium), medium, store, current: None, warning: None }
    }

    /// Replaces the current selection.
    ///
    /// The previous URL is revoked before a new one is allocated. Images get a URL,
    /// audio only surfaces its name. A selection is always accepted: a format mismatch
    /// or a failed allocation only leaves a warning behind.
    pub fn select(&mut self, file: CarrierFile) -> &PreviewResource {
        self.release();

        self.warning = file.format_warning(&self.route);
        if let Some(warning) = &self.warning {
            warn!("{warning}");
        }

        let url = if self.medium.has_visual_preview() {
            match self.store.create(&file) {
                Ok(url) => {
                    debug!(%url, file = file.name(), "allocated preview url");
                    Some(url)
                }
                Err(err) => {
                    warn!(file = file.name(), %err, "preview unavailable");
                    None
                }
            }
        } else {
            None
        };

        self.current.insert(PreviewResource { file, url, store: Arc::clone(&self.store) })
    }

    /// Frees the current selection and its URL, if any.
    pub fn release(&mut self) {
        self.current = None;
        self.warning = None;
    }

    pub fn current(&self) -> Option<&PreviewResource> {
        self.current.as_ref()
    }

    pub fn file(&self) -> Option<&CarrierFile> {
        self.current.as_ref().map(PreviewResource::file)
    }

    /// Advisory warning about the current selection.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }
}

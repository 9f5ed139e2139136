//! Staged attachments and the preview resources behind them.
//!
//! A preview URL is an owned resource: `PreviewUrl` cannot be cloned, and the
//! manager hands it to the broker for release from a single place. Finalizing
//! moves the URL into the sent message instead.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Attachment, AttachmentKind};

/// Opaque host handle to the file the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle(PathBuf);

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHandle(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// What the host's file picker yields.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub handle: FileHandle,
}

impl SelectedFile {
    pub fn new(name: &str, size_bytes: u64, mime_type: &str, handle: FileHandle) -> Self {
        SelectedFile {
            name: name.to_string(),
            size_bytes,
            mime_type: mime_type.to_string(),
            handle,
        }
    }

    /// Read name and size from disk and guess the media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(SelectedFile {
            name,
            size_bytes: metadata.len(),
            mime_type: guess_mime_type(path).to_string(),
            handle: FileHandle::new(path),
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Human-readable size: "900 B", "12.5 KB", "2.4 MB".
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}

/// A revocable URL created by a `PreviewBroker`. Deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        PreviewUrl(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn into_string(self) -> String {
        self.0
    }
}

/// Host capability that mints and revokes preview URLs.
pub trait PreviewBroker {
    fn create(&mut self, handle: &FileHandle) -> PreviewUrl;
    fn release(&mut self, url: PreviewUrl);
}

/// In-process broker handing out `blob:<uuid>` URLs.
#[derive(Debug, Default)]
pub struct BlobUrlBroker {
    live: HashSet<String>,
}

impl BlobUrlBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.contains(url)
    }
}

impl PreviewBroker for BlobUrlBroker {
    fn create(&mut self, handle: &FileHandle) -> PreviewUrl {
        let url = format!("blob:{}", Uuid::new_v4());
        debug!("Created {} for {}", url, handle.path().display());
        self.live.insert(url.clone());
        PreviewUrl(url)
    }

    fn release(&mut self, url: PreviewUrl) {
        if !self.live.remove(url.as_str()) {
            warn!("Released unknown preview URL {}", url.as_str());
        }
    }
}

/// The file picked but not yet sent.
#[derive(Debug)]
pub struct StagedAttachment {
    handle: FileHandle,
    kind: AttachmentKind,
    name: String,
    size_label: String,
    preview: Option<PreviewUrl>,
}

impl StagedAttachment {
    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_label(&self) -> &str {
        &self.size_label
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewUrl::as_str)
    }
}

/// Holds at most one staged attachment and its preview resource.
pub struct AttachmentManager<B: PreviewBroker> {
    broker: B,
    staged: Option<StagedAttachment>,
}

impl<B: PreviewBroker> AttachmentManager<B> {
    pub fn new(broker: B) -> Self {
        AttachmentManager { broker, staged: None }
    }

    /// Stage `file` as `kind`. Anything already staged is replaced.
    pub fn stage(&mut self, file: SelectedFile, kind: AttachmentKind) -> &StagedAttachment {
        self.replace(file, kind)
    }

    /// Release the current preview, if any, before creating the next one.
    pub fn replace(&mut self, file: SelectedFile, kind: AttachmentKind) -> &StagedAttachment {
        self.discard();

        let preview = if file.is_image() {
            Some(self.broker.create(&file.handle))
        } else {
            None
        };

        debug!(
            "Staged {:?} attachment {} ({} bytes, preview: {})",
            kind,
            file.name,
            file.size_bytes,
            preview.is_some()
        );

        self.staged.insert(StagedAttachment {
            size_label: format_file_size(file.size_bytes),
            name: file.name,
            handle: file.handle,
            kind,
            preview,
        })
    }

    /// Drop the staged attachment and release its preview. No-op when empty.
    pub fn discard(&mut self) {
        if let Some(staged) = self.staged.take() {
            debug!("Discarding staged attachment {}", staged.name);
            if let Some(url) = staged.preview {
                self.release_preview(url);
            }
        }
    }

    /// Hand the staged attachment to a message. The preview URL is not
    /// released; the message owns it from now on.
    pub fn finalize(&mut self) -> Option<Attachment> {
        let staged = self.staged.take()?;
        let url = match staged.preview {
            Some(url) => url,
            // Documents get a URL only once they are sent
            None => self.broker.create(&staged.handle),
        };

        debug!("Finalized attachment {} -> {}", staged.name, url.as_str());
        Some(Attachment {
            kind: staged.kind,
            name: staged.name,
            url: url.into_string(),
            size_label: staged.size_label,
        })
    }

    pub fn staged(&self) -> Option<&StagedAttachment> {
        self.staged.as_ref()
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    fn release_preview(&mut self, url: PreviewUrl) {
        debug!("Releasing preview {}", url.as_str());
        self.broker.release(url);
    }
}

impl<B: PreviewBroker> Drop for AttachmentManager<B> {
    fn drop(&mut self) {
        self.discard();
    }
}

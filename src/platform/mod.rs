//! Output sinks: clipboard, file downloads and external viewers
//!
//! Export operations talk to the outside world only through the `Platform`
//! trait. `DesktopPlatform` writes to the system clipboard and the
//! filesystem; `RecordingPlatform` keeps every call in memory for tests.

pub mod clipboard;
pub mod download;
pub mod recording;

pub use clipboard::ClipboardImage;
pub use download::{sanitize_filename, PENDING_SUFFIX};
pub use recording::{PlatformCall, RecordingPlatform};

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::encode::EncodedImage;
use crate::Result;

/// Where an export ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Delivery {
    /// Written to the clipboard
    Clipboard { width: u32, height: u32 },
    /// Saved as a file in the download directory
    Saved { path: PathBuf },
    /// Handed to an external viewer because downloads are unavailable
    Opened { path: PathBuf },
}

/// Platform primitives used by the export operations
pub trait Platform: Send + Sync {
    /// Replace the clipboard contents with one image payload
    fn write_clipboard_image(&self, image: &ClipboardImage) -> Result<()>;

    /// Whether `download` can be used; when false, exports fall back to
    /// `open_in_new_context`
    fn supports_download(&self) -> bool;

    /// Store `bytes` under `filename` and return the final location
    fn download(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// Show an encoded image in a new viewing context
    fn open_in_new_context(&self, image: &EncodedImage, filename: &str) -> Result<PathBuf>;
}

/// System clipboard plus a download directory on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct DesktopPlatform {
    download_dir: Option<PathBuf>,
}

impl DesktopPlatform {
    /// `None` disables downloads, so image exports open a viewer instead
    pub fn new(download_dir: Option<PathBuf>) -> Self {
        Self { download_dir }
    }

    pub fn download_dir(&self) -> Option<&Path> {
        self.download_dir.as_deref()
    }
}

impl Platform for DesktopPlatform {
    fn write_clipboard_image(&self, image: &ClipboardImage) -> Result<()> {
        clipboard::write_system_clipboard(image)
    }

    fn supports_download(&self) -> bool {
        self.download_dir.as_ref().map(|d| d.is_dir()).unwrap_or(false)
    }

    fn download(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self
            .download_dir
            .as_deref()
            .ok_or_else(|| crate::Error::DownloadError("no download directory configured".into()))?;
        download::save_download(dir, filename, bytes)
    }

    fn open_in_new_context(&self, image: &EncodedImage, filename: &str) -> Result<PathBuf> {
        download::open_in_viewer(image, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_without_dir_cannot_download() {
        let p = DesktopPlatform::new(None);
        assert!(!p.supports_download());
        assert!(p.download("a.png", b"x").is_err());
    }

    #[test]
    fn desktop_with_dir_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let p = DesktopPlatform::new(Some(dir.path().to_path_buf()));
        assert!(p.supports_download());
        let path = p.download("a.png", b"abc").unwrap();
        assert_eq!(path, dir.path().join("a.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[test]
    fn delivery_serializes_with_kind() {
        let d = Delivery::Saved { path: PathBuf::from("image.png") };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"kind":"saved","path":"image.png"}"#);
    }
}

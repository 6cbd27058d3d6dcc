/// In-memory platform that records every call, for tests and dry runs

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{ClipboardImage, Platform};
use crate::encode::EncodedImage;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Clipboard(ClipboardImage),
    Download { filename: String, bytes: Vec<u8> },
    Open { filename: String, data_url: String },
}

pub struct RecordingPlatform {
    downloads: bool,
    calls: Mutex<Vec<PlatformCall>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::with_downloads(true)
    }

    /// `downloads == false` makes `supports_download` report false
    pub fn with_downloads(downloads: bool) -> Self {
        RecordingPlatform { downloads, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.log().clone()
    }

    fn record(&self, call: PlatformCall) {
        self.log().push(call);
    }

    /// A panic in another recording thread must not hide the calls made so far
    fn log(&self) -> MutexGuard<'_, Vec<PlatformCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for RecordingPlatform {
    fn write_clipboard_image(&self, image: &ClipboardImage) -> Result<()> {
        self.record(PlatformCall::Clipboard(image.clone()));
        Ok(())
    }

    fn supports_download(&self) -> bool {
        self.downloads
    }

    fn download(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.record(PlatformCall::Download { filename: filename.to_string(), bytes: bytes.to_vec() });
        Ok(PathBuf::from(filename))
    }

    fn open_in_new_context(&self, image: &EncodedImage, filename: &str) -> Result<PathBuf> {
        self.record(PlatformCall::Open { filename: filename.to_string(), data_url: image.data_url() });
        Ok(PathBuf::from(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let p = RecordingPlatform::new();
        p.download("a.png", b"1").unwrap();
        p.write_clipboard_image(&ClipboardImage::png(1, 1, vec![])).unwrap();
        let calls = p.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], PlatformCall::Download { filename, .. } if filename == "a.png"));
        assert!(matches!(&calls[1], PlatformCall::Clipboard(_)));
    }

    #[test]
    fn poisoned_log_keeps_recording() {
        let p = std::sync::Arc::new(RecordingPlatform::new());
        p.download("before.png", b"1").unwrap();

        let poisoner = std::sync::Arc::clone(&p);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.calls.lock().unwrap();
            panic!("recording thread died");
        })
        .join();
        assert!(joined.is_err());
        assert!(p.calls.is_poisoned());

        p.download("after.png", b"2").unwrap();
        let names: Vec<_> = p
            .calls()
            .into_iter()
            .map(|call| match call {
                PlatformCall::Download { filename, .. } => filename,
                other => panic!("unexpected call {:?}", other),
            })
            .collect();
        assert_eq!(names, ["before.png", "after.png"]);
    }

    #[test]
    fn download_support_is_configurable() {
        assert!(RecordingPlatform::new().supports_download());
        assert!(!RecordingPlatform::with_downloads(false).supports_download());
    }
}

/// Filesystem downloads and the external-viewer fallback

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::encode::EncodedImage;
use crate::{Error, Result};

/// Suffix of the pending file a download is staged in
pub const PENDING_SUFFIX: &str = ".part";
const PENDING_PREFIX: &str = ".elemshot-";

/// Reduce a caller-supplied name to a bare file stem.
///
/// Directory components are dropped and control characters removed; an
/// empty result falls back to `default`.
pub fn sanitize_filename(requested: Option<&str>, default: &str) -> String {
    let raw = requested.unwrap_or_default();
    let last = raw
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        default.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write `bytes` to `dir/filename`.
///
/// The data is staged in a pending file next to the destination and then
/// renamed into place. The pending file is removed on every path: it is
/// consumed by the rename on success and deleted on drop otherwise.
pub fn save_download(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut pending = tempfile::Builder::new()
        .prefix(PENDING_PREFIX)
        .suffix(PENDING_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| Error::DownloadError(format!("{}: {}", dir.display(), e)))?;

    pending
        .write_all(bytes)
        .and_then(|_| pending.as_file().sync_all())
        .map_err(|e| Error::DownloadError(format!("writing {}: {}", filename, e)))?;

    let dest = dir.join(filename);
    pending
        .persist(&dest)
        .map_err(|e| Error::DownloadError(format!("{}: {}", dest.display(), e.error)))?;
    log::debug!("saved {} bytes to {}", bytes.len(), dest.display());
    Ok(dest)
}

/// Write the image to the temp directory and open it with the system viewer
pub fn open_in_viewer(image: &EncodedImage, filename: &str) -> Result<PathBuf> {
    let path = stage_viewer_file(&std::env::temp_dir(), image, filename)?;
    open::that(&path).map_err(|e| Error::OpenError(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}

/// Persist `image` under a fresh, unique name in `dir` that keeps the
/// stem and extension of `filename`.
///
/// The file outlives the call so the viewer can read it.
pub fn stage_viewer_file(dir: &Path, image: &EncodedImage, filename: &str) -> Result<PathBuf> {
    let name = Path::new(filename);
    let stem = name.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    let suffix = name
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let mut staged = tempfile::Builder::new()
        .prefix(&format!("{}-", stem))
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(|e| Error::OpenError(format!("{}: {}", dir.display(), e)))?;
    staged
        .write_all(&image.bytes)
        .map_err(|e| Error::OpenError(format!("writing {}: {}", filename, e)))?;
    let (_, path) = staged
        .keep()
        .map_err(|e| Error::OpenError(format!("{}: {}", filename, e.error)))?;
    Ok(path)
}

/// Pending download files currently present in `dir`
pub fn pending_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pending = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(PENDING_PREFIX) && n.ends_with(PENDING_SUFFIX))
            .unwrap_or(false);
        if is_pending {
            found.push(path);
        }
    }
    Ok(found)
}

//! Filesystem side of the deletion cascade: media-extension checks, path
//! remapping/exclusion, and bounded pruning of emptied directories.

use crate::constants::{MEDIA_EXTENSIONS, prune};
use std::path::{Path, PathBuf};
use tracing::warn;

#[must_use]
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

/// True when any file under `dir` (recursively) still carries a media
/// extension, which makes the tree off-limits for pruning.
#[must_use]
pub fn contains_media_files(dir: &Path) -> bool {
    walkdir::WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .any(|entry| entry.path().is_file() && is_media_file(entry.path()))
}

/// Applies the configured `from:to` remaps (first occurrence only) and
/// normalizes backslashes, so paths reported by the media server line up with
/// the transfer destinations recorded locally.
#[must_use]
pub fn remap_path(path: &str, mappings: &[(String, String)]) -> String {
    let mut mapped = path.to_string();
    for (from, to) in mappings {
        mapped = mapped.replacen(from.as_str(), to.as_str(), 1).replace('\\', "/");
    }
    mapped
}

/// Prefix match against the configured exclusion list, compared as paths so
/// `/excluded` does not match `/excluded-other`.
#[must_use]
pub fn is_excluded(media_path: &str, prefixes: &[PathBuf]) -> bool {
    let path = Path::new(media_path);
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

/// Removes directories left empty of media after `file_path` was deleted.
///
/// Walks up from the file's parent through at most
/// [`prune::MAX_ANCESTOR_LEVELS`] ancestors. Stops as soon as an ancestor
/// still holds a media file or sits directly under the filesystem root.
/// Leftover non-media files (nfo, artwork) are removed along with the tree.
/// Best-effort: failures are logged, never propagated.
pub async fn remove_empty_parents(file_path: &Path) {
    let Some(parent) = file_path.parent() else {
        return;
    };
    if contains_media_files(parent) {
        return;
    }

    for (level, ancestor) in file_path.ancestors().skip(1).enumerate() {
        if level >= prune::MAX_ANCESTOR_LEVELS {
            break;
        }
        let Some(up) = ancestor.parent() else {
            break;
        };
        if up.parent().is_none() {
            // Would delete a top-level directory; stop at the root boundary.
            break;
        }
        if !ancestor.exists() {
            continue;
        }
        if contains_media_files(ancestor) {
            break;
        }
        match tokio::fs::remove_dir_all(ancestor).await {
            Ok(()) => warn!("Removed empty directory {}", ancestor.display()),
            Err(e) => {
                warn!("Failed to remove directory {}: {}", ancestor.display(), e);
                break;
            }
        }
    }
}

// nextboot - core/locator.rs
//
// Recursive search for the bootloader configuration on the EFI volume.
//
// The volume layout is unknown (rEFInd may live under EFI/refind/,
// EFI/BOOT/, or a vendor directory), so the whole tree is walked with
// `walkdir` until the first regular file with the requested name turns up.
//
//   - Inaccessible subtrees are non-fatal: logged and skipped.
//   - Entries are visited in file-name order so the result is stable on a
//     given tree. Duplicates are still the caller's problem.
//   - Symlinks are not followed.

use crate::util::constants;
use crate::util::error::LocateError;
use std::path::{Path, PathBuf};

/// Find the first regular file called `file_name` below `root`.
///
/// `max_depth` is clamped to `ABSOLUTE_MAX_DEPTH`. The returned path is
/// absolute; a relative `root` is resolved against the current directory.
///
/// # Errors
/// `RootNotFound` / `NotADirectory` when `root` is unusable, `NotFound` when
/// the walk completes without a match.
pub fn find_file(file_name: &str, root: &Path, max_depth: usize) -> Result<PathBuf, LocateError> {
    // fs::metadata rather than Path::is_dir so a missing root and a root that
    // is a file produce distinct errors.
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(LocateError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "Search root unavailable");
            return Err(LocateError::RootNotFound {
                path: root.to_path_buf(),
            });
        }
    }

    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| LocateError::CurrentDir { source })?
            .join(root)
    };

    let max_depth = max_depth.min(constants::ABSOLUTE_MAX_DEPTH);

    tracing::debug!(
        root = %root.display(),
        file_name,
        max_depth,
        "Searching for bootloader configuration"
    );

    let walker = walkdir::WalkDir::new(&root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name();

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                tracing::debug!(path = %path_str, error = %e, "Skipping inaccessible entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if entry.file_name() == file_name {
            let found = entry.into_path();
            tracing::info!(path = %found.display(), "Bootloader configuration located");
            return Ok(found);
        }
    }

    Err(LocateError::NotFound {
        file_name: file_name.to_string(),
        root,
    })
}

// =============================================================================
// Tests
// =============================================================================

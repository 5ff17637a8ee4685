// nextboot - core/selector.rs
//
// Backup, rewrite, and commit of the bootloader configuration.
//
// Ordering guarantees:
//   1. The directive is rewritten in memory first, so a config without a
//      usable directive fails before anything on disk changes.
//   2. The backup is created at most once (create-new semantics). A backup
//      that fails half-way is removed so it can never pose as the original.
//   3. The new content is written and flushed to the staging file; the live
//      config is only replaced once staging is complete.
//   4. Commit renames staging over the config. If the rename is refused
//      (staging on another volume), staging is copied over the config
//      instead and then removed.

use crate::core::directive::rewrite_default_selection;
use crate::core::model::{BackupStatus, BootTarget, RewriteMode, RewriteReport};
use crate::util::error::RewriteError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// The three files a rewrite touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePaths {
    /// Live bootloader configuration (as returned by the locator).
    pub config: PathBuf,
    /// One-time copy of the original configuration.
    pub backup: PathBuf,
    /// Scratch file holding the rewritten configuration before commit.
    pub staging: PathBuf,
}

fn io_err<'a>(
    path: &'a Path,
    operation: &'static str,
) -> impl FnOnce(io::Error) -> RewriteError + 'a {
    move |source| RewriteError::Io {
        path: path.to_path_buf(),
        operation,
        source,
    }
}

/// Point the config's `default_selection` directive at `target`.
///
/// See the module header for the on-disk ordering. `on_backup` is called as
/// soon as the backup step has finished, before staging, so the caller
/// learns about a fresh backup even if a later step fails. On `Err` the live
/// config is unchanged unless the failure happened inside the commit copy
/// fallback.
pub fn apply<F>(
    paths: &RewritePaths,
    target: &BootTarget,
    mode: RewriteMode,
    on_backup: F,
) -> Result<RewriteReport, RewriteError>
where
    F: FnOnce(BackupStatus),
{
    let original = fs::read(&paths.config).map_err(io_err(&paths.config, "read config"))?;

    let edit = rewrite_default_selection(&original, target, mode, &paths.config)?;

    let backup = ensure_backup(&paths.backup, &original)?;
    on_backup(backup);

    write_staging(&paths.staging, &edit.content)?;

    commit_with(&paths.staging, &paths.config, |from, to| fs::rename(from, to))?;

    tracing::info!(
        config = %paths.config.display(),
        previous = %edit.previous_value,
        new = %target,
        mode = mode.label(),
        "Default selection committed"
    );

    Ok(RewriteReport {
        config_path: paths.config.clone(),
        backup_path: paths.backup.clone(),
        backup,
        previous_value: edit.previous_value,
        line_number: edit.line_number,
        new_value: target.as_str().to_string(),
    })
}

/// Create the backup from `original` unless one already exists.
///
/// `create_new` makes the existence check and the creation one step, so an
/// existing backup is never opened for writing.
pub fn ensure_backup(backup: &Path, original: &[u8]) -> Result<BackupStatus, RewriteError> {
    create_backup_with(backup, original, |file, bytes| {
        file.write_all(bytes)?;
        file.sync_all()
    })
}

/// `ensure_backup` with the write step supplied by the caller.
fn create_backup_with<W>(
    backup: &Path,
    original: &[u8],
    write: W,
) -> Result<BackupStatus, RewriteError>
where
    W: FnOnce(&mut fs::File, &[u8]) -> io::Result<()>,
{
    let mut file = match OpenOptions::new().write(true).create_new(true).open(backup) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::info!(
                backup = %backup.display(),
                "Backup already exists; leaving it untouched"
            );
            return Ok(BackupStatus::AlreadyPresent);
        }
        Err(e) => return Err(io_err(backup, "create backup")(e)),
    };

    let written = write(&mut file, original);
    drop(file);

    if let Err(e) = written {
        if let Err(rm) = fs::remove_file(backup) {
            tracing::warn!(
                backup = %backup.display(),
                error = %rm,
                "Could not remove incomplete backup"
            );
        }
        return Err(io_err(backup, "write backup")(e));
    }

    tracing::info!(backup = %backup.display(), bytes = original.len(), "Backup created");
    Ok(BackupStatus::Created)
}

fn write_staging(staging: &Path, content: &[u8]) -> Result<(), RewriteError> {
    let result = fs::File::create(staging).and_then(|mut f| {
        f.write_all(content)?;
        f.sync_all()
    });

    if let Err(e) = result {
        // Only clean up if something was actually created.
        if staging.exists() {
            if let Err(rm) = fs::remove_file(staging) {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %rm,
                    "Could not remove incomplete staging file"
                );
            }
        }
        return Err(io_err(staging, "write staging file")(e));
    }

    tracing::debug!(staging = %staging.display(), bytes = content.len(), "Staging file written");
    Ok(())
}

/// Move staging over the config using `rename`, falling back to a copy.
fn commit_with<R>(staging: &Path, config: &Path, rename: R) -> Result<(), RewriteError>
where
    R: FnOnce(&Path, &Path) -> io::Result<()>,
{
    match rename(staging, config) {
        Ok(()) => {
            tracing::debug!(config = %config.display(), "Staging file renamed over config");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(
                staging = %staging.display(),
                config = %config.display(),
                error = %e,
                "Rename refused; copying staging over config"
            );
            fs::copy(staging, config).map_err(io_err(config, "commit staging file"))?;
            if let Err(rm) = fs::remove_file(staging) {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %rm,
                    "Could not remove staging file after commit"
                );
            }
            Ok(())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

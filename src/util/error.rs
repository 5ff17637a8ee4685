// nextboot - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation: every variant carries the path or
// command it concerns so the operator can act on the message.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for a nextboot invocation.
/// Errors are categorised by the subsystem that produced them. Every
/// variant is terminal: the invocation stops and no reboot is issued.
#[derive(Debug)]
pub enum NextbootError {
    /// The platform discriminator matched no built-in profile.
    UnknownPlatform { label: String },

    /// The requested boot target cannot be written into the directive.
    InvalidTarget(TargetError),

    /// The bootloader configuration could not be located.
    Locate(LocateError),

    /// Backup, rewrite, or commit of the configuration failed.
    Rewrite(RewriteError),

    /// The EFI volume could not be prepared.
    Mount(MountError),

    /// The process lacks the privileges needed to touch the EFI volume.
    Permission(PermissionError),

    /// Another invocation holds the volume lock.
    Lock(LockError),

    /// The reboot command could not be started.
    Reboot(RebootError),
}

impl fmt::Display for NextbootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlatform { label } => {
                write!(f, "No operating system found with label '{label}'")
            }
            Self::InvalidTarget(e) => write!(f, "Invalid boot target: {e}"),
            Self::Locate(e) => write!(f, "Locate error: {e}"),
            Self::Rewrite(e) => write!(f, "Rewrite error: {e}"),
            Self::Mount(e) => write!(f, "Mount error: {e}"),
            Self::Permission(e) => write!(f, "Permission error: {e}"),
            Self::Lock(e) => write!(f, "Lock error: {e}"),
            Self::Reboot(e) => write!(f, "Reboot error: {e}"),
        }
    }
}

impl std::error::Error for NextbootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownPlatform { .. } => None,
            Self::InvalidTarget(e) => Some(e),
            Self::Locate(e) => Some(e),
            Self::Rewrite(e) => Some(e),
            Self::Mount(e) => Some(e),
            Self::Permission(e) => Some(e),
            Self::Lock(e) => Some(e),
            Self::Reboot(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Target errors
// ---------------------------------------------------------------------------

/// Reasons a boot target label is rejected before any file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The label is empty or consists only of whitespace.
    Empty,

    /// The label contains a control character (line breaks included),
    /// which would split or corrupt the directive line.
    ControlCharacter { label: String },
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "the target label is empty"),
            Self::ControlCharacter { label } => write!(
                f,
                "the target label {label:?} contains a control character"
            ),
        }
    }
}

impl std::error::Error for TargetError {}

impl From<TargetError> for NextbootError {
    fn from(e: TargetError) -> Self {
        Self::InvalidTarget(e)
    }
}

// ---------------------------------------------------------------------------
// Locate errors
// ---------------------------------------------------------------------------

/// Errors raised while searching for the bootloader configuration.
#[derive(Debug)]
pub enum LocateError {
    /// The search root does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The search root is not a directory.
    NotADirectory { path: PathBuf },

    /// No regular file with the requested name exists below the root.
    NotFound { file_name: String, root: PathBuf },

    /// The current directory was needed to absolutise a relative root.
    CurrentDir { source: io::Error },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Search root '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Search root '{}' is not a directory", path.display())
            }
            Self::NotFound { file_name, root } => write!(
                f,
                "No file named '{file_name}' found below '{}'",
                root.display()
            ),
            Self::CurrentDir { source } => {
                write!(f, "Cannot resolve the current directory: {source}")
            }
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CurrentDir { source } => Some(source),
            _ => None,
        }
    }
}

impl From<LocateError> for NextbootError {
    fn from(e: LocateError) -> Self {
        Self::Locate(e)
    }
}

// ---------------------------------------------------------------------------
// Rewrite errors
// ---------------------------------------------------------------------------

/// Errors raised by the backup/rewrite/commit sequence.
#[derive(Debug)]
pub enum RewriteError {
    /// The configuration has no active `default_selection` directive, so a
    /// rewrite would silently change nothing.
    DirectiveNotFound { path: PathBuf },

    /// More than one active `default_selection` directive is present; which
    /// one the bootloader honours is not ours to guess.
    MultipleDirectives { path: PathBuf, lines: Vec<usize> },

    /// Filesystem failure with the path and the step that failed.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectiveNotFound { path } => write!(
                f,
                "'{}' contains no default_selection directive",
                path.display()
            ),
            Self::MultipleDirectives { path, lines } => write!(
                f,
                "'{}' contains {} default_selection directives (lines {lines:?}); \
                 keep exactly one and retry",
                path.display(),
                lines.len()
            ),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for RewriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RewriteError> for NextbootError {
    fn from(e: RewriteError) -> Self {
        Self::Rewrite(e)
    }
}

// ---------------------------------------------------------------------------
// Mount errors
// ---------------------------------------------------------------------------

/// Errors raised while preparing the EFI volume.
#[derive(Debug)]
pub enum MountError {
    /// The mount point directory could not be created.
    CreateMountPoint { path: PathBuf, source: io::Error },

    /// The mount command could not be started at all.
    Spawn { command: String, source: io::Error },

    /// The mount command ran but reported failure.
    Failed { command: String, status: String },
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateMountPoint { path, source } => write!(
                f,
                "Cannot create mount point '{}': {source}",
                path.display()
            ),
            Self::Spawn { command, source } => {
                write!(f, "Cannot run '{command}': {source}")
            }
            Self::Failed { command, status } => {
                write!(f, "'{command}' failed ({status})")
            }
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateMountPoint { source, .. } => Some(source),
            Self::Spawn { source, .. } => Some(source),
            Self::Failed { .. } => None,
        }
    }
}

impl From<MountError> for NextbootError {
    fn from(e: MountError) -> Self {
        Self::Mount(e)
    }
}

// ---------------------------------------------------------------------------
// Permission errors
// ---------------------------------------------------------------------------

/// The elevated-privilege precondition is not met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The process is not running with an effective UID of 0.
    NotElevated { euid: u32 },
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotElevated { euid } => write!(
                f,
                "root privileges are required to modify the EFI volume \
                 (effective uid is {euid}); re-run with sudo"
            ),
        }
    }
}

impl std::error::Error for PermissionError {}

impl From<PermissionError> for NextbootError {
    fn from(e: PermissionError) -> Self {
        Self::Permission(e)
    }
}

// ---------------------------------------------------------------------------
// Lock errors
// ---------------------------------------------------------------------------

/// Errors raised while taking the exclusive volume lock.
#[derive(Debug)]
pub enum LockError {
    /// The directory to lock could not be opened.
    Open { path: PathBuf, source: io::Error },

    /// Another process already holds the lock.
    Busy { path: PathBuf },

    /// The lock call itself failed for a reason other than contention.
    Lock { path: PathBuf, source: io::Error },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "Cannot open '{}' for locking: {source}", path.display())
            }
            Self::Busy { path } => write!(
                f,
                "'{}' is locked by another nextboot invocation",
                path.display()
            ),
            Self::Lock { path, source } => {
                write!(f, "Cannot lock '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Lock { source, .. } => Some(source),
            Self::Busy { .. } => None,
        }
    }
}

impl From<LockError> for NextbootError {
    fn from(e: LockError) -> Self {
        Self::Lock(e)
    }
}

// ---------------------------------------------------------------------------
// Reboot errors
// ---------------------------------------------------------------------------

/// The reboot command could not be launched.
#[derive(Debug)]
pub enum RebootError {
    Spawn { command: String, source: io::Error },
}

impl fmt::Display for RebootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { command, source } => {
                write!(f, "Cannot run '{command}': {source}")
            }
        }
    }
}

impl std::error::Error for RebootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
        }
    }
}

impl From<RebootError> for NextbootError {
    fn from(e: RebootError) -> Self {
        Self::Reboot(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to config.toml loading. Never fatal: the loader turns
/// them into warnings and falls back to defaults.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for nextboot results.
pub type Result<T> = std::result::Result<T, NextbootError>;

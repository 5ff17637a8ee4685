// nextboot - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies. Shared vocabulary across all layers.

use crate::util::error::TargetError;
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Boot target
// =============================================================================

/// The label the bootloader should select by default on the next boot.
///
/// Opaque to nextboot: rEFInd accepts a menu index (`1`), a substring of an
/// entry title (`Microsoft`), or `+` for the previously booted entry. The only
/// checks are the ones that keep the directive on a single well-formed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootTarget(String);

impl BootTarget {
    /// Validate a raw label from the command line.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        if raw.trim().is_empty() {
            return Err(TargetError::Empty);
        }
        if raw.chars().any(char::is_control) {
            return Err(TargetError::ControlCharacter {
                label: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Rewrite mode
// =============================================================================

/// How the `default_selection` directive is located and replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteMode {
    /// Replace exactly the one line holding the active directive; every other
    /// line is preserved byte-for-byte.
    #[default]
    Line,

    /// Replace everything from the start of the file up to and including the
    /// first directive and its value (non-greedy). Only content after the
    /// directive survives. Kept for configs written against older releases.
    Prefix,
}

impl RewriteMode {
    /// Parse the `[rewrite] mode` config value (case-insensitive).
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Some(Self::Line),
            "prefix" => Some(Self::Prefix),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Prefix => "prefix",
        }
    }
}

// =============================================================================
// Rewrite outcome
// =============================================================================

/// Whether this invocation created the backup or found an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    /// The backup did not exist and now holds the pre-rewrite content.
    Created,
    /// A backup from an earlier invocation exists and was left untouched.
    AlreadyPresent,
}

/// Summary of a committed rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// The configuration file that was rewritten.
    pub config_path: PathBuf,

    /// The backup file location.
    pub backup_path: PathBuf,

    pub backup: BackupStatus,

    /// Value the directive carried before the rewrite.
    pub previous_value: String,

    /// 1-based line of the replaced directive. `None` in prefix mode, where
    /// the replaced span is not a single line.
    pub line_number: Option<usize>,

    /// Value written into the directive.
    pub new_value: String,
}

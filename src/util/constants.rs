// nextboot - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Platform paths and commands live here so every built-in profile can be
// audited in one place.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "nextboot";

/// Application identifier used for the config directory.
pub const APP_ID: &str = "nextboot";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the optional configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default log level when neither RUST_LOG nor config.toml sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Bootloader configuration
// =============================================================================

/// File name of the rEFInd configuration searched for on the EFI volume.
pub const REFIND_CONFIG_NAME: &str = "refind.conf";

/// File name of the one-time backup, written at the volume root.
pub const REFIND_BACKUP_NAME: &str = "refind_backup.conf";

/// File name of the staging copy, written at the volume root.
pub const REFIND_STAGING_NAME: &str = "refind_temp.conf";

/// Keyword of the directive selecting the default menu entry.
pub const DEFAULT_SELECTION_KEYWORD: &str = "default_selection";

// =============================================================================
// Locator limits
// =============================================================================

/// Default directory recursion depth when searching for the config file.
///
/// rEFInd normally lives at `EFI/refind/refind.conf`, so ten levels is
/// generous.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Hard upper bound on search depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

// =============================================================================
// Platform A: Windows
// =============================================================================

/// Drive letter the EFI system partition is assigned to by `mountvol`.
pub const WINDOWS_EFI_DRIVE: &str = "Z:";

/// Volume root of the mounted EFI system partition.
pub const WINDOWS_EFI_ROOT: &str = "Z:\\";

/// Seconds `shutdown` waits before restarting on Windows.
pub const WINDOWS_REBOOT_DELAY_SECS: u32 = 5;

// =============================================================================
// Platform B: Linux
// =============================================================================

/// Mount point of the EFI system partition on Linux distributions.
pub const LINUX_EFI_ROOT: &str = "/boot/efi";

// =============================================================================
// Platform C: macOS
// =============================================================================

/// Mount point the EFI system partition is mounted on (created on demand).
pub const MACOS_EFI_ROOT: &str = "/Volumes/efi";

/// Block device holding the EFI system partition.
pub const MACOS_EFI_DEVICE: &str = "/dev/disk0s1";

/// Filesystem type passed to `mount -t`.
pub const MACOS_EFI_FSTYPE: &str = "msdos";

// nextboot - platform/profile.rs
//
// Built-in platform profiles: where the EFI volume lives, how it is made
// available, where backup and staging files go, and how to reboot.
// One immutable profile per supported platform; nothing else in the crate
// branches on the platform.

use crate::util::constants;
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Platform discriminator
// =============================================================================

/// Host platform selected by the first command-line argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Platform A, discriminator `1`.
    Windows,
    /// Platform B, discriminator `2`.
    Linux,
    /// Platform C, discriminator `4`.
    MacOs,
}

impl Platform {
    /// All supported platforms, in discriminator order.
    pub const ALL: [Platform; 3] = [Platform::Windows, Platform::Linux, Platform::MacOs];

    /// Resolve a command-line discriminator. Accepts the numeric labels and
    /// the platform names, case-insensitively.
    pub fn from_discriminator(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "1" | "windows" => Some(Self::Windows),
            "2" | "linux" | "ubuntu" => Some(Self::Linux),
            "4" | "macos" | "osx" => Some(Self::MacOs),
            _ => None,
        }
    }

    /// Numeric discriminator shown in `--help`.
    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Windows => "1",
            Self::Linux => "2",
            Self::MacOs => "4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::MacOs => "macOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Commands
// =============================================================================

/// An external program and its arguments. Run directly, never via a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How the EFI volume is made available before the search starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountStep {
    /// Where the volume shows up once the command has run.
    pub mount_point: PathBuf,

    /// Create `mount_point` as a directory first if it does not exist.
    pub create_mount_point: bool,

    pub command: CommandSpec,
}

// =============================================================================
// Profiles
// =============================================================================

/// Everything that differs between platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub platform: Platform,

    /// Directory tree searched for `refind.conf`.
    pub search_root: PathBuf,

    /// One-time backup of the original configuration.
    pub backup_path: PathBuf,

    /// Scratch file for the rewritten configuration.
    pub staging_path: PathBuf,

    /// Volume preparation, if the EFI volume is not permanently mounted.
    pub mount: Option<MountStep>,

    /// Issued after a successful commit; not waited on.
    pub reboot: CommandSpec,
}

impl PlatformProfile {
    /// The built-in profile for `platform`.
    pub fn builtin(platform: Platform) -> Self {
        match platform {
            Platform::Windows => {
                let root = PathBuf::from(constants::WINDOWS_EFI_ROOT);
                let delay = constants::WINDOWS_REBOOT_DELAY_SECS.to_string();
                Self {
                    platform,
                    backup_path: root.join(constants::REFIND_BACKUP_NAME),
                    staging_path: root.join(constants::REFIND_STAGING_NAME),
                    mount: Some(MountStep {
                        mount_point: root.clone(),
                        create_mount_point: false,
                        command: CommandSpec::new(
                            "mountvol",
                            &[constants::WINDOWS_EFI_DRIVE, "/S"],
                        ),
                    }),
                    reboot: CommandSpec::new("shutdown", &["/t", &delay, "/r"]),
                    search_root: root,
                }
            }
            Platform::Linux => {
                Self::rooted_at(platform, PathBuf::from(constants::LINUX_EFI_ROOT), None)
            }
            Platform::MacOs => {
                let root = PathBuf::from(constants::MACOS_EFI_ROOT);
                let mount = MountStep {
                    mount_point: root.clone(),
                    create_mount_point: true,
                    command: CommandSpec::new(
                        "mount",
                        &[
                            "-t",
                            constants::MACOS_EFI_FSTYPE,
                            constants::MACOS_EFI_DEVICE,
                            constants::MACOS_EFI_ROOT,
                        ],
                    ),
                };
                Self::rooted_at(platform, root, Some(mount))
            }
        }
    }

    /// A profile whose search root, backup, and staging files all live
    /// under `root`, rebooting with a plain `reboot`.
    ///
    /// This is the Linux and macOS layout; tests use it to point a profile
    /// at a temporary directory.
    pub fn rooted_at(platform: Platform, root: PathBuf, mount: Option<MountStep>) -> Self {
        Self {
            platform,
            backup_path: root.join(constants::REFIND_BACKUP_NAME),
            staging_path: root.join(constants::REFIND_STAGING_NAME),
            mount,
            reboot: CommandSpec::new("reboot", &[]),
            search_root: root,
        }
    }
}

/// Resolve a discriminator straight to its built-in profile.
pub fn profile_for(label: &str) -> Option<PlatformProfile> {
    Platform::from_discriminator(label).map(PlatformProfile::builtin)
}

/// One line per platform for `--help`, e.g. `  1  Windows`.
pub fn discriminator_table() -> String {
    Platform::ALL
        .iter()
        .map(|p| format!("  {}  {}", p.discriminator(), p.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_discriminators_and_aliases() {
        assert_eq!(Platform::from_discriminator("1"), Some(Platform::Windows));
        assert_eq!(Platform::from_discriminator("2"), Some(Platform::Linux));
        assert_eq!(Platform::from_discriminator("Ubuntu"), Some(Platform::Linux));
        assert_eq!(Platform::from_discriminator("4"), Some(Platform::MacOs));
        assert_eq!(Platform::from_discriminator("OSX"), Some(Platform::MacOs));
        assert_eq!(Platform::from_discriminator("3"), None);
        assert_eq!(Platform::from_discriminator(""), None);
    }

    #[test]
    fn test_discriminator_round_trip() {
        for p in Platform::ALL {
            assert_eq!(Platform::from_discriminator(p.discriminator()), Some(p));
        }
    }

    #[test]
    fn test_linux_profile_matches_table() {
        let p = PlatformProfile::builtin(Platform::Linux);
        assert_eq!(p.search_root, Path::new("/boot/efi"));
        assert_eq!(p.backup_path, Path::new("/boot/efi/refind_backup.conf"));
        assert_eq!(p.staging_path, Path::new("/boot/efi/refind_temp.conf"));
        assert!(p.mount.is_none());
        assert_eq!(p.reboot.to_string(), "reboot");
    }

    #[test]
    fn test_macos_profile_mounts_on_demand() {
        let p = PlatformProfile::builtin(Platform::MacOs);
        assert_eq!(p.search_root, Path::new("/Volumes/efi"));
        assert_eq!(p.backup_path, Path::new("/Volumes/efi/refind_backup.conf"));
        let mount = p.mount.expect("macOS mounts the EFI volume");
        assert!(mount.create_mount_point);
        assert_eq!(
            mount.command.to_string(),
            "mount -t msdos /dev/disk0s1 /Volumes/efi"
        );
    }

    #[test]
    fn test_windows_profile_delays_restart() {
        let p = PlatformProfile::builtin(Platform::Windows);
        assert_eq!(p.reboot.to_string(), "shutdown /t 5 /r");
        let mount = p.mount.expect("Windows assigns a drive letter");
        assert_eq!(mount.command.to_string(), "mountvol Z: /S");
        assert!(!mount.create_mount_point);
    }

    #[test]
    fn test_discriminator_table_lists_all() {
        let table = discriminator_table();
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("1  Windows"));
        assert!(table.contains("4  macOS"));
    }
}

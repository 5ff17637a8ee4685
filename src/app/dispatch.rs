// nextboot - app/dispatch.rs
//
// One invocation, start to finish: resolve the platform profile, check the
// privilege precondition, prepare the volume, locate and rewrite the config
// under the volume lock, then issue the reboot.
//
// The procedure is the same for every platform; only the `PlatformProfile`
// differs. Every failure is terminal and returns before the reboot, which
// stays the last action of a successful run.

use crate::core::locator::find_file;
use crate::core::model::{BackupStatus, BootTarget, RewriteReport};
use crate::core::selector::{self, RewritePaths};
use crate::platform::config::AppConfig;
use crate::platform::lock::VolumeLock;
use crate::platform::profile::{profile_for, CommandSpec, Platform, PlatformProfile};
use crate::platform::system::SystemOps;
use crate::util::constants;
use crate::util::error::{LocateError, NextbootError, Result};
use std::path::PathBuf;

/// Progress notifications, in the order they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// A profile was chosen; nothing has been touched yet.
    PlatformSelected {
        platform: Platform,
        search_root: PathBuf,
    },

    /// The mount step completed.
    VolumePrepared { mount_point: PathBuf },

    /// The bootloader configuration was found.
    ConfigLocated { path: PathBuf },

    /// The backup was created now or found from an earlier run.
    BackupChecked { status: BackupStatus, path: PathBuf },

    /// The rewritten configuration replaced the original.
    Committed {
        previous_value: String,
        new_value: String,
    },

    /// The reboot command is about to be started.
    Rebooting { command: CommandSpec },
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub platform: Platform,
    pub rewrite: RewriteReport,
    pub reboot: CommandSpec,
}

/// Run one invocation from the two command-line values.
///
/// An unknown `platform_label` returns `UnknownPlatform` before any side
/// effect, including calls on `system`.
pub fn run<F>(
    platform_label: &str,
    target_label: &str,
    config: &AppConfig,
    system: &mut dyn SystemOps,
    on_event: F,
) -> Result<SwitchReport>
where
    F: FnMut(&SwitchEvent),
{
    let profile = profile_for(platform_label).ok_or_else(|| {
        tracing::warn!(label = platform_label, "Unknown platform discriminator");
        NextbootError::UnknownPlatform {
            label: platform_label.to_string(),
        }
    })?;
    run_with_profile(&profile, target_label, config, system, on_event)
}

/// Run one invocation against an explicit profile.
///
/// `on_event` is called on the caller's thread as each step completes.
pub fn run_with_profile<F>(
    profile: &PlatformProfile,
    target_label: &str,
    config: &AppConfig,
    system: &mut dyn SystemOps,
    mut on_event: F,
) -> Result<SwitchReport>
where
    F: FnMut(&SwitchEvent),
{
    let target = BootTarget::parse(target_label)?;

    tracing::info!(
        platform = %profile.platform,
        target = %target,
        search_root = %profile.search_root.display(),
        mode = config.rewrite_mode.label(),
        "Switching default boot entry"
    );
    on_event(&SwitchEvent::PlatformSelected {
        platform: profile.platform,
        search_root: profile.search_root.clone(),
    });

    system.check_privileges()?;

    if let Some(step) = &profile.mount {
        system.prepare_volume(step)?;
        on_event(&SwitchEvent::VolumePrepared {
            mount_point: step.mount_point.clone(),
        });
    }

    if !profile.search_root.exists() {
        return Err(LocateError::RootNotFound {
            path: profile.search_root.clone(),
        }
        .into());
    }

    let rewrite = {
        let _lock = VolumeLock::acquire(&profile.search_root)?;

        let config_path = find_file(
            constants::REFIND_CONFIG_NAME,
            &profile.search_root,
            config.max_depth,
        )?;
        on_event(&SwitchEvent::ConfigLocated {
            path: config_path.clone(),
        });

        let paths = RewritePaths {
            config: config_path,
            backup: profile.backup_path.clone(),
            staging: profile.staging_path.clone(),
        };
        selector::apply(&paths, &target, config.rewrite_mode, |status| {
            on_event(&SwitchEvent::BackupChecked {
                status,
                path: paths.backup.clone(),
            })
        })?
    };

    on_event(&SwitchEvent::Committed {
        previous_value: rewrite.previous_value.clone(),
        new_value: rewrite.new_value.clone(),
    });

    on_event(&SwitchEvent::Rebooting {
        command: profile.reboot.clone(),
    });
    system.reboot(&profile.reboot)?;

    Ok(SwitchReport {
        platform: profile.platform,
        rewrite,
        reboot: profile.reboot.clone(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::profile::MountStep;
    use crate::util::error::{MountError, PermissionError, RebootError, RewriteError};
    use std::fs;
    use tempfile::TempDir;

    /// Records every call; optionally fails one of them.
    #[derive(Default)]
    struct FakeSystem {
        calls: Vec<String>,
        deny_privileges: bool,
        fail_mount: bool,
    }

    impl SystemOps for FakeSystem {
        fn check_privileges(&self) -> std::result::Result<(), PermissionError> {
            if self.deny_privileges {
                Err(PermissionError::NotElevated { euid: 1000 })
            } else {
                Ok(())
            }
        }

        fn prepare_volume(&mut self, step: &MountStep) -> std::result::Result<(), MountError> {
            self.calls.push(format!("mount: {}", step.command));
            if self.fail_mount {
                return Err(MountError::Failed {
                    command: step.command.to_string(),
                    status: "exit status: 32".to_string(),
                });
            }
            Ok(())
        }

        fn reboot(&mut self, command: &CommandSpec) -> std::result::Result<(), RebootError> {
            self.calls.push(format!("reboot: {command}"));
            Ok(())
        }
    }

    fn efi_volume(conf: &str) -> (TempDir, PlatformProfile) {
        let dir = tempfile::tempdir().expect("tempdir");
        let refind = dir.path().join("EFI").join("refind");
        fs::create_dir_all(&refind).expect("mkdir");
        fs::write(refind.join("refind.conf"), conf).expect("write refind.conf");
        let profile = PlatformProfile::rooted_at(Platform::Linux, dir.path().to_path_buf(), None);
        (dir, profile)
    }

    fn dir_listing(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = walkdir::WalkDir::new(dir.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().display().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_successful_switch_reboots_last() {
        let (dir, profile) = efi_volume("timeout 20\ndefault_selection 2\n");
        let mut system = FakeSystem::default();
        let mut events = Vec::new();

        let report = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |e| {
            events.push(e.clone())
        })
        .unwrap();

        assert_eq!(report.rewrite.backup, BackupStatus::Created);
        assert_eq!(system.calls, vec!["reboot: reboot".to_string()]);
        assert_eq!(
            fs::read_to_string(dir.path().join("refind_backup.conf")).unwrap(),
            "timeout 20\ndefault_selection 2\n"
        );
        assert!(matches!(events.first(), Some(SwitchEvent::PlatformSelected { .. })));
        assert!(matches!(events.last(), Some(SwitchEvent::Rebooting { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, SwitchEvent::ConfigLocated { .. })));
    }

    #[test]
    fn test_unknown_platform_touches_nothing() {
        let (dir, _) = efi_volume("default_selection 2\n");
        let before = dir_listing(&dir);
        let mut system = FakeSystem::default();
        let mut events = 0;

        let result = run("3", "7", &AppConfig::default(), &mut system, |_| events += 1);

        assert!(
            matches!(result, Err(NextbootError::UnknownPlatform { ref label }) if label == "3"),
            "got {result:?}"
        );
        assert!(system.calls.is_empty(), "no mount or reboot calls expected");
        assert_eq!(events, 0);
        assert_eq!(dir_listing(&dir), before);
    }

    #[test]
    fn test_invalid_target_rejected_before_side_effects() {
        let (dir, profile) = efi_volume("default_selection 2\n");
        let mut system = FakeSystem::default();

        let result = run_with_profile(&profile, "  ", &AppConfig::default(), &mut system, |_| {});

        assert!(matches!(result, Err(NextbootError::InvalidTarget(_))));
        assert!(system.calls.is_empty());
        assert!(!dir.path().join("refind_backup.conf").exists());
    }

    #[test]
    fn test_missing_privileges_fail_fast() {
        let (dir, mut profile) = efi_volume("default_selection 2\n");
        profile.mount = Some(MountStep {
            mount_point: dir.path().to_path_buf(),
            create_mount_point: false,
            command: CommandSpec::new("mount", &["/dev/sda1", "/boot/efi"]),
        });
        let mut system = FakeSystem {
            deny_privileges: true,
            ..Default::default()
        };

        let result = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |_| {});

        assert!(matches!(result, Err(NextbootError::Permission(_))));
        assert!(system.calls.is_empty(), "must not mount without privileges");
    }

    #[test]
    fn test_mount_failure_is_fatal_and_skips_reboot() {
        let (dir, mut profile) = efi_volume("default_selection 2\n");
        profile.mount = Some(MountStep {
            mount_point: dir.path().to_path_buf(),
            create_mount_point: true,
            command: CommandSpec::new("mount", &["-t", "msdos", "/dev/disk0s1", "/Volumes/efi"]),
        });
        let mut system = FakeSystem {
            fail_mount: true,
            ..Default::default()
        };

        let result = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |_| {});

        assert!(matches!(result, Err(NextbootError::Mount(_))));
        assert_eq!(system.calls.len(), 1, "only the mount attempt: {:?}", system.calls);
        assert!(system.calls[0].starts_with("mount:"));
    }

    #[test]
    fn test_missing_directive_skips_reboot() {
        let (dir, profile) = efi_volume("timeout 20\n");
        let mut system = FakeSystem::default();

        let result = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |_| {});

        assert!(matches!(
            result,
            Err(NextbootError::Rewrite(RewriteError::DirectiveNotFound { .. }))
        ));
        assert!(system.calls.is_empty());
        assert!(!dir.path().join("refind_backup.conf").exists());
    }

    #[test]
    fn test_backup_event_sent_even_when_commit_fails() {
        let (dir, mut profile) = efi_volume("default_selection 2\n");
        profile.staging_path = dir.path().join("missing-dir").join("refind_temp.conf");
        let mut system = FakeSystem::default();
        let mut events = Vec::new();

        let result = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |e| {
            events.push(e.clone())
        });

        assert!(matches!(result, Err(NextbootError::Rewrite(_))), "got {result:?}");
        assert!(
            events.iter().any(|e| matches!(
                e,
                SwitchEvent::BackupChecked { status: BackupStatus::Created, .. }
            )),
            "got {events:?}"
        );
        assert!(!events.iter().any(|e| matches!(e, SwitchEvent::Committed { .. })));
        assert!(dir.path().join("refind_backup.conf").exists());
        assert!(system.calls.is_empty());
    }

    #[test]
    fn test_missing_config_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let profile = PlatformProfile::rooted_at(Platform::Linux, dir.path().to_path_buf(), None);
        let mut system = FakeSystem::default();

        let result = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |_| {});

        assert!(matches!(
            result,
            Err(NextbootError::Locate(LocateError::NotFound { .. }))
        ));
        assert!(system.calls.is_empty());
    }

    #[test]
    fn test_missing_search_root_is_root_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Volumes").join("efi");
        let profile = PlatformProfile::rooted_at(Platform::MacOs, missing, None);
        let mut system = FakeSystem::default();

        let result = run_with_profile(&profile, "7", &AppConfig::default(), &mut system, |_| {});

        assert!(matches!(
            result,
            Err(NextbootError::Locate(LocateError::RootNotFound { .. }))
        ));
    }
}

// nextboot - platform/system.rs
//
// Operating-system side effects: the privilege precondition, preparing the
// EFI volume, and issuing the reboot.
//
// `SystemOps` is the seam between the dispatcher and the machine. The
// binary uses `NativeSystem`; tests substitute a recording fake so the
// dispatcher can be exercised without mounting or rebooting anything.

use crate::platform::profile::{CommandSpec, MountStep};
use crate::util::error::{MountError, PermissionError, RebootError};
use std::process::Command;

/// Side effects the dispatcher needs from the host.
pub trait SystemOps {
    /// Fail unless the process may read and write the EFI volume.
    fn check_privileges(&self) -> Result<(), PermissionError>;

    /// Make the EFI volume available at `step.mount_point`.
    fn prepare_volume(&mut self, step: &MountStep) -> Result<(), MountError>;

    /// Start the reboot command and return without waiting for it.
    fn reboot(&mut self, command: &CommandSpec) -> Result<(), RebootError>;
}

/// `SystemOps` backed by the real operating system.
#[derive(Debug, Default)]
pub struct NativeSystem;

impl SystemOps for NativeSystem {
    fn check_privileges(&self) -> Result<(), PermissionError> {
        check_elevated()
    }

    fn prepare_volume(&mut self, step: &MountStep) -> Result<(), MountError> {
        if step.create_mount_point {
            if step.mount_point.is_dir() {
                tracing::info!(
                    mount_point = %step.mount_point.display(),
                    "Mount point already exists"
                );
            } else {
                std::fs::create_dir_all(&step.mount_point).map_err(|source| {
                    MountError::CreateMountPoint {
                        path: step.mount_point.clone(),
                        source,
                    }
                })?;
                tracing::debug!(mount_point = %step.mount_point.display(), "Mount point created");
            }
        }

        let command = step.command.to_string();
        tracing::debug!(command = %command, "Preparing EFI volume");

        let status = Command::new(&step.command.program)
            .args(&step.command.args)
            .status()
            .map_err(|source| MountError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(MountError::Failed {
                command,
                status: status.to_string(),
            });
        }

        tracing::info!(mount_point = %step.mount_point.display(), "EFI volume ready");
        Ok(())
    }

    fn reboot(&mut self, command: &CommandSpec) -> Result<(), RebootError> {
        tracing::info!(command = %command, "Issuing reboot");
        // The child is dropped without waiting; the OS tears this process
        // down shortly after anyway.
        Command::new(&command.program)
            .args(&command.args)
            .spawn()
            .map(|_child| ())
            .map_err(|source| RebootError::Spawn {
                command: command.to_string(),
                source,
            })
    }
}

#[cfg(unix)]
fn check_elevated() -> Result<(), PermissionError> {
    let euid = nix::unistd::geteuid();
    if euid.is_root() {
        Ok(())
    } else {
        Err(PermissionError::NotElevated {
            euid: euid.as_raw(),
        })
    }
}

#[cfg(not(unix))]
fn check_elevated() -> Result<(), PermissionError> {
    // No portable elevation query here; access denials on the volume surface
    // as I/O or mount errors instead.
    tracing::debug!("Privilege check skipped on this platform");
    Ok(())
}

// nextboot - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing (exactly two positional values)
// 2. config.toml loading and logging initialisation
// 3. Running the switch and printing progress for the operator

use clap::Parser;
use nextboot::app::dispatch::{self, SwitchEvent};
use nextboot::core::model::BackupStatus;
use nextboot::platform::config::{load_config, PlatformPaths};
use nextboot::platform::profile::discriminator_table;
use nextboot::platform::system::NativeSystem;
use nextboot::util;

/// nextboot - choose the operating system a rEFInd machine boots next.
///
/// Rewrites `default_selection` in refind.conf (keeping a one-time backup
/// next to it) and restarts the machine.
#[derive(Parser, Debug)]
#[command(name = "nextboot", version, about, after_help = after_help())]
struct Cli {
    /// Platform this command runs on (see the table below).
    source_platform: String,

    /// Value written after `default_selection`, e.g. a menu index.
    target_boot_label: String,
}

fn after_help() -> String {
    format!("Platforms:\n{}", discriminator_table())
}

fn print_event(event: &SwitchEvent) {
    match event {
        SwitchEvent::PlatformSelected {
            platform,
            search_root,
        } => println!(
            "Running {platform} tasks (EFI volume: {})",
            search_root.display()
        ),
        SwitchEvent::VolumePrepared { mount_point } => {
            println!("EFI volume mounted at {}", mount_point.display())
        }
        SwitchEvent::ConfigLocated { path } => println!("{}", path.display()),
        SwitchEvent::BackupChecked { status, path } => match status {
            BackupStatus::Created => {
                println!("Original refind.conf backed up to {}", path.display())
            }
            BackupStatus::AlreadyPresent => println!(
                "The copy of the original refind.conf already exists at {}",
                path.display()
            ),
        },
        SwitchEvent::Committed {
            previous_value,
            new_value,
        } => println!("default_selection changed from {previous_value} to {new_value}"),
        SwitchEvent::Rebooting { command } => {
            println!("The next boot OS has changed. Restarting ({command}).")
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let (config, config_warnings) = load_config(&platform_paths.config_dir);

    util::logging::init(config.log_level.as_deref(), config.log_file.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        platform = %cli.source_platform,
        target = %cli.target_boot_label,
        "nextboot starting"
    );

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
        eprintln!("Warning: {warning}");
    }

    let mut system = NativeSystem;
    let result = dispatch::run(
        &cli.source_platform,
        &cli.target_boot_label,
        &config,
        &mut system,
        print_event,
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Switch failed; no reboot issued");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

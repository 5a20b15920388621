//! Systemd unit file generation and registration.

use std::path::{Path, PathBuf};

use crate::command::CommandRunner;
use crate::context::SetupContext;
use crate::error::SetupError;
use crate::install::file_ops::{FileOutcome, create_if_absent};
use crate::install::packages::RSYNC_BINARY;
use crate::output;

use super::service_control::{
    enable_systemd_service, has_systemd, is_unit_registered, reload_systemd_daemon,
};

pub const SERVICE_NAME: &str = "rsync";
pub const DEFAULT_RSYNC_PATH: &str = "/usr/bin/rsync";
const UNIT_MODE: u32 = 0o644;

/// Systemd service definition for the rsync daemon
#[derive(Debug, Clone)]
pub struct SystemdUnit {
    pub description: String,
    pub binary_path: PathBuf,
    pub config_path: PathBuf,
    pub restart_sec: u32,
}

impl SystemdUnit {
    pub fn new(binary_path: &Path, config_path: &Path) -> Self {
        Self {
            description: "fast remote file copy program daemon".to_string(),
            binary_path: binary_path.to_path_buf(),
            config_path: config_path.to_path_buf(),
            restart_sec: 1,
        }
    }

    pub fn render(&self) -> String {
        let mut content = String::with_capacity(512);

        content.push_str("[Unit]\n");
        content.push_str(&format!("Description={}\n", self.description));
        content.push_str(&format!(
            "ConditionPathExists={}\n",
            self.config_path.display()
        ));
        content.push_str("Wants=network-online.target\n");
        content.push_str("After=network.target network-online.target\n");
        content.push('\n');

        content.push_str("[Service]\n");
        content.push_str(&format!(
            "ExecStart={} --daemon --no-detach\n",
            self.binary_path.display()
        ));
        content.push_str("Restart=on-failure\n");
        content.push_str(&format!("RestartSec={}\n", self.restart_sec));
        content.push('\n');

        content.push_str("[Install]\n");
        content.push_str("WantedBy=multi-user.target\n");

        content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// No systemd tooling on this host.
    Skipped,
    /// Unit was written, then reloaded and enabled.
    Created,
    /// Unit already known or present on disk; reloaded and enabled.
    AlreadyRegistered,
}

/// Register and enable the rsync systemd unit.
///
/// The unit file is only written when systemd does not list the unit and
/// nothing exists at the unit path. Reload and enable always run.
pub async fn register_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
) -> Result<RegistrationOutcome, SetupError> {
    if !has_systemd(runner) {
        output::warning("systemctl not found, skipping systemd unit registration");
        return Ok(RegistrationOutcome::Skipped);
    }

    let unit_path = &ctx.paths.systemd_unit;
    let outcome = if is_unit_registered(runner, ctx, SERVICE_NAME).await? {
        output::info(&format!("{SERVICE_NAME}.service is already registered"));
        RegistrationOutcome::AlreadyRegistered
    } else {
        let binary = runner
            .resolve(RSYNC_BINARY)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RSYNC_PATH));
        let unit = SystemdUnit::new(&binary, &ctx.paths.daemon_config);

        match create_if_absent(unit_path, &unit.render(), UNIT_MODE)? {
            FileOutcome::Created => {
                output::success(&format!("Created {}", unit_path.display()));
                RegistrationOutcome::Created
            }
            FileOutcome::AlreadyPresent => {
                output::warning(&format!(
                    "{} already exists, leaving it untouched",
                    unit_path.display()
                ));
                RegistrationOutcome::AlreadyRegistered
            }
        }
    };

    reload_systemd_daemon(runner, ctx).await?;
    enable_systemd_service(runner, ctx, SERVICE_NAME).await?;
    output::success(&format!("{SERVICE_NAME}.service enabled at boot"));

    Ok(outcome)
}

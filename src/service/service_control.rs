//! Service-manager control operations.
//!
//! Thin wrappers over `systemctl`, `service`, `rc-update` and `rc-service`.
//! Each wrapper fails on a non-zero exit so callers decide whether a failure
//! is fatal or triggers a fallback.

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::context::SetupContext;
use crate::error::SetupError;

pub const SYSTEMCTL: &str = "systemctl";

/// Whether systemd tooling is on `PATH`.
pub fn has_systemd<R: CommandRunner>(runner: &R) -> bool {
    runner.is_available(SYSTEMCTL)
}

async fn systemctl<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    args: &[&str],
) -> Result<CommandOutput, SetupError> {
    let cmd = CommandSpec::new(SYSTEMCTL, args.iter().copied(), ctx.timeouts.command());
    runner.run_checked(&cmd).await
}

/// Whether systemd already knows a unit named `<service_name>.service`.
pub async fn is_unit_registered<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    service_name: &str,
) -> Result<bool, SetupError> {
    let unit = format!("{service_name}.service");
    let cmd = CommandSpec::new(
        SYSTEMCTL,
        ["list-unit-files", unit.as_str()],
        ctx.timeouts.command(),
    );
    // list-unit-files exits non-zero when nothing matches.
    let output = runner.run(&cmd).await?;
    Ok(output
        .stdout
        .lines()
        .any(|line| line.split_whitespace().next() == Some(unit.as_str())))
}

/// Reload systemd daemon to pick up changes
pub async fn reload_systemd_daemon<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
) -> Result<(), SetupError> {
    systemctl(runner, ctx, &["daemon-reload"]).await.map(drop)
}

/// Enable the systemd service for start at boot
pub async fn enable_systemd_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    service_name: &str,
) -> Result<(), SetupError> {
    systemctl(runner, ctx, &["enable", service_name]).await.map(drop)
}

/// Start the systemd service
pub async fn start_systemd_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    service_name: &str,
) -> Result<(), SetupError> {
    systemctl(runner, ctx, &["start", service_name]).await.map(drop)
}

/// Start through the SysV-style `service` wrapper.
pub async fn start_native_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    service_name: &str,
) -> Result<(), SetupError> {
    let cmd = CommandSpec::new("service", [service_name, "start"], ctx.timeouts.command());
    runner.run_checked(&cmd).await.map(drop)
}

/// Add the service to OpenRC's default runlevel.
pub async fn enable_openrc_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    service_name: &str,
) -> Result<(), SetupError> {
    let cmd = CommandSpec::new(
        "rc-update",
        ["add", service_name, "default"],
        ctx.timeouts.command(),
    );
    runner.run_checked(&cmd).await.map(drop)
}

pub async fn start_openrc_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    service_name: &str,
) -> Result<(), SetupError> {
    let cmd = CommandSpec::new("rc-service", [service_name, "start"], ctx.timeouts.command());
    runner.run_checked(&cmd).await.map(drop)
}

//! Daemon start with xinetd fallback.

use crate::command::CommandRunner;
use crate::context::SetupContext;
use crate::distro::DistroFamily;
use crate::error::SetupError;
use crate::output;

use super::service_control::{has_systemd, start_native_service, start_systemd_service};
use super::unit::SERVICE_NAME;
use super::xinetd::setup_xinetd;

/// Which mechanism ended up serving rsync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Systemd,
    NativeInit,
    Xinetd,
    NotStarted,
}

/// Start the rsync daemon.
///
/// A failed primary start switches to xinetd instead of surfacing the error.
/// Unsupported distributions only get an advisory.
pub async fn start_service<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
) -> Result<StartOutcome, SetupError> {
    match ctx.family {
        DistroFamily::Debian | DistroFamily::RedHat | DistroFamily::Arch if has_systemd(runner) => {
            match start_systemd_service(runner, ctx, SERVICE_NAME).await {
                Ok(()) => {
                    output::success(&format!("{SERVICE_NAME}.service started"));
                    Ok(StartOutcome::Systemd)
                }
                Err(e) => {
                    output::warning(&format!("systemd start failed ({e}), falling back to xinetd"));
                    fallback(runner, ctx).await
                }
            }
        }
        DistroFamily::Debian => match start_native_service(runner, ctx, SERVICE_NAME).await {
            Ok(()) => {
                output::success(&format!("{SERVICE_NAME} started through `service`"));
                Ok(StartOutcome::NativeInit)
            }
            Err(e) => {
                output::warning(&format!("service start failed ({e}), falling back to xinetd"));
                fallback(runner, ctx).await
            }
        },
        DistroFamily::RedHat | DistroFamily::Arch => {
            output::warning("systemctl not found, using xinetd");
            fallback(runner, ctx).await
        }
        DistroFamily::Alpine => fallback(runner, ctx).await,
        DistroFamily::Unsupported => {
            output::warning(&format!(
                "Don't know how to start rsync on {}; start `rsync --daemon` manually",
                ctx.identity
            ));
            Ok(StartOutcome::NotStarted)
        }
    }
}

async fn fallback<R: CommandRunner>(runner: &R, ctx: &SetupContext) -> Result<StartOutcome, SetupError> {
    setup_xinetd(runner, ctx).await?;
    Ok(StartOutcome::Xinetd)
}

//! Package installation through the host package manager.

use std::path::PathBuf;

use crate::command::{CommandRunner, CommandSpec};
use crate::context::SetupContext;
use crate::error::SetupError;
use crate::output;

pub const RSYNC_PACKAGE: &str = "rsync";
pub const RSYNC_BINARY: &str = "rsync";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    /// Binary was already on `PATH`; nothing was installed.
    AlreadyPresent(PathBuf),
    /// The package manager ran; the path is `None` if the binary still
    /// does not resolve afterwards.
    Installed(Option<PathBuf>),
}

/// Ensure the rsync binary is available, installing the package if needed.
pub async fn ensure_rsync<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
) -> Result<PackageStatus, SetupError> {
    let status = ensure_package(runner, ctx, RSYNC_PACKAGE, RSYNC_BINARY).await?;

    match &status {
        PackageStatus::AlreadyPresent(path) | PackageStatus::Installed(Some(path)) => {
            let version = rsync_version(runner, path, ctx).await;
            output::success(&format!(
                "rsync available at {}: {}",
                path.display(),
                version.as_deref().unwrap_or("version unknown")
            ));
        }
        PackageStatus::Installed(None) => {
            output::warning("rsync package installed but the binary is not on PATH");
        }
    }
    Ok(status)
}

/// Ensure `binary` resolves on `PATH`, installing `package` through the
/// distribution's package manager when it does not.
///
/// An unsupported distribution is only an error when installation is
/// actually required.
pub async fn ensure_package<R: CommandRunner>(
    runner: &R,
    ctx: &SetupContext,
    package: &str,
    binary: &str,
) -> Result<PackageStatus, SetupError> {
    if let Some(path) = runner.resolve(binary) {
        log::info!("{binary} already installed at {}", path.display());
        return Ok(PackageStatus::AlreadyPresent(path));
    }

    let commands = ctx
        .family
        .install_commands(&ctx.identity, package, ctx.timeouts.package())?;

    output::info(&format!(
        "Installing {package} on {} ({} family)",
        ctx.identity,
        ctx.family.as_str()
    ));
    for cmd in &commands {
        output::detail(&cmd.to_string());
        runner.run_checked(cmd).await?;
    }

    Ok(PackageStatus::Installed(runner.resolve(binary)))
}

/// First line of `rsync --version`.
pub async fn rsync_version<R: CommandRunner>(
    runner: &R,
    binary: &std::path::Path,
    ctx: &SetupContext,
) -> Option<String> {
    let cmd = CommandSpec::new(
        &binary.to_string_lossy(),
        ["--version"],
        ctx.timeouts.command(),
    );
    match runner.run(&cmd).await {
        Ok(out) if out.success => out.first_stdout_line().map(str::to_string),
        Ok(out) => {
            log::warn!("`{cmd}` exited with {}", out.status);
            None
        }
        Err(e) => {
            log::warn!("Could not query rsync version: {e}");
            None
        }
    }
}

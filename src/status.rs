//! Post-setup status checks.
//!
//! Each check runs independently; only a missing binary makes the report
//! unhealthy. Liveness prefers the daemon PID file and only falls back to
//! matching processes named `rsync`, which cannot tell a daemon from a client
//! transfer in progress.

use std::fs;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use crate::command::{CommandRunner, CommandSpec};
use crate::context::SetupContext;
use crate::install::packages::{RSYNC_BINARY, rsync_version};
use crate::output;

/// Well-known rsync daemon port.
pub const RSYNC_PORT: u16 = 873;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// PID file names a live process.
    Running { pid: i32 },
    /// Some process is named `rsync`; may not be the daemon.
    RunningByName,
    NotRunning,
    /// No PID file and no way to list processes.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Listening,
    NotListening,
    /// Neither `ss` nor `netstat` is available.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub binary: Option<PathBuf>,
    pub version: Option<String>,
    pub liveness: Liveness,
    pub port: PortState,
}

impl StatusReport {
    /// Missing binary is the only hard failure.
    pub fn is_ok(&self) -> bool {
        self.binary.is_some()
    }
}

/// Run all checks and print a summary.
pub async fn report_status<R: CommandRunner>(runner: &R, ctx: &SetupContext) -> StatusReport {
    if !ctx.family.is_supported() {
        output::warning(&format!(
            "{} is not a supported distribution; status may be incomplete",
            ctx.identity
        ));
    }

    let binary = runner.resolve(RSYNC_BINARY);
    let version = match &binary {
        Some(path) => rsync_version(runner, path, ctx).await,
        None => None,
    };
    let liveness = check_liveness(runner, ctx).await;
    let port = check_port(runner, ctx, RSYNC_PORT).await;

    let report = StatusReport {
        binary,
        version,
        liveness,
        port,
    };
    print_report(&report, ctx);
    report
}

async fn check_liveness<R: CommandRunner>(runner: &R, ctx: &SetupContext) -> Liveness {
    if let Some(pid) = read_pid_file(&ctx.paths.pid_file) {
        if pid_alive(pid) {
            return Liveness::Running { pid };
        }
        log::debug!("Stale PID {pid} in {}", ctx.paths.pid_file.display());
    }

    if !runner.is_available("pgrep") {
        return Liveness::Unknown;
    }
    let cmd = CommandSpec::new("pgrep", ["-x", RSYNC_BINARY], ctx.timeouts.command());
    match runner.run(&cmd).await {
        Ok(out) if out.success => Liveness::RunningByName,
        Ok(_) => Liveness::NotRunning,
        Err(e) => {
            log::warn!("Process lookup failed: {e}");
            Liveness::Unknown
        }
    }
}

fn read_pid_file(path: &Path) -> Option<i32> {
    fs::read_to_string(path)
        .ok()?
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|pid| *pid > 0)
}

/// Signal 0 probe: delivered or refused for permissions both mean alive.
fn pid_alive(pid: i32) -> bool {
    matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}

async fn check_port<R: CommandRunner>(runner: &R, ctx: &SetupContext, port: u16) -> PortState {
    let Some(tool) = ["ss", "netstat"].into_iter().find(|t| runner.is_available(t)) else {
        return PortState::Unknown;
    };

    let cmd = CommandSpec::new(tool, ["-tln"], ctx.timeouts.command());
    match runner.run(&cmd).await {
        Ok(out) if out.success => {
            if listening_on(&out.stdout, port) {
                PortState::Listening
            } else {
                PortState::NotListening
            }
        }
        Ok(out) => {
            log::warn!("`{cmd}` exited with {}", out.status);
            PortState::Unknown
        }
        Err(e) => {
            log::warn!("Socket listing failed: {e}");
            PortState::Unknown
        }
    }
}

/// Whether a `-tln` listing has a local address ending in `:<port>`.
fn listening_on(listing: &str, port: u16) -> bool {
    let suffix = format!(":{port}");
    listing
        .lines()
        .flat_map(str::split_whitespace)
        .any(|field| field.ends_with(&suffix))
}

fn print_report(report: &StatusReport, ctx: &SetupContext) {
    output::header("rsync status");

    match (&report.binary, &report.version) {
        (Some(path), Some(version)) => output::success(&format!("{}: {version}", path.display())),
        (Some(path), None) => output::success(&format!("{} (version unknown)", path.display())),
        (None, _) => output::error("rsync binary not found on PATH"),
    }

    match report.liveness {
        Liveness::Running { pid } => output::success(&format!("rsync daemon running (pid {pid})")),
        Liveness::RunningByName => {
            output::success("an rsync process is running (matched by name, not PID file)")
        }
        Liveness::NotRunning => output::warning("rsync daemon is not running"),
        Liveness::Unknown => output::warning("could not determine whether the daemon is running"),
    }

    match report.port {
        PortState::Listening => output::success(&format!("listening on port {RSYNC_PORT}")),
        PortState::NotListening => {
            output::warning(&format!("nothing is listening on port {RSYNC_PORT}"))
        }
        PortState::Unknown => output::warning("neither ss nor netstat is available to check ports"),
    }

    if ctx.mode.configures_daemon() {
        let paths = &ctx.paths;
        output::header("Summary");
        output::detail(&format!("Configuration: {}", paths.daemon_config.display()));
        output::detail(&format!("Secrets:       {}", paths.secrets.display()));
        output::detail(&format!("MOTD:          {}", paths.motd.display()));
        output::detail("Add a module to the configuration, then list it with:");
        output::detail("  rsync rsync://localhost/");
    }
}

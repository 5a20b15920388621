//! End-to-end setup pipeline.
//!
//! Detect → install → configure → register → start → report, strictly in
//! order. `--client-only` stops after installation and goes straight to the
//! report.

use crate::command::CommandRunner;
use crate::config::SetupConfig;
use crate::context::{RunMode, SetupContext};
use crate::detection::detect_distro;
use crate::distro::DistroIdentity;
use crate::error::SetupError;
use crate::install::{ConfigureReport, PackageStatus, configure_daemon, ensure_rsync};
use crate::output;
use crate::service::{RegistrationOutcome, StartOutcome, register_service, start_service};
use crate::status::{StatusReport, report_status};

/// Everything a run did, step by step.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub identity: DistroIdentity,
    pub package: PackageStatus,
    pub configured: Option<ConfigureReport>,
    pub registration: Option<RegistrationOutcome>,
    pub start: Option<StartOutcome>,
    pub status: StatusReport,
}

/// Run the whole pipeline against the host behind `runner`.
pub async fn run_setup<R: CommandRunner>(
    runner: &R,
    cfg: SetupConfig,
    mode: RunMode,
) -> Result<RunSummary, SetupError> {
    output::header("Detecting operating system");
    let identity = detect_distro(runner, &cfg).await;
    output::info(&format!("Detected {identity}"));

    let ctx = SetupContext::new(identity, mode, cfg);
    log::debug!("Setup context: {ctx:?}");

    output::header("Installing rsync");
    let package = ensure_rsync(runner, &ctx).await?;

    let (configured, registration, start) = if ctx.mode.configures_daemon() {
        output::header("Configuring rsync daemon");
        let configured = configure_daemon(&ctx)?;

        output::header("Registering service");
        let registration = register_service(runner, &ctx).await?;

        output::header("Starting service");
        let start = start_service(runner, &ctx).await?;

        (Some(configured), Some(registration), Some(start))
    } else {
        output::info("Client-only mode: skipping daemon configuration and service setup");
        (None, None, None)
    };

    let status = report_status(runner, &ctx).await;

    Ok(RunSummary {
        identity: ctx.identity,
        package,
        configured,
        registration,
        start,
        status,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use super::*;
    use crate::command::CommandOutput;
    use crate::command::testing::RecordingRunner;
    use crate::install::FileOutcome;
    use crate::status::{Liveness, PortState};

    fn sandbox(root: &Path, os_release: &str) -> SetupConfig {
        let mut cfg = SetupConfig::default();
        let paths = &mut cfg.paths;
        paths.os_release = root.join("os-release");
        paths.redhat_release = root.join("redhat-release");
        paths.debian_version = root.join("debian_version");
        paths.daemon_config = root.join("etc/rsyncd.conf");
        paths.secrets = root.join("etc/rsyncd.secrets");
        paths.motd = root.join("etc/rsyncd.motd");
        paths.pid_file = root.join("run/rsyncd.pid");
        paths.systemd_unit = root.join("etc/systemd/system/rsync.service");
        paths.xinetd_service = root.join("etc/xinetd.d/rsync");
        fs::write(&paths.os_release, os_release).unwrap();
        cfg
    }

    #[tokio::test]
    async fn ubuntu_fresh_host() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sandbox(dir.path(), "ID=ubuntu\nVERSION_ID=\"22.04\"\n");
        let paths = cfg.paths.clone();
        let runner = RecordingRunner::new()
            .with_program("systemctl")
            .with_program("pgrep")
            .with_program("ss")
            .provides("apt-get install -y rsync", "rsync")
            .respond("systemctl list-unit-files rsync.service", CommandOutput::failed(1, ""))
            .respond(
                "ss -tln",
                CommandOutput::ok("LISTEN 0 5 0.0.0.0:873 0.0.0.0:*\n"),
            );

        let summary = run_setup(&runner, cfg, RunMode::default()).await.unwrap();

        assert_eq!(summary.identity, DistroIdentity::new("ubuntu", "22.04"));
        let calls = runner.calls();
        let update = calls.iter().position(|c| c == "apt-get update").unwrap();
        let install = calls.iter().position(|c| c == "apt-get install -y rsync").unwrap();
        assert!(update < install);

        let configured = summary.configured.unwrap();
        assert_eq!(configured.config, FileOutcome::Created);
        assert_eq!(configured.motd, FileOutcome::Created);
        assert_eq!(configured.secrets, FileOutcome::Created);
        let mode = fs::metadata(&paths.secrets).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        assert_eq!(summary.registration, Some(RegistrationOutcome::Created));
        assert!(paths.systemd_unit.exists());
        assert!(runner.ran("systemctl enable rsync"));

        assert_eq!(summary.start, Some(StartOutcome::Systemd));
        assert!(!runner.ran_program("xinetd"));
        assert!(!paths.xinetd_service.exists());

        assert!(summary.status.is_ok());
        assert_eq!(summary.status.liveness, Liveness::RunningByName);
        assert_eq!(summary.status.port, PortState::Listening);
    }

    #[tokio::test]
    async fn alpine_goes_straight_to_xinetd() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sandbox(dir.path(), "ID=alpine\nVERSION_ID=3.18\n");
        let paths = cfg.paths.clone();
        let runner = RecordingRunner::new().provides("apk add --no-cache rsync", "rsync");

        let summary = run_setup(&runner, cfg, RunMode::default()).await.unwrap();

        assert!(runner.ran("apk add --no-cache rsync"));
        assert_eq!(summary.registration, Some(RegistrationOutcome::Skipped));
        assert_eq!(summary.start, Some(StartOutcome::Xinetd));
        assert!(!runner.ran_program("systemctl"));
        assert_eq!(runner.count("apk add --no-cache xinetd"), 1);
        assert_eq!(runner.count("rc-service xinetd start"), 1);
        assert!(paths.xinetd_service.exists());
    }

    #[tokio::test]
    async fn client_only_installs_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sandbox(dir.path(), "ID=arch\n");
        let paths = cfg.paths.clone();
        let runner = RecordingRunner::new()
            .with_program("systemctl")
            .provides("pacman -Sy --noconfirm rsync", "rsync");
        let mode = RunMode {
            daemon_only: false,
            client_only: true,
        };

        let summary = run_setup(&runner, cfg, mode).await.unwrap();

        assert!(summary.configured.is_none());
        assert!(summary.registration.is_none());
        assert!(summary.start.is_none());
        assert!(!runner.ran_program("systemctl"));
        assert!(!paths.daemon_config.exists());
        assert!(summary.status.is_ok());
    }

    #[tokio::test]
    async fn unsupported_distribution_stops_before_touching_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sandbox(dir.path(), "ID=gentoo\nVERSION_ID=2.14\n");
        let paths = cfg.paths.clone();
        let runner = RecordingRunner::new().with_program("systemctl");

        let err = run_setup(&runner, cfg, RunMode::default()).await.unwrap_err();
        assert!(matches!(err, SetupError::UnsupportedDistribution { .. }));
        assert!(runner.calls().is_empty());
        assert!(!paths.daemon_config.exists());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sandbox(dir.path(), "ID=debian\nVERSION_ID=\"12\"\n");
        let paths = cfg.paths.clone();
        let runner = RecordingRunner::new().with_program("rsync");

        run_setup(&runner, cfg.clone(), RunMode::default()).await.unwrap();
        let first = fs::read_to_string(&paths.daemon_config).unwrap();

        let summary = run_setup(&runner, cfg, RunMode::default()).await.unwrap();
        let configured = summary.configured.unwrap();
        assert_eq!(configured.config, FileOutcome::AlreadyPresent);
        assert_eq!(configured.secrets, FileOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(&paths.daemon_config).unwrap(), first);
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// System-wide overrides file, read when present and no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rsyncd-setup.toml";

/// Environment override for the package-manager timeout, in seconds.
pub const TIMEOUT_ENV: &str = "RSYNCD_SETUP_TIMEOUT";

/// Top‑level setup configuration. Every field has a default matching the
/// paths operators expect, so an empty file is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub paths: Paths,
    pub timeouts: Timeouts,
}

/// Filesystem locations read and written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub daemon_config: PathBuf,
    pub secrets: PathBuf,
    pub motd: PathBuf,
    pub pid_file: PathBuf,
    pub systemd_unit: PathBuf,
    pub xinetd_service: PathBuf,
    pub os_release: PathBuf,
    pub redhat_release: PathBuf,
    pub debian_version: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            daemon_config: PathBuf::from("/etc/rsyncd.conf"),
            secrets: PathBuf::from("/etc/rsyncd.secrets"),
            motd: PathBuf::from("/etc/rsyncd.motd"),
            pid_file: PathBuf::from("/var/run/rsyncd.pid"),
            systemd_unit: PathBuf::from("/etc/systemd/system/rsync.service"),
            xinetd_service: PathBuf::from("/etc/xinetd.d/rsync"),
            os_release: PathBuf::from("/etc/os-release"),
            redhat_release: PathBuf::from("/etc/redhat-release"),
            debian_version: PathBuf::from("/etc/debian_version"),
        }
    }
}

/// Upper bounds for external commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Service-manager and probe commands.
    pub command_secs: u64,
    /// Package-manager commands (index refresh, install).
    pub package_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: 60,
            package_secs: 900,
        }
    }
}

impl Timeouts {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn package(&self) -> Duration {
        Duration::from_secs(self.package_secs)
    }
}

impl SetupConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
    /// used if present, otherwise built-in defaults. The package timeout can
    /// then be overridden through [`TIMEOUT_ENV`].
    pub fn load(explicit: Option<&Path>) -> Result<Self, SetupError> {
        let mut cfg = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        if let Some(secs) = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeouts.package_secs = secs;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, SetupError> {
        let raw = fs::read_to_string(path).map_err(|e| SetupError::io(path, e))?;
        let cfg: Self = toml::from_str(&raw)
            .map_err(|e| SetupError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded setup config from {}", path.display());
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), SetupError> {
        if self.timeouts.command_secs == 0 || self.timeouts.package_secs == 0 {
            return Err(SetupError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_operator_paths() {
        let cfg = SetupConfig::default();
        assert_eq!(cfg.paths.daemon_config, PathBuf::from("/etc/rsyncd.conf"));
        assert_eq!(cfg.paths.secrets, PathBuf::from("/etc/rsyncd.secrets"));
        assert_eq!(cfg.paths.motd, PathBuf::from("/etc/rsyncd.motd"));
        assert_eq!(
            cfg.paths.systemd_unit,
            PathBuf::from("/etc/systemd/system/rsync.service")
        );
        assert_eq!(cfg.paths.xinetd_service, PathBuf::from("/etc/xinetd.d/rsync"));
        assert_eq!(cfg.paths.pid_file, PathBuf::from("/var/run/rsyncd.pid"));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.toml");
        fs::write(
            &path,
            "[paths]\nmotd = \"/tmp/motd\"\n\n[timeouts]\ncommand_secs = 5\n",
        )
        .unwrap();

        let cfg = SetupConfig::from_file(&path).unwrap();
        assert_eq!(cfg.paths.motd, PathBuf::from("/tmp/motd"));
        assert_eq!(cfg.paths.secrets, PathBuf::from("/etc/rsyncd.secrets"));
        assert_eq!(cfg.timeouts.command_secs, 5);
        assert_eq!(cfg.timeouts.package_secs, 900);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.toml");
        fs::write(&path, "[timeouts]\ncommand_secs = \"soon\"\n").unwrap();

        let err = SetupConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SetupConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(matches!(err, SetupError::Io { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.toml");
        fs::write(&path, "[timeouts]\ncommand_secs = 0\n").unwrap();

        let err = SetupConfig::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }
}

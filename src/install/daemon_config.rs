//! rsync daemon configuration artifacts.
//!
//! Three files are managed: the main `rsyncd.conf`, the MOTD banner and the
//! secrets file. Each is rendered from a typed template and created only when
//! absent.

use std::path::{Path, PathBuf};

use crate::context::SetupContext;
use crate::error::SetupError;
use crate::output;

use super::file_ops::{FileOutcome, create_if_absent};

const CONFIG_MODE: u32 = 0o644;
const MOTD_MODE: u32 = 0o644;
/// Credentials live here: owner read/write only.
pub const SECRETS_MODE: u32 = 0o600;

/// Global daemon settings written to `rsyncd.conf`.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub uid: String,
    pub gid: String,
    pub use_chroot: bool,
    pub max_connections: u32,
    pub pid_file: PathBuf,
    pub exclude: Vec<String>,
    pub transfer_logging: bool,
    pub timeout_secs: u32,
    pub ignore_nonreadable: bool,
    pub dont_compress: Vec<String>,
    pub example_module: ModuleTemplate,
}

/// Commented-out module block operators can copy from.
#[derive(Debug, Clone)]
pub struct ModuleTemplate {
    pub name: String,
    pub path: String,
    pub comment: String,
    pub read_only: bool,
    pub auth_users: String,
    pub secrets_file: PathBuf,
}

impl DaemonConfig {
    pub fn new(pid_file: &Path, secrets_file: &Path) -> Self {
        Self {
            uid: "nobody".to_string(),
            gid: "nobody".to_string(),
            use_chroot: true,
            max_connections: 4,
            pid_file: pid_file.to_path_buf(),
            exclude: vec!["lost+found/".to_string()],
            transfer_logging: true,
            timeout_secs: 600,
            ignore_nonreadable: true,
            dont_compress: ["*.gz", "*.tgz", "*.zip", "*.z", "*.Z", "*.rpm", "*.deb", "*.bz2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            example_module: ModuleTemplate {
                name: "backup".to_string(),
                path: "/srv/rsync/backup".to_string(),
                comment: "Backup area".to_string(),
                read_only: false,
                auth_users: "backupuser".to_string(),
                secrets_file: secrets_file.to_path_buf(),
            },
        }
    }

    pub fn render(&self) -> String {
        let mut content = String::with_capacity(1024);

        content.push_str("# rsyncd.conf - rsync daemon configuration\n");
        content.push_str("# See rsyncd.conf(5) for the full list of options.\n\n");

        content.push_str("# Global settings\n");
        content.push_str(&format!("uid = {}\n", self.uid));
        content.push_str(&format!("gid = {}\n", self.gid));
        content.push_str(&format!("use chroot = {}\n", yes_no(self.use_chroot)));
        content.push_str(&format!("max connections = {}\n", self.max_connections));
        content.push_str(&format!("pid file = {}\n", self.pid_file.display()));
        content.push_str(&format!("exclude = {}\n", self.exclude.join(" ")));
        content.push_str(&format!(
            "transfer logging = {}\n",
            yes_no(self.transfer_logging)
        ));
        content.push_str(&format!("timeout = {}\n", self.timeout_secs));
        content.push_str(&format!(
            "ignore nonreadable = {}\n",
            yes_no(self.ignore_nonreadable)
        ));
        content.push_str(&format!("dont compress = {}\n", self.dont_compress.join(" ")));
        content.push('\n');

        content.push_str("# Example module (uncomment and adjust to export a directory)\n");
        content.push_str(&self.example_module.render_commented());

        content
    }
}

impl ModuleTemplate {
    fn render_commented(&self) -> String {
        let mut block = String::with_capacity(256);
        block.push_str(&format!("# [{}]\n", self.name));
        block.push_str(&format!("#     path = {}\n", self.path));
        block.push_str(&format!("#     comment = {}\n", self.comment));
        block.push_str(&format!("#     read only = {}\n", yes_no(self.read_only)));
        block.push_str(&format!("#     auth users = {}\n", self.auth_users));
        block.push_str(&format!(
            "#     secrets file = {}\n",
            self.secrets_file.display()
        ));
        block
    }
}

/// Greeting shown to clients on connect.
#[derive(Debug, Clone)]
pub struct Motd {
    pub greeting: String,
}

impl Default for Motd {
    fn default() -> Self {
        Self {
            greeting: "Welcome to the rsync daemon server".to_string(),
        }
    }
}

impl Motd {
    pub fn render(&self) -> String {
        format!("{}\n", self.greeting)
    }
}

/// Comment-only secrets file documenting the credential line format.
#[derive(Debug, Clone, Default)]
pub struct SecretsTemplate;

impl SecretsTemplate {
    pub fn render(&self) -> String {
        let mut content = String::with_capacity(256);
        content.push_str("# rsyncd.secrets - rsync daemon credentials\n");
        content.push_str("# One entry per line, in the form:\n");
        content.push_str("#   username:password\n");
        content.push_str("# Users listed here are referenced by `auth users` in rsyncd.conf.\n");
        content.push_str("# This file must stay readable by its owner only (mode 0600).\n");
        content
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Per-artifact result of [`configure_daemon`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub config: FileOutcome,
    pub motd: FileOutcome,
    pub secrets: FileOutcome,
}

/// Create the daemon config, MOTD and secrets files where missing.
pub fn configure_daemon(ctx: &SetupContext) -> Result<ConfigureReport, SetupError> {
    let paths = &ctx.paths;

    let config = DaemonConfig::new(&paths.pid_file, &paths.secrets);
    let report = ConfigureReport {
        config: write_artifact(&paths.daemon_config, &config.render(), CONFIG_MODE)?,
        motd: write_artifact(&paths.motd, &Motd::default().render(), MOTD_MODE)?,
        secrets: write_artifact(&paths.secrets, &SecretsTemplate.render(), SECRETS_MODE)?,
    };
    Ok(report)
}

fn write_artifact(path: &Path, content: &str, mode: u32) -> Result<FileOutcome, SetupError> {
    let outcome = create_if_absent(path, content, mode)?;
    match outcome {
        FileOutcome::Created => output::success(&format!("Created {}", path.display())),
        FileOutcome::AlreadyPresent => {
            output::warning(&format!("{} already exists, leaving it untouched", path.display()))
        }
    }
    Ok(outcome)
}

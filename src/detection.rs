//! Host distribution detection
//!
//! Sources are tried in priority order and the first one that answers wins:
//! - `/etc/os-release` (`ID`, `VERSION_ID`)
//! - `lsb_release -si` / `-sr`
//! - `/etc/redhat-release` marker, version pulled out with a pattern
//! - `/etc/debian_version` marker, version read verbatim
//! - kernel name and release from `uname`
//!
//! Detection never fails: the last resort is the compile-time OS name.

use std::collections::HashMap;
use std::fs;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::command::{CommandRunner, CommandSpec};
use crate::config::SetupConfig;
use crate::distro::DistroIdentity;

static RELEASE_VERSION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+(\.\d+)*").ok());

/// Detect the host distribution.
pub async fn detect_distro<R: CommandRunner>(runner: &R, cfg: &SetupConfig) -> DistroIdentity {
    let paths = &cfg.paths;

    if let Ok(content) = fs::read_to_string(&paths.os_release) {
        let vars = parse_os_release(&content);
        if let Some(id) = vars.get("ID").filter(|id| !id.is_empty()) {
            let version = vars.get("VERSION_ID").cloned().unwrap_or_default();
            log::debug!("Identity from {}", paths.os_release.display());
            return DistroIdentity::new(id.to_lowercase(), version);
        }
    }

    if runner.is_available("lsb_release") {
        if let Some(identity) = from_lsb_release(runner, cfg).await {
            log::debug!("Identity from lsb_release");
            return identity;
        }
    }

    if let Ok(content) = fs::read_to_string(&paths.redhat_release) {
        log::debug!("Identity from {}", paths.redhat_release.display());
        return DistroIdentity::new("centos", extract_release_version(&content).unwrap_or_default());
    }

    if let Ok(content) = fs::read_to_string(&paths.debian_version) {
        log::debug!("Identity from {}", paths.debian_version.display());
        return DistroIdentity::new("debian", content.trim());
    }

    log::debug!("No distribution markers found, falling back to kernel identity");
    from_uname(runner, cfg).await
}

/// Parse `/etc/os-release` into a key-value map
fn parse_os_release(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            vars.insert(key.trim().to_string(), value);
        }
    }

    vars
}

fn extract_release_version(content: &str) -> Option<String> {
    RELEASE_VERSION
        .as_ref()?
        .find(content)
        .map(|m| m.as_str().to_string())
}

async fn from_lsb_release<R: CommandRunner>(runner: &R, cfg: &SetupConfig) -> Option<DistroIdentity> {
    let timeout = cfg.timeouts.command();
    let id = query_line(runner, CommandSpec::new("lsb_release", ["-si"], timeout)).await?;
    let version = query_line(runner, CommandSpec::new("lsb_release", ["-sr"], timeout))
        .await
        .unwrap_or_default();
    Some(DistroIdentity::new(id.to_lowercase(), version))
}

async fn from_uname<R: CommandRunner>(runner: &R, cfg: &SetupConfig) -> DistroIdentity {
    let timeout = cfg.timeouts.command();
    let name = query_line(runner, CommandSpec::new("uname", ["-s"], timeout))
        .await
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    let release = query_line(runner, CommandSpec::new("uname", ["-r"], timeout))
        .await
        .unwrap_or_else(|| "unknown".to_string());
    DistroIdentity::new(name, release)
}

/// First non-empty stdout line of a successful command.
async fn query_line<R: CommandRunner>(runner: &R, cmd: CommandSpec) -> Option<String> {
    match runner.run(&cmd).await {
        Ok(out) if out.success => out.first_stdout_line().map(str::to_string),
        Ok(out) => {
            log::debug!("`{cmd}` exited with {}", out.status);
            None
        }
        Err(e) => {
            log::debug!("`{cmd}` unavailable: {e}");
            None
        }
    }
}

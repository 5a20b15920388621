//! xinetd fallback: rsync launched per connection instead of as a daemon.

use std::path::{Path, PathBuf};

use crate::command::CommandRunner;
use crate::context::SetupContext;
use crate::distro::DistroFamily;
use crate::error::SetupError;
use crate::install::file_ops::{FileOutcome, create_if_absent};
use crate::install::packages::{RSYNC_BINARY, ensure_package};
use crate::output;

use super::service_control::{
    enable_openrc_service, enable_systemd_service, has_systemd, start_native_service,
    start_openrc_service, start_systemd_service,
};
use super::unit::DEFAULT_RSYNC_PATH;

pub const XINETD: &str = "xinetd";
const DESCRIPTOR_MODE: u32 = 0o644;

/// `/etc/xinetd.d/rsync` service descriptor.
#[derive(Debug, Clone)]
pub struct XinetdService {
    pub name: String,
    pub server: PathBuf,
    pub server_args: String,
    pub user: String,
}

impl XinetdService {
    pub fn new(server: &Path) -> Self {
        Self {
            name: "rsync".to_string(),
            server: server.to_path_buf(),
            server_args: "--daemon".to_string(),
            user: "root".to_string(),
        }
    }

    pub fn render(&self) -> String {
        let mut content = String::with_capacity(384);
        content.push_str(&format!("# xinetd service definition for {}\n", self.name));
        content.push_str(&format!("service {}\n", self.name));
        content.push_str("{\n");
        content.push_str("    disable         = no\n");
        content.push_str("    flags           = IPv6\n");
        content.push_str("    socket_type     = stream\n");
        content.push_str("    wait            = no\n");
        content.push_str(&format!("    user            = {}\n", self.user));
        content.push_str(&format!("    server          = {}\n", self.server.display()));
        content.push_str(&format!("    server_args     = {}\n", self.server_args));
        content.push_str("    log_on_failure  += USERID\n");
        content.push_str("}\n");
        content
    }
}

/// Install xinetd, drop in the rsync descriptor and bring xinetd up.
pub async fn setup_xinetd<R: CommandRunner>(runner: &R, ctx: &SetupContext) -> Result<(), SetupError> {
    output::info("Setting up xinetd to serve rsync per connection");

    ensure_package(runner, ctx, XINETD, XINETD).await?;

    let server = runner
        .resolve(RSYNC_BINARY)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RSYNC_PATH));
    let descriptor = XinetdService::new(&server);
    let path = &ctx.paths.xinetd_service;
    match create_if_absent(path, &descriptor.render(), DESCRIPTOR_MODE)? {
        FileOutcome::Created => output::success(&format!("Created {}", path.display())),
        FileOutcome::AlreadyPresent => {
            output::warning(&format!("{} already exists, leaving it untouched", path.display()))
        }
    }

    // Alpine is OpenRC even when systemctl happens to be installed.
    if ctx.family == DistroFamily::Alpine {
        enable_openrc_service(runner, ctx, XINETD).await?;
        start_openrc_service(runner, ctx, XINETD).await?;
    } else if has_systemd(runner) {
        enable_systemd_service(runner, ctx, XINETD).await?;
        start_systemd_service(runner, ctx, XINETD).await?;
    } else {
        start_native_service(runner, ctx, XINETD).await?;
    }

    output::success("xinetd is serving rsync");
    Ok(())
}

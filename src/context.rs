//! Immutable run context threaded through every pipeline step.

use crate::config::{Paths, SetupConfig, Timeouts};
use crate::distro::{DistroFamily, DistroIdentity};

/// Flags from the command line that gate the configure/register/start steps.
///
/// Both flags may be set at once; `client_only` wins in that case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    pub daemon_only: bool,
    pub client_only: bool,
}

impl RunMode {
    /// Whether the daemon side (config files, service) should be set up.
    pub fn configures_daemon(&self) -> bool {
        !self.client_only
    }
}

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub identity: DistroIdentity,
    pub family: DistroFamily,
    pub mode: RunMode,
    pub paths: Paths,
    pub timeouts: Timeouts,
}

impl SetupContext {
    pub fn new(identity: DistroIdentity, mode: RunMode, cfg: SetupConfig) -> Self {
        let family = identity.family();
        Self {
            identity,
            family,
            mode,
            paths: cfg.paths,
            timeouts: cfg.timeouts,
        }
    }
}

//! rsyncd-setup library
//!
//! Installs rsync on a single Linux host and brings up its daemon: distribution
//! detection, package installation, daemon configuration, systemd
//! registration, start-up with an xinetd fallback, and a status report.

pub mod cli;
pub mod command;
pub mod config;
pub mod context;
pub mod detection;
pub mod distro;
pub mod error;
pub mod install;
pub mod orchestration;
pub mod output;
pub mod service;
pub mod status;

pub use command::{CommandRunner, SystemRunner};
pub use config::SetupConfig;
pub use context::{RunMode, SetupContext};
pub use distro::{DistroFamily, DistroIdentity};
pub use error::SetupError;
pub use orchestration::{RunSummary, run_setup};

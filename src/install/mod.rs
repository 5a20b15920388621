//! Package installation and daemon configuration artifacts.

pub mod daemon_config;
pub mod file_ops;
pub mod packages;

pub use daemon_config::{ConfigureReport, configure_daemon};
pub use file_ops::FileOutcome;
pub use packages::{PackageStatus, ensure_package, ensure_rsync};

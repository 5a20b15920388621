use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;

use crate::context::RunMode;

/// Command-line arguments for rsyncd-setup
#[derive(Parser, Debug)]
#[command(name = "rsyncd-setup")]
#[command(version, about = "Install rsync and set up its daemon on this host")]
pub struct Args {
    /// Set up the rsync daemon (same as the default behaviour)
    #[arg(long)]
    pub daemon_only: bool,

    /// Install the rsync client only; skip daemon configuration and service setup
    #[arg(long)]
    pub client_only: bool,

    /// TOML file overriding paths and timeouts (default: /etc/rsyncd-setup.toml if present)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// How argument parsing ended when it did not produce [`Args`].
#[derive(Debug)]
pub enum ParseExit {
    /// `--help` or `--version`: print and exit 0.
    Info(clap::Error),
    /// Anything else: print usage and exit 1.
    Usage(clap::Error),
}

impl ParseExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseExit::Info(_) => 0,
            ParseExit::Usage(_) => 1,
        }
    }

    pub fn print(&self) {
        let err = match self {
            ParseExit::Info(e) | ParseExit::Usage(e) => e,
        };
        let _ = err.print();
    }
}

impl Args {
    /// Parse from an iterator, classifying failures by exit code.
    pub fn try_parse_args<I, T>(iter: I) -> Result<Self, ParseExit>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ParseExit::Info(e),
            _ => ParseExit::Usage(e),
        })
    }

    pub fn mode(&self) -> RunMode {
        RunMode {
            daemon_only: self.daemon_only,
            client_only: self.client_only,
        }
    }
}

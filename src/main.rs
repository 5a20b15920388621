use anyhow::{Context, Result};
use log::{info, warn};

use rsyncd_setup::cli::Args;
use rsyncd_setup::{SetupConfig, SetupError, SystemRunner, output, run_setup};

fn main() {
    let args = match Args::try_parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(exit) => {
            exit.print();
            std::process::exit(exit.exit_code());
        }
    };

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    match rt.block_on(real_main(args)) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output::error(&format!("{e:#}"));
            if let Some(SetupError::UnsupportedDistribution { .. }) = e.downcast_ref::<SetupError>() {
                output::detail("Supported: Debian/Ubuntu, RHEL/CentOS/Fedora/Rocky/Alma, Alpine, Arch/Manjaro");
            }
            std::process::exit(1);
        }
    }
}

/// Returns whether the final status report was healthy.
async fn real_main(args: Args) -> Result<bool> {
    let cfg = SetupConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if !nix::unistd::geteuid().is_root() {
        warn!("Not running as root; package installation and writes under /etc will likely fail");
    }

    let summary = run_setup(&SystemRunner, cfg, args.mode())
        .await
        .context("rsync setup failed")?;

    info!(
        "Setup finished on {} (service: {:?})",
        summary.identity, summary.start
    );
    Ok(summary.status.is_ok())
}

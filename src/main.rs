use crate::commands::{Cli, Commands};
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::debug;
use tokio::task::spawn_blocking;

mod commands;
mod inspect;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    debug!(
        "{} {} ({}, {})",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::TARGET,
        built_info::PROFILE
    );

    let cli = Cli::parse();
    let backend = cli.backend();
    let options = cli.image_options();

    // Image access is blocking I/O.
    match cli.command {
        Commands::Info(cmd) => spawn_blocking(move || inspect::info(&cmd, backend, options)).await??,
        Commands::Read(cmd) => spawn_blocking(move || inspect::read(&cmd, backend, options)).await??,
        Commands::Verify(cmd) => {
            let pb = pb.clone();
            spawn_blocking(move || inspect::verify(&cmd, backend, options, &pb)).await??
        }
    }

    Ok(())
}

use std::{process::exit, time::Instant};

use anyhow::Result;
use application::Controller;
use args::Args;
use build_info::VERSION;
use clap::Parser;
use common::{error::FancyError, init::ServiceInit};
use config::Config;
use simplelog::info;
use storage::Storage;

mod application;
mod args;
mod config;
mod network;
mod storage;
mod task;

mod build_info {
    include!(concat!(env!("OUT_DIR"), "/build_info.rs"));
}

pub const AUTHORS: [&str; 1] = ["Postmarks Team"];

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_file = args.log_file.clone().unwrap_or_else(Storage::latest_log_file);
    if let Err(error) = ServiceInit::init_logging(args.debug, &log_file) {
        eprintln!("Failed to initialize logging: {}", error);
        exit(1);
    }
    ServiceInit::print_ascii_art("Postmarks", &VERSION, &AUTHORS);

    if let Err(error) = run(args).await {
        FancyError::print_fancy(&error, true);
        exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();
    info!("Starting postmarks daemon version v{}...", VERSION);
    info!("Loading configuration...");

    let config_file = args.config.unwrap_or_else(Storage::primary_config_file);
    let mut config = Config::new_filled(&config_file)?;
    if let Some(address) = args.bus {
        config.override_bus(address);
    }

    let mut controller = Controller::init(config)?;
    info!("Loaded postmarks daemon in {:.2?}", start_time.elapsed());
    controller.run().await
}

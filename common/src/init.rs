use std::{
    fs::{self, File},
    path::Path,
};

use anyhow::Result;
use colored::Colorize;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};

use crate::version::Version;

pub struct ServiceInit;

impl ServiceInit {
    pub fn init_logging(debug: bool, log_file: &Path) -> Result<()> {
        if let Some(parent) = log_file.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        Self::init_logging_with_writeable(debug, File::create(log_file)?)
    }

    pub fn init_logging_with_writeable(debug: bool, log_file: File) -> Result<()> {
        if debug {
            CombinedLogger::init(vec![
                TermLogger::new(
                    LevelFilter::Debug,
                    ConfigBuilder::new()
                        .set_location_level(LevelFilter::Error)
                        .build(),
                    TerminalMode::Mixed,
                    ColorChoice::Auto,
                ),
                WriteLogger::new(
                    LevelFilter::Debug,
                    ConfigBuilder::new()
                        .set_location_level(LevelFilter::Error)
                        .build(),
                    log_file,
                ),
            ])?;
        } else {
            CombinedLogger::init(vec![
                TermLogger::new(
                    LevelFilter::Info,
                    ConfigBuilder::new().build(),
                    TerminalMode::Mixed,
                    ColorChoice::Auto,
                ),
                WriteLogger::new(LevelFilter::Info, ConfigBuilder::new().build(), log_file),
            ])?;
        }
        Ok(())
    }

    pub fn print_ascii_art(application: &str, version: &Version, authors: &[&str]) {
        println!(
            "{}{}",
            r"   ___           _".blue(),
            r"                       _".cyan()
        );
        println!(
            "{}{}",
            r"  / _ \___  ___ | |_".blue(),
            r" _ __ ___   __ _ _ __| | _____".cyan()
        );
        println!(
            "{}{}",
            r" / /_)/ _ \/ __|| __|".blue(),
            r" '_ ` _ \ / _` | '__| |/ / __|".cyan()
        );
        println!(
            "{}{}",
            r"/ ___/ (_) \__ \| |_".blue(),
            r"| | | | | | (_| | |  |   <\__ \".cyan()
        );
        println!(
            "{}{}",
            r"\/    \___/|___/ \__|".blue(),
            r"_| |_| |_|\__,_|_|  |_|\_\___/".cyan()
        );
        println!();
        println!(
            "«{}» {} | {} by {}",
            "*".blue(),
            application.blue(),
            format!("v{}", version).blue(),
            authors.join(", ").blue()
        );
        println!();
    }
}

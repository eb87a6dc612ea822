use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser)]
pub struct Args {
    #[clap(short, long, help = "Enable debug mode", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[clap(short, long, help = "Address of the message bus, overrides the configuration")]
    pub bus: Option<String>,
    #[clap(short, long, help = "Path to the configuration file")]
    pub config: Option<PathBuf>,
    #[clap(short, long, help = "Path to the log file")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let args = Args::parse_from([
            "postmarks",
            "--debug",
            "--bus",
            "10.0.0.1:3101",
            "-c",
            "custom.toml",
        ]);
        assert!(args.debug);
        assert_eq!(args.bus.as_deref(), Some("10.0.0.1:3101"));
        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(args.log_file, None);
    }
}

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// One line per surface command
    #[default]
    Text,
    /// One JSON object per frame
    Json,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "dimmer",
    version = dimmer_core::version(),
    about = "Replays dim layer scenarios against a headless compositor",
)]
pub struct Args {
    /// Scenario to replay. The bundled demo scenario is used when omitted
    #[arg(value_name = "SCENARIO")]
    pub scenario: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Specify custom configuration file path"
    )]
    pub config_path: Option<PathBuf>,

    #[arg(
        long = "dry-run",
        help = "Validate configuration and scenario and exit without replaying"
    )]
    pub dry_run: bool,

    #[arg(
        long = "defaults",
        help = "Use default configuration and ignore config files"
    )]
    pub use_defaults: bool,

    #[arg(long = "print-config", help = "Print the effective configuration and exit")]
    pub print_config: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short, long, conflicts_with = "verbose", help = "Only log info and above")]
    pub quiet: bool,

    #[arg(short, long, help = "Log everything, including trace output")]
    pub verbose: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

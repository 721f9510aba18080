use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RoiChoice {
    Forehead,
    LowerFace,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetectorChoice {
    Scripted,
    Rustface,
}

/// Which arguments were given on the command line, so the config file can
/// fill in the rest without clobbering explicit flags.
#[derive(Debug, Default)]
pub struct CliSources {
    pub duration_from_cli: bool,
    pub roi_from_cli: bool,
    pub detector_from_cli: bool,
    pub camera_index_from_cli: bool,
    pub channel_capacity_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            duration_from_cli: value_from_cli(matches, "duration"),
            roi_from_cli: value_from_cli(matches, "roi"),
            detector_from_cli: value_from_cli(matches, "detector"),
            camera_index_from_cli: value_from_cli(matches, "camera_index"),
            channel_capacity_from_cli: value_from_cli(matches, "channel_capacity"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "pulse-fast",
    about = "Measure heart rate from a camera feed and report a dosha profile",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Lock acquisition to a specific frame-source backend
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Measurement duration in seconds before the session auto-stops
    #[arg(
        long = "duration",
        id = "duration",
        default_value_t = 25.0,
        value_parser = parse_duration_secs
    )]
    pub duration: f64,

    /// Face region sampled for the pulse signal
    #[arg(long = "roi", id = "roi", value_enum, default_value_t = RoiChoice::Forehead)]
    pub roi: RoiChoice,

    /// Face/eye detector implementation
    #[arg(
        long = "detector",
        id = "detector",
        value_enum,
        default_value_t = DetectorChoice::Scripted
    )]
    pub detector: DetectorChoice,

    /// SeetaFace model path for the rustface detector
    #[arg(long = "detector-model", value_name = "FILE")]
    pub detector_model: Option<PathBuf>,

    /// Camera device index for the nokhwa backend
    #[arg(long = "camera-index", id = "camera_index", default_value_t = 0)]
    pub camera_index: u32,

    /// Frame queue capacity before applying backpressure
    #[arg(
        long = "channel-capacity",
        id = "channel_capacity",
        value_parser = clap::value_parser!(usize)
    )]
    pub channel_capacity: Option<usize>,

    /// Write each annotated frame as a PNG into this directory
    #[arg(long = "dump-dir", value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,

    /// Print the list of available frame-source backends
    #[arg(long = "list-backends")]
    pub list_backends: bool,

    /// Pretty-print the JSON outcome
    #[arg(long = "pretty")]
    pub pretty: bool,
}

fn parse_duration_secs(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if secs > 0.0 && secs.is_finite() {
        Ok(secs)
    } else {
        Err("duration must be a positive number of seconds".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_session() {
        let args = CliArgs::parse_from(["pulse-fast"]);
        assert_eq!(args.duration, 25.0);
        assert_eq!(args.roi, RoiChoice::Forehead);
        assert_eq!(args.detector, DetectorChoice::Scripted);
        assert_eq!(args.camera_index, 0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert!(CliArgs::try_parse_from(["pulse-fast", "--duration", "0"]).is_err());
    }
}

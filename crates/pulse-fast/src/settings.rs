use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources, DetectorChoice, RoiChoice};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend: Option<String>,
    duration: Option<f64>,
    roi: Option<String>,
    detector: Option<String>,
    detector_model: Option<String>,
    camera_index: Option<u32>,
    channel_capacity: Option<usize>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub backend: Option<String>,
    pub duration_secs: f64,
    pub roi: RoiChoice,
    pub detector: DetectorChoice,
    pub detector_model: Option<PathBuf>,
    pub camera_index: u32,
    pub channel_capacity: Option<usize>,
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return read_config(path).map(|(config, path)| (config, Some(path)));
    }

    if let Some(project_path) = project_config_path() {
        if project_path.exists() {
            return read_config(project_path).map(|(config, path)| (config, Some(path)));
        }
    }

    let Some(default_path) = default_config_path() else {
        return Ok((FileConfig::default(), None));
    };
    if !default_path.exists() {
        return Ok((FileConfig::default(), None));
    }
    read_config(default_path).map(|(config, path)| (config, Some(path)))
}

fn read_config(path: PathBuf) -> Result<(FileConfig, PathBuf), ConfigError> {
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((config, path))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        backend: file_backend,
        duration: file_duration,
        roi: file_roi,
        detector: file_detector,
        detector_model: file_detector_model,
        camera_index: file_camera_index,
        channel_capacity: file_channel_capacity,
    } = file;

    let mut backend = normalize_string(cli.backend.clone());
    if backend.is_none() {
        backend = normalize_string(file_backend);
    }

    let mut duration_secs = cli.duration;
    if !sources.duration_from_cli {
        if let Some(value) = file_duration {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidValue {
                    path: config_path,
                    field: "duration",
                    value: value.to_string(),
                });
            }
            duration_secs = value;
        }
    }

    let mut roi = cli.roi;
    if !sources.roi_from_cli {
        if let Some(value) = normalize_string(file_roi) {
            roi = parse_choice::<RoiChoice>(&value, "roi", config_path.as_ref())?;
        }
    }

    let mut detector = cli.detector;
    if !sources.detector_from_cli {
        if let Some(value) = normalize_string(file_detector) {
            detector = parse_choice::<DetectorChoice>(&value, "detector", config_path.as_ref())?;
        }
    }

    let detector_model = cli.detector_model.clone().map(expand_pathbuf).or_else(|| {
        normalize_string(file_detector_model)
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref()))
    });

    let mut camera_index = cli.camera_index;
    if !sources.camera_index_from_cli {
        if let Some(value) = file_camera_index {
            camera_index = value;
        }
    }

    let mut channel_capacity = cli.channel_capacity;
    if let Some(0) = channel_capacity {
        return Err(ConfigError::InvalidValue {
            path: None,
            field: "channel_capacity",
            value: "0".to_string(),
        });
    }
    if !sources.channel_capacity_from_cli {
        if let Some(value) = file_channel_capacity {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    path: config_path,
                    field: "channel_capacity",
                    value: value.to_string(),
                });
            }
            channel_capacity = Some(value);
        }
    }

    Ok(EffectiveSettings {
        backend,
        duration_secs,
        roi,
        detector,
        detector_model,
        camera_index,
        channel_capacity,
        config_dir,
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "pulse-fast", "pulse-fast")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir().ok().map(|dir| dir.join("config.toml"))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    if expanded.is_absolute() || base.is_none() {
        Some(expanded)
    } else {
        Some(base.unwrap_or(Path::new(".")).join(expanded))
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

fn parse_choice<T: ValueEnum>(
    value: &str,
    field: &'static str,
    path: Option<&PathBuf>,
) -> Result<T, ConfigError> {
    T::from_str(value, false).map_err(|_| ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value: value.to_string(),
    })
}

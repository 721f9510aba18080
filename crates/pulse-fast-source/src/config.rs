use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::backends::mock::MockSceneConfig;
use crate::core::{DynFrameSource, PulseError, PulseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Mock,
    Nokhwa,
}

impl FromStr for Backend {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(Backend::Mock),
            "nokhwa" | "camera" => Ok(Backend::Nokhwa),
            other => Err(PulseError::configuration(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mock => "mock",
            Backend::Nokhwa => "nokhwa",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compiled_backends() -> Vec<Backend> {
    let mut backends = Vec::new();
    #[cfg(feature = "backend-nokhwa")]
    {
        backends.push(Backend::Nokhwa);
    }
    backends.push(Backend::Mock);
    backends
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub backend: Backend,
    /// Camera index for the nokhwa backend.
    pub camera_index: u32,
    pub channel_capacity: Option<NonZeroUsize>,
    /// Scene parameters for the mock backend; ignored by cameras.
    pub scene: MockSceneConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        let backend = compiled_backends()
            .into_iter()
            .next()
            .unwrap_or(Backend::Mock);
        Self {
            backend,
            camera_index: 0,
            channel_capacity: None,
            scene: MockSceneConfig::default(),
        }
    }
}

impl Configuration {
    pub fn from_env() -> PulseResult<Self> {
        let mut config = Configuration::default();
        if let Ok(backend) = env::var("PULSE_BACKEND") {
            config.backend = Backend::from_str(&backend)?;
        }
        if let Ok(index) = env::var("PULSE_CAMERA_INDEX") {
            config.camera_index = index.parse().map_err(|_| {
                PulseError::configuration(format!(
                    "failed to parse PULSE_CAMERA_INDEX='{index}' as an integer"
                ))
            })?;
        }
        if let Ok(capacity) = env::var("PULSE_CHANNEL_CAPACITY") {
            let parsed: usize = capacity.parse().map_err(|_| {
                PulseError::configuration(format!(
                    "failed to parse PULSE_CHANNEL_CAPACITY='{capacity}' as a positive integer"
                ))
            })?;
            let Some(value) = NonZeroUsize::new(parsed) else {
                return Err(PulseError::configuration(
                    "PULSE_CHANNEL_CAPACITY must be greater than zero",
                ));
            };
            config.channel_capacity = Some(value);
        }
        Ok(config)
    }

    pub fn available_backends() -> Vec<Backend> {
        compiled_backends()
    }

    pub fn create_provider(&self) -> PulseResult<DynFrameSource> {
        let channel_capacity = self.channel_capacity.map(NonZeroUsize::get);

        match self.backend {
            Backend::Mock => crate::backends::mock::boxed_mock(
                self.scene.clone(),
                channel_capacity,
            ),
            Backend::Nokhwa => {
                #[cfg(feature = "backend-nokhwa")]
                {
                    crate::backends::nokhwa::boxed_nokhwa(self.camera_index, channel_capacity)
                }
                #[cfg(not(feature = "backend-nokhwa"))]
                {
                    Err(PulseError::unsupported("nokhwa"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_known_names() {
        assert_eq!("mock".parse::<Backend>().unwrap(), Backend::Mock);
        assert_eq!("camera".parse::<Backend>().unwrap(), Backend::Nokhwa);
        assert!("dshow".parse::<Backend>().is_err());
    }

    #[test]
    fn mock_is_always_compiled() {
        assert!(Configuration::available_backends().contains(&Backend::Mock));
    }
}

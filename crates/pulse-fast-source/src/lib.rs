pub mod backends;
pub mod config;
pub mod core;

pub use backends::mock::MockSceneConfig;
pub use config::{Backend, Configuration};
pub use core::{
    spawn_stream_from_channel, DynFrameSource, FrameSourceProvider, FrameStream, PulseError,
    PulseResult, RgbFrame,
};

//! Errors raised while configuring the accelerator or the renderer.

use thiserror::Error;

/// Errors that can occur while setting up a scene or a render.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Leaf size must be at least 1, got {0}")]
    InvalidLeafSize(usize),

    #[error("Russian roulette survival probability must be in (0, 1], got {0}")]
    InvalidRussianRoulette(f32),

    #[error("Samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("Invalid image resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("{name} must be positive, got {value}")]
    NonPositiveEpsilon { name: &'static str, value: f32 },
}

/// Result type for scene and render setup.
pub type Result<T> = std::result::Result<T, Error>;

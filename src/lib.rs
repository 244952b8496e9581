pub mod capture;
pub mod display;
pub mod error;
pub mod stepper;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Medium-resolution frames; both streams publish 640x480 RGB.
            capture: CaptureConfig {
                width: 640,
                height: 480,
            },
            display: DisplayConfig {
                width: 640,
                height: 480,
            },
        }
    }
}

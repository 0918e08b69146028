pub mod config;
pub mod error;
pub mod types;

pub use config::{DetectionConfig, GeneralConfig, WatchdogReset};
pub use error::{Error, Result};
pub use types::*;

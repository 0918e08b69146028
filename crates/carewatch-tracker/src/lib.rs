pub mod classifier;
pub mod config;
pub mod frame_reader;
pub mod monitor;
pub mod runner;
pub mod segmenter;
pub mod service;
pub mod sink;
pub mod synthesizer;

pub use config::TrackerConfig;
pub use monitor::{ActivityMonitor, FrameReport};
pub use segmenter::{ActivitySegmenter, Transition};
pub use service::{TrackerHandle, TrackerInput, TrackerService};

//! Types for recording values obtained during training and evaluation.
mod base;
mod log_recorder;
mod null_recorder;
mod recorder;
pub use base::{Record, RecordValue};
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;

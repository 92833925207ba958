pub mod models;
pub mod scheduler;
pub mod time;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("time must be HH:MM in 24-hour form, got {0:?}")]
    InvalidTimeFormat(String),
    #[error("morning end {end} must be after wake time {wake}")]
    InvalidWindow { wake: String, end: String },
}

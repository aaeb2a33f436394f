//! Errors raised before a scan session can start

use thiserror::Error;

use crate::capture::CameraStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("start value must not be empty")]
    EmptyStartValue,
    #[error("end value must not be empty")]
    EmptyEndValue,
    #[error("{field} value is not a whole number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("start value {start} is greater than end value {end}")]
    InvertedRange { start: i64, end: i64 },
    #[error("camera unavailable: {0}")]
    CameraUnavailable(CameraStatus),
}

//! Label Analysis
//!
//! Decides which recognized blocks become scanned values: pattern and range
//! validation, duplicate detection, and the per-template cycle strategies.

pub mod label;
pub mod ledger;
pub mod strategy;

pub use label::{is_within_range, AcceptRange, LabelValidator, TemplateType};
pub use ledger::{ClassifiedValue, Classification};
pub use strategy::{CycleContext, CycleDecision, ScanStrategy, SkipReason};

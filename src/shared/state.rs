//! Scan session state
//!
//! The entry form input, the ordered set of accepted values, and the
//! accumulator that threads that set through a session until hand-off.

use std::collections::HashSet;
use tracing::debug;

use crate::analysis::{is_within_range, AcceptRange, TemplateType};
use crate::error::ScanError;
use crate::shared::messages::ResultsPayload;

/// Values entered on the form before scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInput {
    pub start_value: String,
    pub end_value: String,
    pub template: TemplateType,
}

impl SessionInput {
    pub fn new(start_value: impl Into<String>, end_value: impl Into<String>, template: TemplateType) -> Self {
        Self {
            start_value: start_value.into(),
            end_value: end_value.into(),
            template,
        }
    }

    /// Check the form and produce the accept range
    pub fn validate(&self) -> Result<AcceptRange, ScanError> {
        let start = self.start_value.trim();
        let end = self.end_value.trim();

        if start.is_empty() {
            return Err(ScanError::EmptyStartValue);
        }
        if end.is_empty() {
            return Err(ScanError::EmptyEndValue);
        }

        let start = parse_value("start", start)?;
        let end = parse_value("end", end)?;
        if start > end {
            return Err(ScanError::InvertedRange { start, end });
        }

        Ok(AcceptRange::new(start, end))
    }
}

fn parse_value(field: &'static str, value: &str) -> Result<i64, ScanError> {
    value.parse::<i64>().map_err(|_| ScanError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Insertion-ordered set of accepted label values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedValues {
    order: Vec<String>,
    index: HashSet<String>,
}

impl AcceptedValues {
    pub fn contains(&self, value: &str) -> bool {
        self.index.contains(value)
    }

    /// Append `value`; returns false if it was already present
    pub fn insert(&mut self, value: String) -> bool {
        if !self.index.insert(value.clone()) {
            return false;
        }
        self.order.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Accepted values for one scan session
#[derive(Debug)]
pub struct SessionAccumulator {
    input: SessionInput,
    range: AcceptRange,
    accepted: AcceptedValues,
    ended: bool,
}

impl SessionAccumulator {
    pub fn new(input: SessionInput) -> Result<Self, ScanError> {
        let range = input.validate()?;
        Ok(Self {
            input,
            range,
            accepted: AcceptedValues::default(),
            ended: false,
        })
    }

    pub fn input(&self) -> &SessionInput {
        &self.input
    }

    pub fn range(&self) -> AcceptRange {
        self.range
    }

    pub fn accepted(&self) -> &AcceptedValues {
        &self.accepted
    }

    /// Append newly accepted values. Returns how many were added.
    ///
    /// Values already present or outside the accept range are ignored, and
    /// nothing is added once the session has ended.
    pub fn commit<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        if self.ended {
            debug!("Session already ended, dropping late commit");
            return 0;
        }

        let mut added = 0;
        for value in values {
            if !is_within_range(&value, &self.range) {
                debug!("Refusing out-of-range value {}", value);
                continue;
            }
            if self.accepted.insert(value) {
                added += 1;
            }
        }
        added
    }

    /// Close the session and package the hand-off payload
    pub fn finish(&mut self) -> ResultsPayload {
        self.ended = true;
        ResultsPayload {
            accepted_values: self.accepted.to_vec(),
            start_value: self.input.start_value.trim().to_string(),
            end_value: self.input.end_value.trim().to_string(),
        }
    }
}

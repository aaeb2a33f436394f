//! Duplicate detection
//!
//! Classifies candidate values against the values already accepted in the
//! session, and against values already seen earlier in the same cycle.

use std::collections::HashSet;

use crate::shared::state::AcceptedValues;

/// Whether a recognized value is new to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Duplicate,
}

/// A value paired with its classification, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedValue {
    pub value: String,
    pub classification: Classification,
}

impl ClassifiedValue {
    pub fn is_new(&self) -> bool {
        self.classification == Classification::New
    }
}

/// Classify against the accepted set only
pub fn classify(candidate: &str, existing: &AcceptedValues) -> Classification {
    if existing.contains(candidate) {
        Classification::Duplicate
    } else {
        Classification::New
    }
}

/// Per-cycle ledger
///
/// Each distinct value is `New` at most once per cycle. Any later occurrence
/// in the same cycle, or any value already accepted by an earlier cycle, is
/// `Duplicate`.
pub struct DedupLedger<'a> {
    existing: &'a AcceptedValues,
    seen: HashSet<String>,
    entries: Vec<ClassifiedValue>,
}

impl<'a> DedupLedger<'a> {
    pub fn new(existing: &'a AcceptedValues) -> Self {
        Self {
            existing,
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }

    pub fn classify(&mut self, candidate: &str) -> Classification {
        let classification = if self.seen.contains(candidate) {
            Classification::Duplicate
        } else {
            classify(candidate, self.existing)
        };

        self.seen.insert(candidate.to_string());
        self.entries.push(ClassifiedValue {
            value: candidate.to_string(),
            classification,
        });
        classification
    }

    /// Everything classified so far, in order
    pub fn into_entries(self) -> Vec<ClassifiedValue> {
        self.entries
    }
}

//! Hand-off between the scan screen and the results screen

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Payload delivered to the results screen when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsPayload {
    /// Accepted label values in scan order
    pub accepted_values: Vec<String>,
    pub start_value: String,
    pub end_value: String,
}

impl ResultsPayload {
    fn bounds(&self) -> Option<(i64, i64)> {
        let start = self.start_value.trim().parse::<i64>().ok()?;
        let end = self.end_value.trim().parse::<i64>().ok()?;
        (start <= end).then_some((start, end))
    }

    fn scanned(&self) -> HashSet<i64> {
        self.accepted_values
            .iter()
            .filter_map(|v| v.parse::<i64>().ok())
            .collect()
    }

    /// Values in the range that were not scanned, ascending.
    ///
    /// Lazy, so callers can page through ranges far too wide to collect.
    pub fn missing_values(&self) -> impl Iterator<Item = i64> {
        let scanned = self.scanned();
        self.bounds()
            .into_iter()
            .flat_map(|(start, end)| start..=end)
            .filter(move |n| !scanned.contains(n))
    }

    /// Number of values in the range that were not scanned
    pub fn missing_count(&self) -> u64 {
        let Some((start, end)) = self.bounds() else {
            return 0;
        };
        let scanned_in_range = self
            .scanned()
            .into_iter()
            .filter(|n| (start..=end).contains(n))
            .count() as u64;
        self.progress().1.saturating_sub(scanned_in_range)
    }

    /// (scanned, total) for the range. The total saturates at `u64::MAX`
    /// for a range spanning every `i64`.
    pub fn progress(&self) -> (usize, u64) {
        let total = self
            .bounds()
            .map(|(start, end)| start.abs_diff(end).saturating_add(1))
            .unwrap_or(0);
        (self.accepted_values.len(), total)
    }
}

/// Navigation collaborator
pub trait Navigator: Send + Sync {
    /// Show the results screen. Called once per session.
    fn navigate_to_results(&self, payload: ResultsPayload);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(values: &[&str]) -> ResultsPayload {
        ResultsPayload {
            accepted_values: values.iter().map(|v| v.to_string()).collect(),
            start_value: "100".to_string(),
            end_value: "105".to_string(),
        }
    }

    #[test]
    fn test_missing_values() {
        let p = payload(&["102", "100", "105"]);
        assert_eq!(p.missing_values().collect::<Vec<_>>(), vec![101, 103, 104]);
        assert_eq!(p.missing_count(), 3);
    }

    #[test]
    fn test_progress() {
        assert_eq!(payload(&["102", "103"]).progress(), (2, 6));
        assert_eq!(payload(&[]).progress(), (0, 6));
    }

    #[test]
    fn test_progress_full_i64_range_saturates() {
        let p = ResultsPayload {
            accepted_values: vec!["0".to_string()],
            start_value: i64::MIN.to_string(),
            end_value: i64::MAX.to_string(),
        };
        assert_eq!(p.progress(), (1, u64::MAX));
        assert_eq!(p.missing_count(), u64::MAX - 1);
    }

    #[test]
    fn test_missing_values_wide_range_is_lazy() {
        let p = ResultsPayload {
            accepted_values: vec!["1".to_string()],
            start_value: "0".to_string(),
            end_value: "9999999999".to_string(),
        };

        let first: Vec<i64> = p.missing_values().take(3).collect();
        assert_eq!(first, vec![0, 2, 3]);
        assert_eq!(p.missing_count(), 9_999_999_999);
    }

    #[test]
    fn test_unparseable_bounds() {
        let p = ResultsPayload {
            accepted_values: vec![],
            start_value: "abc".to_string(),
            end_value: "105".to_string(),
        };
        assert_eq!(p.missing_values().next(), None);
        assert_eq!(p.missing_count(), 0);
        assert_eq!(p.progress(), (0, 0));
    }

    #[test]
    fn test_payload_json_shape() {
        let json = serde_json::to_value(payload(&["102"])).unwrap();
        assert_eq!(json["accepted_values"][0], "102");
        assert_eq!(json["start_value"], "100");
        assert_eq!(json["end_value"], "105");
    }
}

//! Temporal values and "as of" resolution.
//!
//! Every attribute of an entity is recorded as a history: an ordered list of
//! [`TemporalValue`]s, each valid over a closed interval `[valid_from, valid_to]`
//! where a missing bound means the interval is unbounded on that side.
//!
//! Validity bounds may be written as partial dates. A partial date resolves to
//! the first day of its period when it opens an interval and to the last
//! calendar day of its period when it closes one:
//!
//! - `2024` → `2024-01-01` / `2024-12-31`
//! - `2024-02` → `2024-02-01` / `2024-02-29`
//! - `2024-02-10` → `2024-02-10` either way

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static PARTIAL_DATE: OnceLock<Regex> = OnceLock::new();

fn partial_date_regex() -> &'static Regex {
    PARTIAL_DATE.get_or_init(|| {
        Regex::new(r"^(\d{4})(?:-(\d{1,2})(?:-(\d{1,2}))?)?$")
            .expect("partial date pattern is a valid regex")
    })
}

/// Which side of an interval a partial date is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Opening bound: first day of the period.
    Start,
    /// Closing bound: last day of the period.
    End,
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Parses a full or partial date and resolves it for the given bound.
///
/// # Errors
///
/// Returns `ValidationError::InvalidDate` if the input is not `YYYY`,
/// `YYYY-MM` or `YYYY-MM-DD`, or names a day that does not exist.
///
/// # Examples
///
/// ```
/// use kronika::time::{parse_bound, Bound};
/// use chrono::NaiveDate;
///
/// let end = parse_bound("2024-02", Bound::End).unwrap();
/// assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// ```
pub fn parse_bound(input: &str, bound: Bound) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        input: input.to_string(),
    };

    let caps = partial_date_regex()
        .captures(input.trim())
        .ok_or_else(invalid)?;

    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: Option<u32> = caps
        .get(2)
        .map(|m| m.as_str().parse())
        .transpose()
        .map_err(|_| invalid())?;
    let day: Option<u32> = caps
        .get(3)
        .map(|d| d.as_str().parse())
        .transpose()
        .map_err(|_| invalid())?;

    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(invalid());
        }
    }

    let date = match (month, day, bound) {
        (None, _, Bound::Start) => NaiveDate::from_ymd_opt(year, 1, 1),
        (None, _, Bound::End) => NaiveDate::from_ymd_opt(year, 12, 31),
        (Some(m), None, Bound::Start) => NaiveDate::from_ymd_opt(year, m, 1),
        (Some(m), None, Bound::End) => last_day_of_month(year, m),
        (Some(m), Some(d), _) => NaiveDate::from_ymd_opt(year, m, d),
    };

    date.ok_or_else(invalid)
}

/// A value together with the interval during which it holds.
///
/// # Examples
///
/// ```
/// use kronika::TemporalValue;
/// use chrono::NaiveDate;
///
/// let value = TemporalValue::parse("Erathia", Some("2024-01"), Some("2024-06"));
/// let april = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();
/// assert!(value.is_active(Some(april)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporalValue {
    /// The attribute value.
    pub text: String,

    /// First day the value holds (inclusive). None means unbounded past.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,

    /// Last day the value holds (inclusive). None means unbounded future.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
}

impl TemporalValue {
    /// Creates a value with explicit, already resolved bounds.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        valid_from: Option<NaiveDate>,
        valid_to: Option<NaiveDate>,
    ) -> Self {
        Self {
            text: text.into(),
            valid_from,
            valid_to,
        }
    }

    /// Creates a value without any validity bounds.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, None, None)
    }

    /// Creates an open-ended value starting at `from`.
    #[must_use]
    pub fn starting_at(text: impl Into<String>, from: NaiveDate) -> Self {
        Self::new(text, Some(from), None)
    }

    /// Builds a value from textual bounds, tolerating malformed input.
    ///
    /// Empty bounds are treated as absent. If either bound cannot be parsed
    /// the value is kept as plain, unbounded text.
    #[must_use]
    pub fn parse(text: impl Into<String>, from: Option<&str>, to: Option<&str>) -> Self {
        let text = text.into();
        let from = from.map(str::trim).filter(|s| !s.is_empty());
        let to = to.map(str::trim).filter(|s| !s.is_empty());

        let valid_from = from.map(|s| parse_bound(s, Bound::Start)).transpose();
        let valid_to = to.map(|s| parse_bound(s, Bound::End)).transpose();

        match (valid_from, valid_to) {
            (Ok(valid_from), Ok(valid_to)) => Self {
                text,
                valid_from,
                valid_to,
            },
            (Err(err), _) | (_, Err(err)) => {
                tracing::debug!(value = %text, error = %err, "malformed validity, keeping plain value");
                Self::plain(text)
            }
        }
    }

    /// Returns true if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.valid_from.is_none() && self.valid_to.is_none()
    }

    /// Returns true if `date` falls within `[valid_from, valid_to]`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.valid_from.map_or(true, |from| date >= from)
            && self.valid_to.map_or(true, |to| date <= to)
    }

    /// Returns true if the value is active as of `as_of`.
    ///
    /// With no reference date every value counts as active.
    #[must_use]
    pub fn is_active(&self, as_of: Option<NaiveDate>) -> bool {
        match as_of {
            None => true,
            Some(date) => self.is_unbounded() || self.contains(date),
        }
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            return write!(f, "{}", self.text);
        }
        let from = self
            .valid_from
            .map_or_else(|| "-∞".to_string(), |d| d.to_string());
        let to = self
            .valid_to
            .map_or_else(|| "∞".to_string(), |d| d.to_string());
        write!(f, "{} [{from} → {to}]", self.text)
    }
}

/// Returns true if `item` is active as of `as_of`.
#[must_use]
pub fn is_active(item: &TemporalValue, as_of: Option<NaiveDate>) -> bool {
    item.is_active(as_of)
}

/// Returns the last recorded history entry active as of `as_of`.
#[must_use]
pub fn last_active(history: &[TemporalValue], as_of: Option<NaiveDate>) -> Option<&TemporalValue> {
    history.iter().rev().find(|item| item.is_active(as_of))
}

/// Returns every history entry active as of `as_of`, in recorded order.
#[must_use]
pub fn all_active(history: &[TemporalValue], as_of: Option<NaiveDate>) -> Vec<&TemporalValue> {
    history.iter().filter(|item| item.is_active(as_of)).collect()
}

/// Stable sort by `valid_from`; entries without a start bound come first.
pub fn sort_by_valid_from(history: &mut [TemporalValue]) {
    // Option orders None before Some.
    history.sort_by_key(|item| item.valid_from);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_history() -> Vec<TemporalValue> {
        vec![
            TemporalValue::parse("A", Some("2024-01"), Some("2024-06")),
            TemporalValue::parse("B", Some("2024-07"), None),
        ]
    }

    #[test]
    fn test_parse_bound_year_only() {
        assert_eq!(parse_bound("2024", Bound::Start).unwrap(), date(2024, 1, 1));
        assert_eq!(parse_bound("2024", Bound::End).unwrap(), date(2024, 12, 31));
    }

    #[test]
    fn test_parse_bound_year_month_leap() {
        assert_eq!(parse_bound("2024-02", Bound::End).unwrap(), date(2024, 2, 29));
        assert_eq!(parse_bound("2023-02", Bound::End).unwrap(), date(2023, 2, 28));
        assert_eq!(parse_bound("2024-12", Bound::End).unwrap(), date(2024, 12, 31));
        assert_eq!(parse_bound("2024-02", Bound::Start).unwrap(), date(2024, 2, 1));
    }

    #[test]
    fn test_parse_bound_full_date() {
        assert_eq!(parse_bound(" 2025-03-01 ", Bound::End).unwrap(), date(2025, 3, 1));
    }

    #[test]
    fn test_parse_bound_invalid() {
        assert!(parse_bound("2024-13", Bound::Start).is_err());
        assert!(parse_bound("2024-00", Bound::End).is_err());
        assert!(parse_bound("2023-02-29", Bound::Start).is_err());
        assert!(parse_bound("wiosna", Bound::Start).is_err());
        assert!(parse_bound("", Bound::Start).is_err());
    }

    #[test]
    fn test_parse_malformed_validity_keeps_plain_text() {
        let value = TemporalValue::parse("Steadwick", Some("zimą"), Some("2024-06"));
        assert_eq!(value, TemporalValue::plain("Steadwick"));
        assert!(value.is_unbounded());
    }

    #[test]
    fn test_parse_empty_bounds_are_absent() {
        let value = TemporalValue::parse("Steadwick", Some(""), Some("  "));
        assert!(value.is_unbounded());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let value = TemporalValue::parse("A", Some("2024-01"), Some("2024-06"));
        assert!(value.contains(date(2024, 1, 1)));
        assert!(value.contains(date(2024, 6, 30)));
        assert!(!value.contains(date(2024, 7, 1)));
        assert!(!value.contains(date(2023, 12, 31)));
    }

    #[test]
    fn test_is_active_without_reference_date() {
        let value = TemporalValue::parse("A", Some("2020"), Some("2020"));
        assert!(value.is_active(None));
        assert!(!value.is_active(Some(date(2021, 1, 1))));
        assert!(TemporalValue::plain("B").is_active(Some(date(1900, 1, 1))));
    }

    #[test]
    fn test_last_active_in_range() {
        let history = sample_history();
        let hit = last_active(&history, Some(date(2024, 4, 15))).unwrap();
        assert_eq!(hit.text, "A");
    }

    #[test]
    fn test_last_active_after_change() {
        let history = sample_history();
        let hit = last_active(&history, Some(date(2025, 1, 1))).unwrap();
        assert_eq!(hit.text, "B");
    }

    #[test]
    fn test_last_active_without_date_is_most_recent() {
        let history = sample_history();
        assert_eq!(last_active(&history, None).unwrap().text, "B");
    }

    #[test]
    fn test_last_active_before_history() {
        let history = sample_history();
        assert!(last_active(&history, Some(date(2023, 5, 1))).is_none());
    }

    #[test]
    fn test_all_active_keeps_order() {
        let history = vec![
            TemporalValue::plain("x"),
            TemporalValue::parse("y", Some("2024"), None),
            TemporalValue::parse("z", None, Some("2023")),
        ];
        let active: Vec<_> = all_active(&history, Some(date(2024, 5, 5)))
            .into_iter()
            .map(|v| v.text.as_str())
            .collect();
        assert_eq!(active, vec!["x", "y"]);
        assert_eq!(all_active(&history, None).len(), 3);
    }

    #[test]
    fn test_sort_by_valid_from_is_stable() {
        let mut history = vec![
            TemporalValue::parse("late", Some("2025"), None),
            TemporalValue::plain("first-plain"),
            TemporalValue::parse("early", Some("2020"), None),
            TemporalValue::plain("second-plain"),
        ];
        sort_by_valid_from(&mut history);
        let order: Vec<_> = history.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(order, vec!["first-plain", "second-plain", "early", "late"]);
    }

    #[test]
    fn test_display() {
        let value = TemporalValue::parse("Enroth", Some("2024-07"), None);
        let shown = format!("{value}");
        assert!(shown.contains("2024-07-01"));
        assert!(shown.contains('∞'));
        assert_eq!(format!("{}", TemporalValue::plain("Enroth")), "Enroth");
    }

    #[test]
    fn test_serialization_skips_missing_bounds() {
        let value = TemporalValue::plain("Enroth");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"text":"Enroth"}"#);

        let bounded = TemporalValue::parse("Enroth", Some("2024-07"), Some("2024-08"));
        let json = serde_json::to_string(&bounded).unwrap();
        let back: TemporalValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bounded);
    }
}

//! Dated change directives.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::RawValue;
use crate::time::TemporalValue;

/// One tag/value pair of a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChange {
    /// Tag name, e.g. `lokacja` or `ilość`.
    pub tag: String,
    /// New value, optionally with its own bounds.
    pub value: RawValue,
}

impl TagChange {
    /// A change with no explicit validity.
    #[must_use]
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: RawValue::Text(value.into()),
        }
    }

    /// A change whose value carries its own validity bounds.
    #[must_use]
    pub fn dated(
        tag: impl Into<String>,
        value: impl Into<String>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Self {
        Self {
            tag: tag.into(),
            value: RawValue::Dated {
                value: value.into(),
                from: from.map(str::to_string),
                to: to.map(str::to_string),
            },
        }
    }

    /// The value to record for a directive dated `date`.
    ///
    /// A value without any validity bounds starts at `date` and stays open.
    #[must_use]
    pub fn stamped(&self, date: NaiveDate) -> TemporalValue {
        let mut value = self.value.clone().into_temporal();
        if value.is_unbounded() {
            value.valid_from = Some(date);
        }
        value
    }
}

/// Changes to one entity recorded during a session.
///
/// # Examples
///
/// ```
/// use kronika::merge::ChangeDirective;
///
/// let directive: ChangeDirective = serde_json::from_str(
///     r#"{"target": "Kupiec Orrin", "date": "2025-03-01",
///         "changes": [{"tag": "lokacja", "value": "Steadwick"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(directive.changes.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDirective {
    /// Free-text reference to the entity.
    #[serde(alias = "cel")]
    pub target: String,
    /// Session date.
    #[serde(alias = "data")]
    pub date: NaiveDate,
    /// Changes to apply, in order.
    #[serde(default, alias = "zmiany")]
    pub changes: Vec<TagChange>,
}

impl ChangeDirective {
    /// A directive with no changes yet.
    #[must_use]
    pub fn new(target: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            target: target.into(),
            date,
            changes: Vec::new(),
        }
    }

    /// Appends a change.
    #[must_use]
    pub fn with_change(mut self, change: TagChange) -> Self {
        self.changes.push(change);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_value_is_auto_dated() {
        let value = TagChange::new("lokacja", "Steadwick").stamped(date(2025, 3, 1));
        assert_eq!(value.valid_from, Some(date(2025, 3, 1)));
        assert_eq!(value.valid_to, None);
    }

    #[test]
    fn test_explicit_validity_is_kept() {
        let change = TagChange::dated("status", "ranny", Some("2025-02"), Some("2025-02"));
        let value = change.stamped(date(2025, 3, 1));
        assert_eq!(value.valid_from, Some(date(2025, 2, 1)));
        assert_eq!(value.valid_to, Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_malformed_validity_is_auto_dated() {
        let change = TagChange::dated("status", "ranny", Some("wiosna"), None);
        let value = change.stamped(date(2025, 3, 1));
        assert_eq!(value.text, "ranny");
        assert_eq!(value.valid_from, Some(date(2025, 3, 1)));
    }

    #[test]
    fn test_polish_field_names() {
        let directive: ChangeDirective = serde_json::from_str(
            r#"{"cel": "Orrin", "data": "2025-03-01",
                "zmiany": [{"tag": "status", "value": {"value": "martwy", "od": "2025-03"}}]}"#,
        )
        .unwrap();
        assert_eq!(directive.target, "Orrin");
        assert_eq!(
            directive.changes[0].stamped(directive.date).valid_from,
            Some(date(2025, 3, 1))
        );
    }
}

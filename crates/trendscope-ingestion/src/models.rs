//! Canonical count records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalise::rules::ColumnMapping;

/// Layout a count file is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedShape {
    /// Counts per technical element per period.
    Monthly,
    /// Counts per technical element × country/company/industry per period.
    Grouped,
}

/// One period of one series, after column normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// First day of the period; `None` when the source value did not parse.
    pub timestamp: Option<NaiveDate>,
    pub technical_element: String,
    /// Country, company or industry. Always `None` for monthly tables.
    pub group_key: Option<String>,
    pub count: u64,
    /// Precomputed 6-period moving average; `None` where the source is blank.
    pub moving_average: Option<f64>,
    pub conversion_flag: bool,
}

impl CanonicalRecord {
    /// Identity of the series this record belongs to: the group key for
    /// grouped tables, the technical element otherwise.
    pub fn series_key(&self) -> &str {
        self.group_key.as_deref().unwrap_or(&self.technical_element)
    }
}

/// Normalised table plus the column mapping that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTable {
    pub shape: ExpectedShape,
    pub records: Vec<CanonicalRecord>,
    pub mapping: ColumnMapping,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct technical elements in first-seen order.
    pub fn technical_elements(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.technical_element.as_str()) {
                seen.push(record.technical_element.as_str());
            }
        }
        seen
    }

    /// Distinct series keys in first-seen order.
    pub fn series_keys(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.series_key()) {
                seen.push(record.series_key());
            }
        }
        seen
    }

    /// Keep only the records of one technical element. Order is preserved.
    pub fn filter_technical_element(&self, element: &str) -> CanonicalTable {
        CanonicalTable {
            shape: self.shape,
            records: self
                .records
                .iter()
                .filter(|r| r.technical_element == element)
                .cloned()
                .collect(),
            mapping: self.mapping.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(element: &str, group: Option<&str>, count: u64) -> CanonicalRecord {
        CanonicalRecord {
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 1),
            technical_element: element.to_string(),
            group_key: group.map(str::to_string),
            count,
            moving_average: None,
            conversion_flag: false,
        }
    }

    #[test]
    fn test_series_key_prefers_group() {
        assert_eq!(record("AI", Some("JP"), 1).series_key(), "JP");
        assert_eq!(record("AI", None, 1).series_key(), "AI");
    }

    #[test]
    fn test_filter_and_distinct_elements() {
        let table = CanonicalTable {
            shape: ExpectedShape::Grouped,
            records: vec![
                record("AI", Some("JP"), 1),
                record("Robotics", Some("US"), 2),
                record("AI", Some("US"), 3),
            ],
            mapping: ColumnMapping::default(),
        };

        assert_eq!(table.technical_elements(), vec!["AI", "Robotics"]);
        let ai = table.filter_technical_element("AI");
        assert_eq!(ai.len(), 2);
        assert_eq!(ai.series_keys(), vec!["JP", "US"]);
    }
}

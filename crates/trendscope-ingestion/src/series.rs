//! Cumulative series over canonical count tables.
//!
//! `cumulative_moving_average` is the running sum of the per-period moving
//! averages, not a moving average of the cumulative counts. Every dashboard
//! variant computes it this way and the charts expect that line.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{CanonicalRecord, CanonicalTable, ExpectedShape};

/// A canonical record with its running totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    pub cumulative_count: u64,
    /// `None` on rows whose own moving average is blank.
    pub cumulative_moving_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedTable {
    pub shape: ExpectedShape,
    pub records: Vec<DerivedRecord>,
}

/// Compute running totals per (technical element, group key) partition, in
/// table order. `normalize` has already sorted by timestamp within each
/// partition.
pub fn derive(table: &CanonicalTable) -> DerivedTable {
    let mut totals: HashMap<(&str, Option<&str>), (u64, f64)> = HashMap::new();
    let mut records = Vec::with_capacity(table.records.len());

    for record in &table.records {
        let partition = (record.technical_element.as_str(), record.group_key.as_deref());
        let (count_total, ma_total) = totals.entry(partition).or_insert((0, 0.0));

        *count_total += record.count;
        let cumulative_moving_average = record.moving_average.map(|ma| {
            *ma_total += ma;
            *ma_total
        });

        records.push(DerivedRecord {
            record: record.clone(),
            cumulative_count: *count_total,
            cumulative_moving_average,
        });
    }

    DerivedTable {
        shape: table.shape,
        records,
    }
}

/// Which line a chart draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Count,
    Cumulative,
}

/// Line toggles shared by every series on a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlay {
    pub show_raw: bool,
    pub show_moving_average: bool,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            show_raw: true,
            show_moving_average: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: Option<NaiveDate>,
    pub count: u64,
    pub moving_average: Option<f64>,
    pub cumulative_count: u64,
    pub cumulative_moving_average: Option<f64>,
    pub conversion_flag: bool,
}

impl SeriesPoint {
    pub fn value(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Count => self.count as f64,
            Measure::Cumulative => self.cumulative_count as f64,
        }
    }

    pub fn smoothed(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Count => self.moving_average,
            Measure::Cumulative => self.cumulative_moving_average,
        }
    }
}

/// Position of a conversion-flag marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub timestamp: Option<NaiveDate>,
    pub value: Option<f64>,
}

/// All points of one partition. `key` is the identity a renderer uses to
/// colour and toggle the raw line, its moving-average line, and its markers
/// together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: String,
    pub technical_element: String,
    pub group_key: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// Marker positions for flagged points. Markers sit on the moving-average
    /// line when it is shown, on the raw line when only that is shown, and
    /// are omitted when both are hidden.
    pub fn markers(&self, measure: Measure, overlay: Overlay) -> Vec<Marker> {
        if !overlay.show_moving_average && !overlay.show_raw {
            return Vec::new();
        }
        self.points
            .iter()
            .filter(|p| p.conversion_flag)
            .map(|p| Marker {
                timestamp: p.timestamp,
                value: if overlay.show_moving_average {
                    p.smoothed(measure)
                } else {
                    Some(p.value(measure))
                },
            })
            .collect()
    }

    /// Last cumulative count, i.e. the partition total.
    pub fn total(&self) -> u64 {
        self.points.last().map(|p| p.cumulative_count).unwrap_or(0)
    }
}

impl DerivedTable {
    /// Split into one series per partition, in first-seen order.
    ///
    /// Keys are the group key (or technical element) when the table holds a
    /// single technical element. A grouped table spanning several elements
    /// gets `"{element} / {group}"` keys so that every series stays distinct.
    pub fn series(&self) -> Vec<Series> {
        let mut index: HashMap<(&str, Option<&str>), usize> = HashMap::new();
        let mut series: Vec<Series> = Vec::new();

        let first_element = self.records.first().map(|r| r.record.technical_element.as_str());
        let mixed_elements = self
            .records
            .iter()
            .any(|r| Some(r.record.technical_element.as_str()) != first_element);

        for derived in &self.records {
            let record = &derived.record;
            let partition = (record.technical_element.as_str(), record.group_key.as_deref());
            let slot = *index.entry(partition).or_insert_with(|| {
                let key = match &record.group_key {
                    Some(group) if mixed_elements => format!("{} / {group}", record.technical_element),
                    _ => record.series_key().to_string(),
                };
                series.push(Series {
                    key,
                    technical_element: record.technical_element.clone(),
                    group_key: record.group_key.clone(),
                    points: Vec::new(),
                });
                series.len() - 1
            });

            series[slot].points.push(SeriesPoint {
                timestamp: record.timestamp,
                count: record.count,
                moving_average: record.moving_average,
                cumulative_count: derived.cumulative_count,
                cumulative_moving_average: derived.cumulative_moving_average,
                conversion_flag: record.conversion_flag,
            });
        }

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalise::rules::ColumnMapping;

    fn record(element: &str, group: Option<&str>, month: u32, count: u64, ma: Option<f64>, flag: bool) -> CanonicalRecord {
        CanonicalRecord {
            timestamp: NaiveDate::from_ymd_opt(2023, month, 1),
            technical_element: element.to_string(),
            group_key: group.map(str::to_string),
            count,
            moving_average: ma,
            conversion_flag: flag,
        }
    }

    fn table(records: Vec<CanonicalRecord>) -> CanonicalTable {
        CanonicalTable {
            shape: ExpectedShape::Monthly,
            records,
            mapping: ColumnMapping::default(),
        }
    }

    #[test]
    fn test_cumulative_per_partition() {
        let derived = derive(&table(vec![
            record("AI", None, 1, 10, Some(8.5), false),
            record("AI", None, 2, 5, Some(7.0), true),
            record("Robotics", None, 1, 4, Some(1.0), false),
        ]));

        assert_eq!(derived.records[1].cumulative_count, 15);
        assert_eq!(derived.records[1].cumulative_moving_average, Some(15.5));
        assert_eq!(derived.records[2].cumulative_count, 4);
    }

    #[test]
    fn test_blank_moving_average_skipped_in_running_sum() {
        let derived = derive(&table(vec![
            record("AI", None, 1, 1, None, false),
            record("AI", None, 2, 1, Some(2.0), false),
            record("AI", None, 3, 1, None, false),
            record("AI", None, 4, 1, Some(3.0), false),
        ]));
        let cma: Vec<Option<f64>> = derived.records.iter().map(|r| r.cumulative_moving_average).collect();
        assert_eq!(cma, vec![None, Some(2.0), None, Some(5.0)]);
    }

    #[test]
    fn test_series_split_and_total() {
        let derived = derive(&table(vec![
            record("AI", Some("JP"), 1, 2, Some(1.0), false),
            record("AI", Some("JP"), 2, 3, Some(1.0), true),
            record("AI", Some("US"), 1, 7, Some(1.0), false),
        ]));
        let series = derived.series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, "JP");
        assert_eq!(series[0].total(), 5);
        assert_eq!(series[1].total(), 7);
    }

    #[test]
    fn test_series_keys_distinct_across_elements() {
        let derived = derive(&table(vec![
            record("AI", Some("US"), 1, 4, Some(1.0), false),
            record("Robotics", Some("US"), 1, 9, Some(2.0), false),
            record("AI", Some("JP"), 1, 2, Some(1.0), false),
        ]));
        let keys: Vec<String> = derived.series().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["AI / US", "Robotics / US", "AI / JP"]);
    }

    #[test]
    fn test_marker_placement_follows_overlay() {
        let derived = derive(&table(vec![
            record("AI", None, 1, 10, Some(8.5), false),
            record("AI", None, 2, 5, Some(7.0), true),
        ]));
        let series = &derived.series()[0];

        let on_ma = series.markers(Measure::Cumulative, Overlay::default());
        assert_eq!(on_ma.len(), 1);
        assert_eq!(on_ma[0].value, Some(15.5));

        let raw_only = Overlay { show_raw: true, show_moving_average: false };
        assert_eq!(series.markers(Measure::Count, raw_only)[0].value, Some(5.0));

        let hidden = Overlay { show_raw: false, show_moving_average: false };
        assert!(series.markers(Measure::Count, hidden).is_empty());
    }
}

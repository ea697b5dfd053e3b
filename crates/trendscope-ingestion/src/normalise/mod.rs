//! Column normalisation for count tables.
//!
//! `normalize` maps whatever headers a source file uses onto the canonical
//! count schema, parses cells, and sorts the result by
//! (group key or technical element, timestamp). Pure function of its inputs.

pub mod rules;
pub mod timestamp;

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};
use trendscope_common::{Result, TrendError};

use crate::models::{CanonicalRecord, CanonicalTable, ExpectedShape};
use crate::table::RawTable;
use rules::{resolve_columns, CanonicalColumn, ColumnMapping, COUNT_TABLE_RULES};

pub use timestamp::parse_timestamp;

/// Caller choices for one normalisation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalizeOptions {
    pub shape: ExpectedShape,
    /// Fail when no technical-element column is found.
    pub require_technical_element: bool,
}

impl NormalizeOptions {
    pub fn new(shape: ExpectedShape) -> Self {
        Self {
            shape,
            require_technical_element: true,
        }
    }
}

/// Normalise with the technical-element column required.
pub fn normalize(raw: &RawTable, shape: ExpectedShape) -> Result<CanonicalTable> {
    normalize_with(raw, &NormalizeOptions::new(shape))
}

pub fn normalize_with(raw: &RawTable, options: &NormalizeOptions) -> Result<CanonicalTable> {
    let mapping = resolve_columns(
        raw.headers(),
        options.shape,
        COUNT_TABLE_RULES,
        options.require_technical_element,
    )?;

    for (canonical, resolved) in &mapping.resolved {
        debug!(canonical = %canonical, source = %resolved.source, matched_by = ?resolved.matched_by, "Resolved column");
    }
    for dropped in &mapping.dropped {
        warn!(source = %dropped.source, canonical = %dropped.canonical, "Ignoring duplicate column");
    }

    let mut records = Vec::with_capacity(raw.len());
    for row in 0..raw.len() {
        records.push(parse_record(raw, row, &mapping, options.shape)?);
    }

    let unparsed = records.iter().filter(|r| r.timestamp.is_none()).count();
    if unparsed > 0 {
        warn!(rows = unparsed, "Rows with unparseable timestamps kept with null timestamp");
    }

    sort_records(&mut records, options.shape);
    let duplicates = duplicate_periods(&records);
    if duplicates > 0 {
        warn!(duplicates, "Repeated periods within a series");
    }

    Ok(CanonicalTable {
        shape: options.shape,
        records,
        mapping,
    })
}

fn parse_record(
    raw: &RawTable,
    row: usize,
    mapping: &ColumnMapping,
    shape: ExpectedShape,
) -> Result<CanonicalRecord> {
    let cell = |column: CanonicalColumn| {
        mapping
            .index_of(column)
            .map(|i| raw.cell(row, i))
            .unwrap_or("")
    };
    let source = |column: CanonicalColumn| mapping.source_of(column).unwrap_or(column.name());

    let count = parse_count(cell(CanonicalColumn::Count)).ok_or_else(|| TrendError::InvalidValue {
        column: source(CanonicalColumn::Count).to_string(),
        row: row + 1,
        value: cell(CanonicalColumn::Count).to_string(),
    })?;

    let moving_average = parse_optional_float(cell(CanonicalColumn::MovingAverage)).map_err(|_| {
        TrendError::InvalidValue {
            column: source(CanonicalColumn::MovingAverage).to_string(),
            row: row + 1,
            value: cell(CanonicalColumn::MovingAverage).to_string(),
        }
    })?;

    let conversion_flag = parse_flag(cell(CanonicalColumn::ConversionFlag)).ok_or_else(|| {
        TrendError::InvalidValue {
            column: source(CanonicalColumn::ConversionFlag).to_string(),
            row: row + 1,
            value: cell(CanonicalColumn::ConversionFlag).to_string(),
        }
    })?;

    let group_key = match shape {
        ExpectedShape::Grouped => non_empty(cell(CanonicalColumn::GroupKey)),
        ExpectedShape::Monthly => None,
    };

    Ok(CanonicalRecord {
        timestamp: parse_timestamp(cell(CanonicalColumn::Timestamp)),
        technical_element: cell(CanonicalColumn::TechnicalElement).trim().to_string(),
        group_key,
        count,
        moving_average,
        conversion_flag,
    })
}

/// Non-negative whole number, written either as an integer or as a float
/// with no fractional part (`"10"`, `"10.0"`).
pub fn parse_count(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<u64>() {
        return Some(n);
    }
    let f: f64 = value.parse().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Blank and NaN markers are `Ok(None)`; other non-numbers are errors.
pub fn parse_optional_float(value: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    let value = value.trim();
    if value.is_empty() || ["nan", "na", "null", "none"].contains(&value.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    let f: f64 = value.parse()?;
    Ok(f.is_finite().then_some(f))
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" | "n" | "0.0" => Some(false),
        "true" | "1" | "yes" | "y" | "1.0" => Some(true),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Stable sort by (partition label, timestamp); missing labels and
/// timestamps sort last.
fn sort_records(records: &mut [CanonicalRecord], shape: ExpectedShape) {
    records.sort_by(|a, b| {
        let label = match shape {
            ExpectedShape::Grouped => cmp_nulls_last(a.group_key.as_deref(), b.group_key.as_deref()),
            ExpectedShape::Monthly => a.technical_element.cmp(&b.technical_element),
        };
        label.then_with(|| cmp_nulls_last(a.timestamp, b.timestamp))
    });
}

fn cmp_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Records whose (technical element, group key, timestamp) was already seen.
fn duplicate_periods(records: &[CanonicalRecord]) -> usize {
    let mut seen: HashSet<(&str, Option<&str>, NaiveDate)> = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.timestamp.map(|ts| (r.technical_element.as_str(), r.group_key.as_deref(), ts)))
        .filter(|key| !seen.insert(*key))
        .count()
}

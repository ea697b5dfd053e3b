//! Row types and output formats.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use trendscope_common::OutputFormat;
use trendscope_ingestion::normalise::rules::{CanonicalColumn, ColumnMapping, MatchKind};
use trendscope_ingestion::{Measure, Overlay, Series};
use trendscope_ranker::{BarRow, RadarRow, ScoreRow};

/// A row that can be printed as an aligned text table.
pub trait TableRow: Serialize {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

/// One point of a count chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub series: String,
    pub technical_element: String,
    pub timestamp: Option<NaiveDate>,
    /// Raw or cumulative count; absent when raw lines are hidden.
    pub value: Option<f64>,
    /// Moving average or its running sum; absent when the overlay is hidden.
    pub moving_average: Option<f64>,
    pub flagged: bool,
    /// Where the flag marker sits, if drawn.
    pub marker: Option<f64>,
}

/// Flatten series into chart rows.
pub fn count_rows(series: &[Series], measure: Measure, overlay: Overlay) -> Vec<CountRow> {
    let mut rows = Vec::new();
    for s in series {
        let mut markers = s.markers(measure, overlay).into_iter();
        for point in &s.points {
            let marker = if point.conversion_flag {
                markers.next().and_then(|m| m.value)
            } else {
                None
            };
            rows.push(CountRow {
                series: s.key.clone(),
                technical_element: s.technical_element.clone(),
                timestamp: point.timestamp,
                value: overlay.show_raw.then(|| point.value(measure)),
                moving_average: if overlay.show_moving_average {
                    point.smoothed(measure)
                } else {
                    None
                },
                flagged: point.conversion_flag,
                marker,
            });
        }
    }
    rows
}

impl TableRow for CountRow {
    fn headers() -> &'static [&'static str] {
        &["series", "technical_element", "timestamp", "value", "moving_average", "flag"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.series.clone(),
            self.technical_element.clone(),
            self.timestamp.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            format_optional(self.value),
            format_optional(self.moving_average),
            match self.marker {
                Some(v) => format!("* {}", format_number(v)),
                None if self.flagged => "*".to_string(),
                None => String::new(),
            },
        ]
    }
}

impl TableRow for RadarRow {
    fn headers() -> &'static [&'static str] {
        &["technical_element", "group", "value"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.technical_element.clone(),
            self.group.clone(),
            format_number(self.value),
        ]
    }
}

impl TableRow for BarRow {
    fn headers() -> &'static [&'static str] {
        &["group", "composite_score"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.group.clone(), format_number(self.composite_score)]
    }
}

impl TableRow for ScoreRow {
    fn headers() -> &'static [&'static str] {
        &["technical_element", "group", "score", "evidence"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.technical_element.clone(),
            self.group.clone(),
            format_number(self.value),
            self.evidence.clone().unwrap_or_default(),
        ]
    }
}

/// One resolved or dropped column of an inspected file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingRow {
    pub canonical: CanonicalColumn,
    pub source: String,
    pub matched_by: Option<MatchKind>,
    pub dropped: bool,
}

pub fn mapping_rows(mapping: &ColumnMapping) -> Vec<MappingRow> {
    let resolved = mapping.resolved.iter().map(|(canonical, column)| MappingRow {
        canonical: *canonical,
        source: column.source.clone(),
        matched_by: Some(column.matched_by),
        dropped: false,
    });
    let dropped = mapping.dropped.iter().map(|column| MappingRow {
        canonical: column.canonical,
        source: column.source.clone(),
        matched_by: None,
        dropped: true,
    });
    resolved.chain(dropped).collect()
}

impl TableRow for MappingRow {
    fn headers() -> &'static [&'static str] {
        &["canonical", "source", "matched_by"]
    }

    fn cells(&self) -> Vec<String> {
        let matched_by = match self.matched_by {
            Some(MatchKind::Alias) => "alias",
            Some(MatchKind::Substring) => "substring",
            None => "dropped (duplicate)",
        };
        vec![
            self.canonical.name().to_string(),
            self.source.clone(),
            matched_by.to_string(),
        ]
    }
}

/// Write `rows` to `out` in the requested format.
pub fn write_rows<T: TableRow, W: Write>(out: &mut W, rows: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, rows)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => write_table(out, rows)?,
    }
    Ok(())
}

fn write_table<T: TableRow, W: Write>(out: &mut W, rows: &[T]) -> std::io::Result<()> {
    let headers: Vec<String> = T::headers().iter().map(|h| h.to_string()).collect();
    let cells: Vec<Vec<String>> = rows.iter().map(T::cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_line(out, &headers, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(out, &rule, &widths)?;
    for row in &cells {
        write_line(out, row, &widths)?;
    }
    if rows.is_empty() {
        writeln!(out, "(no rows)")?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, values: &[String], widths: &[usize]) -> std::io::Result<()> {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{v:<width$}", width = *w))
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

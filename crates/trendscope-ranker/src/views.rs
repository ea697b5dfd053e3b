//! Filtered views over a scored difficulty table.
//!
//! Every view starts from a [`Selection`] of technical elements; an empty
//! selection is rejected before any rows are produced.

use serde::Serialize;
use tracing::debug;

use trendscope_common::{Result, TrendError};

use crate::scorer::{Dimension, Metric, ScoredDifficultyRecord, ScoredDifficultyTable};

/// One spoke of the radar view: a group's value for a technical element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarRow {
    pub technical_element: String,
    pub group: String,
    pub value: f64,
}

/// One bar: a group's composite score for a single technical element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRow {
    pub group: String,
    pub composite_score: f64,
}

/// One line of the score table, with the comment backing the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub technical_element: String,
    pub group: String,
    pub value: f64,
    pub evidence: Option<String>,
}

/// A non-empty set of technical elements chosen from a scored table.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    table: &'a ScoredDifficultyTable,
    elements: Vec<String>,
}

impl ScoredDifficultyTable {
    /// Select technical elements by name. Duplicates are collapsed, names
    /// absent from the table are rejected.
    pub fn select<S: AsRef<str>>(&self, elements: &[S]) -> Result<Selection<'_>> {
        let mut chosen: Vec<String> = Vec::with_capacity(elements.len());
        for element in elements {
            let element = element.as_ref().trim();
            if !self.contains_technical_element(element) {
                return Err(TrendError::UnknownTechnicalElement(element.to_string()));
            }
            if !chosen.iter().any(|c| c == element) {
                chosen.push(element.to_string());
            }
        }
        if chosen.is_empty() {
            return Err(TrendError::EmptySelection);
        }
        Ok(Selection {
            table: self,
            elements: chosen,
        })
    }

    /// Select every technical element in the table.
    pub fn select_all(&self) -> Result<Selection<'_>> {
        self.select(&self.technical_elements())
    }
}

impl<'a> Selection<'a> {
    pub fn contains(&self, element: &str) -> bool {
        self.elements.iter().any(|e| e == element)
    }

    /// Records of the selected elements in table order.
    pub fn records(&self) -> impl Iterator<Item = &'a ScoredDifficultyRecord> + '_ {
        self.table
            .records
            .iter()
            .filter(move |r| self.contains(&r.technical_element))
    }

    /// `metric` per (element, group) along `dimension`.
    pub fn radar_view(&self, metric: Metric, dimension: Dimension) -> Result<Vec<RadarRow>> {
        self.table.require_dimension(dimension)?;
        let rows: Vec<RadarRow> = self
            .records()
            .filter_map(|r| {
                let value = r.metric_value(metric, dimension)?;
                let group = &r.dimension(dimension)?.group;
                Some(RadarRow {
                    technical_element: r.technical_element.clone(),
                    group: group.clone(),
                    value,
                })
            })
            .collect();
        debug!(metric = %metric, dimension = %dimension, rows = rows.len(), "Built radar view");
        Ok(rows)
    }

    /// Composite scores of one selected element per group, highest first.
    /// Ties keep table order.
    pub fn bar_view(&self, element: &str, dimension: Dimension) -> Result<Vec<BarRow>> {
        self.table.require_dimension(dimension)?;
        if !self.table.contains_technical_element(element) {
            return Err(TrendError::UnknownTechnicalElement(element.to_string()));
        }
        if !self.contains(element) {
            return Err(TrendError::EmptySelection);
        }
        let mut rows: Vec<BarRow> = self
            .records()
            .filter(|r| r.technical_element == element)
            .filter_map(|r| {
                let scored = r.dimension(dimension)?;
                Some(BarRow {
                    group: scored.group.clone(),
                    composite_score: scored.composite_score,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
        Ok(rows)
    }

    /// `metric` with its evidence per (element, group), sorted by element
    /// then group.
    pub fn score_table(&self, metric: Metric, dimension: Dimension) -> Result<Vec<ScoreRow>> {
        self.table.require_dimension(dimension)?;
        let evidence_column = self.table.evidence_column(metric, dimension);
        let mut rows: Vec<ScoreRow> = self
            .records()
            .filter_map(|r| {
                let value = r.metric_value(metric, dimension)?;
                Some(ScoreRow {
                    technical_element: r.technical_element.clone(),
                    group: r.dimension(dimension)?.group.clone(),
                    value,
                    evidence: evidence_column.and_then(|c| r.comment(c)).map(str::to_string),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.technical_element
                .cmp(&b.technical_element)
                .then_with(|| a.group.cmp(&b.group))
        });
        Ok(rows)
    }
}

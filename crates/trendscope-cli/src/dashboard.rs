//! Dashboard state: configuration plus the count-table and difficulty caches.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use trendscope_common::{DashboardConfig, Domain, Result, TrendError, View};
use trendscope_ingestion::{derive, CanonicalTable, ExpectedShape, Measure, Overlay, Series, TableCache};
use trendscope_ranker::{
    score, BarRow, Dimension, Metric, RadarRow, ScoreRow, ScoredDifficultyTable, WeightVector,
};

/// Column layout a view's source file is normalised against.
pub fn shape_for(view: View) -> ExpectedShape {
    if view.is_grouped() {
        ExpectedShape::Grouped
    } else {
        ExpectedShape::Monthly
    }
}

/// A count-chart request.
#[derive(Debug, Clone)]
pub struct CountQuery {
    pub domain: Domain,
    pub view: View,
    /// Technical element to drill into. Grouped views default to the first
    /// element in the file.
    pub element: Option<String>,
    pub measure: Measure,
    pub overlay: Overlay,
}

/// A difficulty-chart request.
#[derive(Debug, Clone)]
pub struct DifficultyQuery {
    pub metric: Metric,
    pub dimension: Dimension,
    /// Selected technical elements; empty selects all of them.
    pub elements: Vec<String>,
    pub bar_element: Option<String>,
    pub score_table: bool,
}

/// Rows produced by a difficulty request.
#[derive(Debug, Clone)]
pub enum DifficultyRows {
    Radar(Vec<RadarRow>),
    Bar(Vec<BarRow>),
    Scores(Vec<ScoreRow>),
}

pub struct Dashboard {
    config: DashboardConfig,
    tables: TableCache,
    difficulty: Option<(PathBuf, Arc<ScoredDifficultyTable>)>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            tables: TableCache::new(),
            difficulty: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    /// Canonical table behind a domain/view pair, loaded once per process.
    pub fn count_table(&mut self, domain: Domain, view: View) -> Result<Arc<CanonicalTable>> {
        let path = self.config.data.path_for(domain, view);
        self.tables.get_or_load(&path, shape_for(view))
    }

    /// Series for a count chart, one per line on the chart. A table with no
    /// rows yields [`TrendError::EmptySelection`].
    pub fn count_series(&mut self, query: &CountQuery) -> Result<Vec<Series>> {
        let table = self.count_table(query.domain, query.view)?;

        let element = match &query.element {
            Some(name) => Some(name.clone()),
            None if query.view.is_grouped() => {
                let first = table.technical_elements().first().map(|e| e.to_string());
                if let Some(first) = &first {
                    info!(view = %query.view, element = %first, "No technical element given; using the first one");
                }
                first
            }
            None => None,
        };

        let derived = match element {
            Some(name) => {
                if !table.technical_elements().contains(&name.as_str()) {
                    return Err(TrendError::UnknownTechnicalElement(name));
                }
                derive(&table.filter_technical_element(&name))
            }
            None => derive(&table),
        };

        let series = derived.series();
        if series.is_empty() {
            return Err(TrendError::EmptySelection);
        }
        debug!(
            domain = %query.domain,
            view = %query.view,
            series = series.len(),
            measure = ?query.measure,
            "Built count series"
        );
        Ok(series)
    }

    /// Scored difficulty table. Every dimension with complete columns is
    /// scored; views over a missing dimension fail at query time.
    pub fn difficulty(&mut self) -> Result<Arc<ScoredDifficultyTable>> {
        let path = self.config.data.difficulty_path();
        if let Some((cached, table)) = &self.difficulty {
            if *cached == path {
                return Ok(Arc::clone(table));
            }
        }

        let raw = trendscope_ingestion::RawTable::from_path(&path)?;
        let weights = WeightVector::from(&self.config.scoring);
        let table = Arc::new(score(&raw, &weights)?);
        self.difficulty = Some((path, Arc::clone(&table)));
        Ok(table)
    }

    pub fn difficulty_rows(&mut self, query: &DifficultyQuery) -> Result<DifficultyRows> {
        let table = self.difficulty()?;
        let selection = if query.elements.is_empty() {
            table.select_all()?
        } else {
            table.select(&query.elements)?
        };

        if let Some(element) = &query.bar_element {
            return Ok(DifficultyRows::Bar(selection.bar_view(element, query.dimension)?));
        }
        if query.score_table {
            return Ok(DifficultyRows::Scores(
                selection.score_table(query.metric, query.dimension)?,
            ));
        }
        Ok(DifficultyRows::Radar(
            selection.radar_view(query.metric, query.dimension)?,
        ))
    }

    /// Drop every cached table so the next request rereads its file.
    pub fn reload(&mut self) {
        let (hits, misses) = self.tables.stats();
        info!(cached = self.tables.len(), hits, misses, "Clearing dashboard caches");
        self.tables.clear();
        self.difficulty = None;
    }
}

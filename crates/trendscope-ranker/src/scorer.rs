//! Composite difficulty score computation.
//!
//! Composite_d = w_trl · TRL_norm_d + w_tech · Tech_norm_d + w_social · Social_inv_d
//!
//! where d is a dimension (industry or company) and the weights are the
//! renormalised [`WeightVector`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use trendscope_common::{Result, TrendError};
use trendscope_ingestion::RawTable;

use crate::normalise::{
    in_range, normalise_social_inverted, normalise_technical, normalise_trl, FEASIBILITY_RANGE,
    TRL_RANGE,
};
use crate::weights::WeightVector;

/// Header aliases applied before scoring.
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("technology", "technical_element"),
    ("TRL_tech", "TRL"),
    ("Technical_Feasibility_tech", "Technical_Feasibility"),
    ("Social_Feasibility_tech", "Social_Feasibility"),
];

const TECHNICAL_ELEMENT: &str = "technical_element";
const BASE_RATINGS: [&str; 3] = ["TRL", "Technical_Feasibility", "Social_Feasibility"];
const COMMENT_MARKER: &str = "_Comment_";

/// Grouping under which a technical element is rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Industry,
    Company,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Industry, Dimension::Company];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Industry => "industry",
            Dimension::Company => "company",
        }
    }

    /// Columns a table must carry to be scored along this dimension: the
    /// group column plus the three suffixed ratings.
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns = vec![self.name().to_string()];
        columns.extend(BASE_RATINGS.iter().map(|r| format!("{r}_{}", self.name())));
        columns
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "industry" => Ok(Dimension::Industry),
            "company" => Ok(Dimension::Company),
            other => Err(format!("unknown dimension '{other}' (expected industry or company)")),
        }
    }
}

/// Rating or score shown in difficulty views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    CompositeScore,
    Trl,
    TechnicalFeasibility,
    SocialFeasibility,
}

impl Metric {
    /// Column stem used in the difficulty file, e.g. `TRL` in `TRL_industry`.
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::CompositeScore => "Composite_Score",
            Metric::Trl => "TRL",
            Metric::TechnicalFeasibility => "Technical_Feasibility",
            Metric::SocialFeasibility => "Social_Feasibility",
        }
    }

    /// Evidence columns for this metric in lookup order.
    pub fn evidence_columns(&self, dimension: Dimension) -> [String; 2] {
        [
            format!("{}{COMMENT_MARKER}{}", self.column_name(), dimension.name()),
            format!("{}{COMMENT_MARKER}tech", self.column_name()),
        ]
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "composite" | "composite_score" => Ok(Metric::CompositeScore),
            "trl" => Ok(Metric::Trl),
            "technical" | "technical_feasibility" => Ok(Metric::TechnicalFeasibility),
            "social" | "social_feasibility" => Ok(Metric::SocialFeasibility),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// TRL / Technical Feasibility / Social Feasibility as rated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub trl: f64,
    pub technical_feasibility: f64,
    pub social_feasibility: f64,
}

/// Normalised ratings (all in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalisedRatings {
    pub trl_norm: f64,
    pub tech_norm: f64,
    pub social_inv_norm: f64,
}

impl NormalisedRatings {
    pub fn as_array(&self) -> [f64; 3] {
        [self.trl_norm, self.tech_norm, self.social_inv_norm]
    }
}

impl Ratings {
    pub fn normalised(&self) -> NormalisedRatings {
        NormalisedRatings {
            trl_norm: normalise_trl(self.trl),
            tech_norm: normalise_technical(self.technical_feasibility),
            social_inv_norm: normalise_social_inverted(self.social_feasibility),
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Trl => Some(self.trl),
            Metric::TechnicalFeasibility => Some(self.technical_feasibility),
            Metric::SocialFeasibility => Some(self.social_feasibility),
            Metric::CompositeScore => None,
        }
    }

    fn out_of_range(&self) -> bool {
        !in_range(self.trl, TRL_RANGE)
            || !in_range(self.technical_feasibility, FEASIBILITY_RANGE)
            || !in_range(self.social_feasibility, FEASIBILITY_RANGE)
    }
}

/// Weighted sum of normalised ratings, clamped to [0, 1].
pub fn compute_composite_score(normalised: &NormalisedRatings, weights: &WeightVector) -> f64 {
    let w = weights.as_array();
    let n = normalised.as_array();
    let score: f64 = w.iter().zip(n.iter()).map(|(wi, ni)| wi * ni).sum();
    score.clamp(0.0, 1.0)
}

/// A technical element rated within one industry or company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub group: String,
    pub ratings: Ratings,
    pub normalised: NormalisedRatings,
    pub composite_score: f64,
}

/// One row of the difficulty table after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDifficultyRecord {
    pub technical_element: String,
    /// Element-level ratings.
    pub ratings: Ratings,
    pub normalised: NormalisedRatings,
    pub dimensions: BTreeMap<Dimension, DimensionScore>,
    /// Free-text `*_Comment_*` cells keyed by column name; blanks omitted.
    pub comments: BTreeMap<String, String>,
}

impl ScoredDifficultyRecord {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.dimensions.get(&dimension)
    }

    /// Value of `metric` along `dimension`: the composite score or the
    /// dimension-level rating.
    pub fn metric_value(&self, metric: Metric, dimension: Dimension) -> Option<f64> {
        let scored = self.dimension(dimension)?;
        match metric {
            Metric::CompositeScore => Some(scored.composite_score),
            _ => scored.ratings.value(metric),
        }
    }

    /// Non-blank text of one comment column.
    pub fn comment(&self, column: &str) -> Option<&str> {
        self.comments.get(column).map(String::as_str)
    }
}

/// Scored difficulty table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDifficultyTable {
    pub records: Vec<ScoredDifficultyRecord>,
    pub dimensions: Vec<Dimension>,
    pub weights: WeightVector,
    /// `*_Comment_*` headers present in the source file.
    #[serde(default)]
    pub comment_columns: Vec<String>,
}

impl ScoredDifficultyTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_dimension(&self, dimension: Dimension) -> bool {
        self.dimensions.contains(&dimension)
    }

    /// Distinct technical elements in first-seen order.
    pub fn technical_elements(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.technical_element.as_str()) {
                seen.push(&record.technical_element);
            }
        }
        seen
    }

    /// Column holding the evidence for `metric` along `dimension`: the first
    /// of [`Metric::evidence_columns`] the file carries. Chosen per table, so a
    /// blank cell in that column stays blank for its row.
    pub fn evidence_column(&self, metric: Metric, dimension: Dimension) -> Option<&str> {
        metric
            .evidence_columns(dimension)
            .iter()
            .find_map(|candidate| self.comment_columns.iter().find(|c| *c == candidate))
            .map(String::as_str)
    }

    pub fn contains_technical_element(&self, element: &str) -> bool {
        self.records.iter().any(|r| r.technical_element == element)
    }

    pub(crate) fn require_dimension(&self, dimension: Dimension) -> Result<()> {
        if self.has_dimension(dimension) {
            Ok(())
        } else {
            Err(TrendError::MissingDimensionColumns {
                dimension: dimension.name().to_string(),
                missing: dimension.required_columns(),
            })
        }
    }
}

/// Score every dimension the table carries columns for. Dimensions with
/// incomplete columns are skipped with a warning.
pub fn score(raw: &RawTable, weights: &WeightVector) -> Result<ScoredDifficultyTable> {
    let mut table = raw.clone();
    table.rename_columns(COLUMN_ALIASES);

    let available: Vec<Dimension> = Dimension::ALL
        .into_iter()
        .filter(|d| {
            let missing = missing_columns(&table, *d);
            if !missing.is_empty() {
                warn!(dimension = %d, missing = ?missing, "Skipping dimension with incomplete columns");
            }
            missing.is_empty()
        })
        .collect();

    score_renamed(&table, &available, weights)
}

/// Score the given dimensions. A dimension whose group or rating columns
/// are absent fails with [`TrendError::MissingDimensionColumns`].
pub fn score_dimensions(
    raw: &RawTable,
    dimensions: &[Dimension],
    weights: &WeightVector,
) -> Result<ScoredDifficultyTable> {
    let mut table = raw.clone();
    table.rename_columns(COLUMN_ALIASES);

    for dimension in dimensions {
        let missing = missing_columns(&table, *dimension);
        if !missing.is_empty() {
            return Err(TrendError::MissingDimensionColumns {
                dimension: dimension.name().to_string(),
                missing,
            });
        }
    }

    score_renamed(&table, dimensions, weights)
}

/// Read and score the difficulty file at `path`.
pub fn load_difficulty(
    path: &Path,
    dimensions: &[Dimension],
    weights: &WeightVector,
) -> Result<ScoredDifficultyTable> {
    info!(path = %path.display(), "Loading difficulty table");
    let raw = RawTable::from_path(path)?;
    score_dimensions(&raw, dimensions, weights)
}

fn missing_columns(table: &RawTable, dimension: Dimension) -> Vec<String> {
    dimension
        .required_columns()
        .into_iter()
        .filter(|c| !table.has_column(c))
        .collect()
}

fn column(table: &RawTable, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| TrendError::schema(name, table.headers()))
}

fn read_ratings(table: &RawTable, row: usize, columns: &[usize; 3]) -> Result<Ratings> {
    let rating = |i: usize| -> Result<f64> {
        let value = table.cell(row, columns[i]).trim();
        value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| TrendError::InvalidValue {
            column: table.headers()[columns[i]].clone(),
            row: row + 1,
            value: value.to_string(),
        })
    };
    Ok(Ratings {
        trl: rating(0)?,
        technical_feasibility: rating(1)?,
        social_feasibility: rating(2)?,
    })
}

fn score_renamed(
    table: &RawTable,
    dimensions: &[Dimension],
    weights: &WeightVector,
) -> Result<ScoredDifficultyTable> {
    let weights = if weights.validate() {
        *weights
    } else {
        debug!(sum = weights.sum(), "Renormalising weights");
        weights.normalised()
    };

    let element_col = column(table, TECHNICAL_ELEMENT)?;
    let base_cols = [
        column(table, BASE_RATINGS[0])?,
        column(table, BASE_RATINGS[1])?,
        column(table, BASE_RATINGS[2])?,
    ];

    let mut dimension_cols: Vec<(Dimension, usize, [usize; 3])> = Vec::with_capacity(dimensions.len());
    for dimension in dimensions {
        let names = dimension.required_columns();
        dimension_cols.push((
            *dimension,
            column(table, &names[0])?,
            [column(table, &names[1])?, column(table, &names[2])?, column(table, &names[3])?],
        ));
    }

    let comment_cols: Vec<(usize, &String)> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains(COMMENT_MARKER))
        .collect();

    let mut records = Vec::with_capacity(table.len());
    let mut out_of_range = 0usize;

    for row in 0..table.len() {
        let ratings = read_ratings(table, row, &base_cols)?;
        if ratings.out_of_range() {
            out_of_range += 1;
        }

        let mut scored = BTreeMap::new();
        for (dimension, group_col, rating_cols) in &dimension_cols {
            let ratings = read_ratings(table, row, rating_cols)?;
            if ratings.out_of_range() {
                out_of_range += 1;
            }
            let normalised = ratings.normalised();
            scored.insert(
                *dimension,
                DimensionScore {
                    group: table.cell(row, *group_col).trim().to_string(),
                    ratings,
                    normalised,
                    composite_score: compute_composite_score(&normalised, &weights),
                },
            );
        }

        let comments = comment_cols
            .iter()
            .filter_map(|(i, header)| {
                let text = table.cell(row, *i).trim();
                (!text.is_empty()).then(|| ((*header).clone(), text.to_string()))
            })
            .collect();

        records.push(ScoredDifficultyRecord {
            technical_element: table.cell(row, element_col).trim().to_string(),
            normalised: ratings.normalised(),
            ratings,
            dimensions: scored,
            comments,
        });
    }

    if out_of_range > 0 {
        warn!(count = out_of_range, "Ratings outside their scale were clamped during normalisation");
    }

    info!(
        rows = records.len(),
        dimensions = ?dimensions,
        "Scored difficulty table"
    );

    Ok(ScoredDifficultyTable {
        records,
        dimensions: dimensions.to_vec(),
        weights,
        comment_columns: comment_cols.iter().map(|(_, header)| (*header).clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(csv: &str) -> RawTable {
        RawTable::from_csv(csv).unwrap()
    }

    const HEADER: &str = "technology,industry,TRL_tech,Technical_Feasibility_tech,Social_Feasibility_tech,TRL_industry,Technical_Feasibility_industry,Social_Feasibility_industry";

    #[test]
    fn test_composite_extremes() {
        let table = raw(&format!(
            "{HEADER}\nA,Auto,9,5,1,9,5,1\nB,Auto,1,1,5,1,1,5\n"
        ));
        let scored = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap();

        let top = scored.records[0].metric_value(Metric::CompositeScore, Dimension::Industry).unwrap();
        let bottom = scored.records[1].metric_value(Metric::CompositeScore, Dimension::Industry).unwrap();
        assert!((top - 1.0).abs() < 1e-9);
        assert!(bottom.abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_composite() {
        // TRL 5 -> 0.5, TF 3 -> 0.5, SF 3 -> 0.5
        let table = raw(&format!("{HEADER}\nA,Auto,5,3,3,5,3,3\n"));
        let scored = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap();
        let composite = scored.records[0].dimensions[&Dimension::Industry].composite_score;
        assert!((composite - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_aliases_are_applied() {
        let table = raw(&format!("{HEADER}\nA,Auto,7,4,2,7,4,2\n"));
        let scored = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap();
        let record = &scored.records[0];
        assert_eq!(record.technical_element, "A");
        assert_eq!(record.ratings.trl, 7.0);
        assert!((record.normalised.trl_norm - 0.75).abs() < 1e-12);
        assert!((record.normalised.social_inv_norm - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_missing_company_columns() {
        let table = raw(&format!("{HEADER}\nA,Auto,7,4,2,7,4,2\n"));
        let err = score_dimensions(&table, &[Dimension::Company], &WeightVector::default()).unwrap_err();
        match err {
            TrendError::MissingDimensionColumns { dimension, missing } => {
                assert_eq!(dimension, "company");
                assert_eq!(missing.len(), 4);
                assert!(missing.contains(&"TRL_company".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_group_column_counts_toward_dimension() {
        let table = raw(
            "technology,TRL_tech,Technical_Feasibility_tech,Social_Feasibility_tech,TRL_industry,Technical_Feasibility_industry,Social_Feasibility_industry\nA,7,4,2,7,4,2\n",
        );
        let err = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap_err();
        assert!(matches!(
            err,
            TrendError::MissingDimensionColumns { ref missing, .. } if missing == &vec!["industry".to_string()]
        ));
    }

    #[test]
    fn test_score_skips_incomplete_dimensions() {
        let table = raw(&format!("{HEADER}\nA,Auto,7,4,2,7,4,2\n"));
        let scored = score(&table, &WeightVector::default()).unwrap();
        assert_eq!(scored.dimensions, vec![Dimension::Industry]);
        assert!(scored.records[0].dimension(Dimension::Company).is_none());
    }

    #[test]
    fn test_missing_base_rating_is_schema_error() {
        let table = raw("technology,TRL_tech\nA,7\n");
        let err = score_dimensions(&table, &[], &WeightVector::default()).unwrap_err();
        assert!(matches!(err, TrendError::Schema { ref concept, .. } if concept == "Technical_Feasibility"));
    }

    #[test]
    fn test_non_numeric_rating() {
        let table = raw(&format!("{HEADER}\nA,Auto,high,4,2,7,4,2\n"));
        let err = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap_err();
        assert!(matches!(
            err,
            TrendError::InvalidValue { ref column, row: 1, .. } if column == "TRL"
        ));
    }

    #[test]
    fn test_out_of_range_rating_is_clamped() {
        let table = raw(&format!("{HEADER}\nA,Auto,7,4,2,12,6,0\n"));
        let scored = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap();
        let dim = &scored.records[0].dimensions[&Dimension::Industry];
        assert_eq!(dim.ratings.trl, 12.0);
        assert!((dim.composite_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_metric_and_dimension_parsing() {
        assert_eq!("composite".parse::<Metric>().unwrap(), Metric::CompositeScore);
        assert_eq!("TRL".parse::<Metric>().unwrap(), Metric::Trl);
        assert_eq!("Social_Feasibility".parse::<Metric>().unwrap(), Metric::SocialFeasibility);
        assert_eq!("Company".parse::<Dimension>().unwrap(), Dimension::Company);
        assert!("region".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_evidence_lookup_order() {
        let table = raw(&format!(
            "{HEADER},TRL_Comment_tech,Composite_Score_Comment_industry,Composite_Score_Comment_tech\nA,Auto,7,4,2,7,4,2,element note,industry note,overall\n"
        ));
        let scored = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap();
        assert_eq!(scored.evidence_column(Metric::Trl, Dimension::Industry), Some("TRL_Comment_tech"));
        assert_eq!(
            scored.evidence_column(Metric::CompositeScore, Dimension::Industry),
            Some("Composite_Score_Comment_industry")
        );
        assert_eq!(scored.evidence_column(Metric::SocialFeasibility, Dimension::Industry), None);
        assert_eq!(scored.records[0].comment("Composite_Score_Comment_industry"), Some("industry note"));
    }

    #[test]
    fn test_blank_dimension_comment_does_not_fall_back() {
        let table = raw(&format!(
            "{HEADER},TRL_Comment_industry,TRL_Comment_tech\nA,Auto,7,4,2,7,4,2,,element-level note\nB,Auto,7,4,2,7,4,2,pilot plant,other note\n"
        ));
        let scored = score_dimensions(&table, &[Dimension::Industry], &WeightVector::default()).unwrap();
        let rows = scored.select_all().unwrap().score_table(Metric::Trl, Dimension::Industry).unwrap();
        let evidence: Vec<(&str, Option<&str>)> = rows
            .iter()
            .map(|r| (r.technical_element.as_str(), r.evidence.as_deref()))
            .collect();
        assert_eq!(evidence, vec![("A", None), ("B", Some("pilot plant"))]);
    }
}

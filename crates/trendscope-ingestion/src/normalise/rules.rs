//! Column detection rules.
//!
//! Each canonical column is described by one `ColumnRule`: exact aliases in
//! priority order, then case-insensitive substrings tried only when no alias
//! is present. Rules are evaluated in `COUNT_TABLE_RULES` order and a source
//! column claimed by an earlier rule is never reused by a later one.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use trendscope_common::{Result, TrendError};

use crate::models::ExpectedShape;

/// Target columns of the canonical count schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Count,
    TechnicalElement,
    GroupKey,
    Timestamp,
    MovingAverage,
    ConversionFlag,
}

impl CanonicalColumn {
    pub fn name(self) -> &'static str {
        match self {
            CanonicalColumn::Count => "count",
            CanonicalColumn::TechnicalElement => "technical_element",
            CanonicalColumn::GroupKey => "group_key",
            CanonicalColumn::Timestamp => "timestamp",
            CanonicalColumn::MovingAverage => "moving_average",
            CanonicalColumn::ConversionFlag => "conversion_flag",
        }
    }

    /// Human wording used in error messages.
    pub fn concept(self) -> &'static str {
        match self {
            CanonicalColumn::Count => "item count",
            CanonicalColumn::TechnicalElement => "technical element",
            CanonicalColumn::GroupKey => "country/company/industry grouping",
            CanonicalColumn::Timestamp => "year-month timestamp",
            CanonicalColumn::MovingAverage => "6-period moving average",
            CanonicalColumn::ConversionFlag => "conversion flag",
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// When a missing column is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    /// Only if the caller asked for it (see `NormalizeOptions`).
    IfDeclared,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub canonical: CanonicalColumn,
    /// Shapes the column exists in at all.
    pub shapes: &'static [ExpectedShape],
    /// Exact header names, highest priority first.
    pub aliases: &'static [&'static str],
    /// Lower-case fragments matched against lower-cased headers.
    pub substrings: &'static [&'static str],
    /// Shapes in which substring matching is allowed.
    pub substring_shapes: &'static [ExpectedShape],
    pub requirement: Requirement,
}

const BOTH: &[ExpectedShape] = &[ExpectedShape::Monthly, ExpectedShape::Grouped];
const GROUPED: &[ExpectedShape] = &[ExpectedShape::Grouped];
const NONE: &[ExpectedShape] = &[];

/// Detection rules for count tables, evaluated in order.
///
/// The grouping aliases put country ahead of company and industry: a file
/// carrying several of them is read as a country breakdown.
pub const COUNT_TABLE_RULES: &[ColumnRule] = &[
    ColumnRule {
        canonical: CanonicalColumn::Count,
        shapes: BOTH,
        aliases: &["items", "count"],
        substrings: &[],
        substring_shapes: NONE,
        requirement: Requirement::Always,
    },
    ColumnRule {
        canonical: CanonicalColumn::TechnicalElement,
        shapes: BOTH,
        aliases: &["category", "Technical_elements", "technical_elements", "technical_element"],
        substrings: &["technical"],
        substring_shapes: GROUPED,
        requirement: Requirement::IfDeclared,
    },
    ColumnRule {
        canonical: CanonicalColumn::GroupKey,
        shapes: GROUPED,
        aliases: &["Country", "country", "Company", "company", "industry", "Industry", "group_key"],
        substrings: &[],
        substring_shapes: NONE,
        requirement: Requirement::Always,
    },
    ColumnRule {
        canonical: CanonicalColumn::Timestamp,
        shapes: BOTH,
        aliases: &["year_month", "date", "month", "timestamp"],
        substrings: &["month", "date"],
        substring_shapes: BOTH,
        requirement: Requirement::Always,
    },
    ColumnRule {
        canonical: CanonicalColumn::MovingAverage,
        shapes: BOTH,
        aliases: &["ma_6", "moving_average"],
        substrings: &["ma_6"],
        substring_shapes: BOTH,
        requirement: Requirement::Always,
    },
    ColumnRule {
        canonical: CanonicalColumn::ConversionFlag,
        shapes: BOTH,
        aliases: &["conversion_flag"],
        substrings: &["flag"],
        substring_shapes: BOTH,
        requirement: Requirement::Always,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Alias,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumn {
    pub source: String,
    pub index: usize,
    pub matched_by: MatchKind,
}

/// A source column that would also have mapped onto an already resolved
/// canonical column and was therefore ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedColumn {
    pub source: String,
    pub canonical: CanonicalColumn,
}

/// Outcome of running the rules over a header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub resolved: BTreeMap<CanonicalColumn, ResolvedColumn>,
    pub dropped: Vec<DroppedColumn>,
}

impl ColumnMapping {
    pub fn index_of(&self, column: CanonicalColumn) -> Option<usize> {
        self.resolved.get(&column).map(|r| r.index)
    }

    pub fn source_of(&self, column: CanonicalColumn) -> Option<&str> {
        self.resolved.get(&column).map(|r| r.source.as_str())
    }
}

/// Run `rules` over `headers` for a table of the given shape.
///
/// `require_declared` decides whether `Requirement::IfDeclared` columns are
/// mandatory. A missing mandatory column is a `TrendError::Schema` naming the
/// concept and listing the headers that were present.
pub fn resolve_columns(
    headers: &[String],
    shape: ExpectedShape,
    rules: &[ColumnRule],
    require_declared: bool,
) -> Result<ColumnMapping> {
    let mut mapping = ColumnMapping::default();
    let mut claimed: HashSet<usize> = HashSet::new();

    for rule in rules.iter().filter(|r| r.shapes.contains(&shape)) {
        let candidates = candidates(headers, shape, rule, &claimed);

        let Some((index, matched_by)) = candidates.first().copied() else {
            let required = match rule.requirement {
                Requirement::Always => true,
                Requirement::IfDeclared => require_declared,
            };
            if required {
                return Err(TrendError::schema(rule.canonical.concept(), headers));
            }
            continue;
        };

        claimed.insert(index);
        mapping.resolved.insert(
            rule.canonical,
            ResolvedColumn {
                source: headers[index].clone(),
                index,
                matched_by,
            },
        );

        for &(other, _) in candidates.iter().skip(1) {
            claimed.insert(other);
            mapping.dropped.push(DroppedColumn {
                source: headers[other].clone(),
                canonical: rule.canonical,
            });
        }
    }

    Ok(mapping)
}

/// Every unclaimed header the rule accepts, best match first.
fn candidates(
    headers: &[String],
    shape: ExpectedShape,
    rule: &ColumnRule,
    claimed: &HashSet<usize>,
) -> Vec<(usize, MatchKind)> {
    let mut found: Vec<(usize, MatchKind)> = Vec::new();
    let push = |i: usize, kind: MatchKind, found: &mut Vec<(usize, MatchKind)>| {
        if !claimed.contains(&i) && !found.iter().any(|(j, _)| *j == i) {
            found.push((i, kind));
        }
    };

    for alias in rule.aliases {
        if let Some(i) = headers.iter().position(|h| h == alias) {
            push(i, MatchKind::Alias, &mut found);
        }
    }

    if rule.substring_shapes.contains(&shape) {
        for fragment in rule.substrings {
            for (i, header) in headers.iter().enumerate() {
                if header.to_lowercase().contains(fragment) {
                    push(i, MatchKind::Substring, &mut found);
                }
            }
        }
    }

    found
}

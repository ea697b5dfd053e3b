//! Difficulty scoring over the stock difficulty file.

use trendscope_common::TrendError;
use trendscope_ranker::{load_difficulty, score, Dimension, Metric, WeightVector};
use trendscope_test_utils::{approx_eq, assert_eq, FixtureDir, DIFFICULTY_CSV};

fn scored(dimensions: &[Dimension]) -> trendscope_ranker::ScoredDifficultyTable {
    let fixtures = FixtureDir::new().unwrap();
    let path = fixtures.write("difficulty.csv", DIFFICULTY_CSV).unwrap();
    load_difficulty(&path, dimensions, &WeightVector::default()).unwrap()
}

#[test]
fn test_composites_stay_in_unit_interval() {
    let table = scored(&Dimension::ALL);
    assert_eq!(table.len(), 4);
    for record in &table.records {
        for dimension in Dimension::ALL {
            let composite = record
                .metric_value(Metric::CompositeScore, dimension)
                .unwrap();
            assert!((0.0..=1.0).contains(&composite), "{composite}");
        }
    }
}

#[test]
fn test_industry_composites() {
    let table = scored(&[Dimension::Industry]);
    let composites: Vec<f64> = table
        .records
        .iter()
        .map(|r| r.metric_value(Metric::CompositeScore, Dimension::Industry).unwrap())
        .collect();
    let expected = [1.0, 0.0, 0.5, 0.75];
    for (got, want) in composites.iter().zip(expected) {
        assert!(approx_eq(*got, want), "got {got}, want {want}");
    }
}

#[test]
fn test_company_bar_view() {
    let table = scored(&[Dimension::Company]);
    let selection = table.select(&["AI"]).unwrap();
    let bars = selection.bar_view("AI", Dimension::Company).unwrap();
    let groups: Vec<&str> = bars.iter().map(|b| b.group.as_str()).collect();
    assert_eq!(groups, vec!["Globex", "Acme"]);
    assert!(approx_eq(bars[0].composite_score, 0.75));
}

#[test]
fn test_score_table_evidence() {
    let table = scored(&[Dimension::Industry]);
    let selection = table.select_all().unwrap();

    let composite = selection.score_table(Metric::CompositeScore, Dimension::Industry).unwrap();
    let evidence: Vec<Option<&str>> = composite.iter().map(|r| r.evidence.as_deref()).collect();
    assert_eq!(
        evidence,
        vec![Some("mature supply chain"), Some("regulatory hurdles"), None, Some("warehouse pilots")]
    );

    // No TRL_Comment_industry column: falls back to the element-level comment.
    let trl = selection.score_table(Metric::Trl, Dimension::Industry).unwrap();
    assert_eq!(trl[0].evidence.as_deref(), Some("field proven"));
    assert_eq!(trl[0].value, 9.0);
}

#[test]
fn test_empty_selection_is_rejected() {
    let table = scored(&[Dimension::Industry]);
    let none: Vec<String> = Vec::new();
    let err = table.select(&none).unwrap_err();
    assert!(matches!(err, TrendError::EmptySelection));
}

#[test]
fn test_missing_dimension_columns() {
    let fixtures = FixtureDir::new().unwrap();
    let path = fixtures
        .write(
            "difficulty.csv",
            "technology,industry,TRL_tech,Technical_Feasibility_tech,Social_Feasibility_tech,TRL_industry,Technical_Feasibility_industry,Social_Feasibility_industry\nAI,Auto,5,3,3,5,3,3\n",
        )
        .unwrap();
    let err = load_difficulty(&path, &[Dimension::Company], &WeightVector::default()).unwrap_err();
    assert!(err.to_string().contains("company"));
    assert!(matches!(err, TrendError::MissingDimensionColumns { .. }));
}

#[test]
fn test_scored_table_serialises() {
    let raw = trendscope_ingestion::RawTable::from_csv(DIFFICULTY_CSV).unwrap();
    let table = score(&raw, &WeightVector::default()).unwrap();
    let json = serde_json::to_value(&table.records[0]).unwrap();
    assert_eq!(json["technical_element"], "AI");
    assert_eq!(json["dimensions"]["industry"]["group"], "Automotive");
}

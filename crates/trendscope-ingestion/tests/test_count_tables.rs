//! Count tables loaded from CSV files on disk.

use std::sync::Arc;

use trendscope_common::TrendError;
use trendscope_ingestion::normalise::rules::CanonicalColumn;
use trendscope_ingestion::{derive, normalize, ExpectedShape, Measure, Overlay, RawTable, TableCache};
use trendscope_test_utils::{assert_eq, FixtureDir, COMPANY_CSV, COUNTRY_CSV, MONTHLY_CSV};

#[test]
fn test_monthly_file_cumulative_matches_partition_sum() {
    let fixtures = FixtureDir::new().unwrap();
    let path = fixtures.write("monthly.csv", MONTHLY_CSV).unwrap();

    let raw = RawTable::from_path(&path).unwrap();
    let table = normalize(&raw, ExpectedShape::Monthly).unwrap();
    let derived = derive(&table);

    for series in derived.series() {
        let sum: u64 = series.points.iter().map(|p| p.count).sum();
        assert_eq!(series.total(), sum, "series {}", series.key);
        let mut previous = 0;
        for point in &series.points {
            assert!(point.cumulative_count >= previous);
            previous = point.cumulative_count;
        }
    }

    let ai: Vec<u64> = derived
        .records
        .iter()
        .filter(|r| r.record.technical_element == "AI")
        .map(|r| r.cumulative_count)
        .collect();
    assert_eq!(ai, vec![10, 15, 21]);
}

#[test]
fn test_country_file_per_element_view() {
    let raw = RawTable::from_csv(COUNTRY_CSV).unwrap();
    let table = normalize(&raw, ExpectedShape::Grouped).unwrap();

    assert_eq!(table.mapping.source_of(CanonicalColumn::GroupKey), Some("Country"));
    assert_eq!(table.technical_elements(), vec!["AI", "Robotics"]);

    let ai = table.filter_technical_element("AI");
    let series = derive(&ai).series();
    let keys: Vec<&str> = series.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["JP", "US"]);

    // JP: 2023-01, 2023-02, then the unparseable row last.
    let jp = &series[0];
    assert_eq!(jp.points.len(), 3);
    assert!(jp.points[2].timestamp.is_none());
    assert_eq!(jp.total(), 6);

    let us = &series[1];
    let markers = us.markers(Measure::Count, Overlay::default());
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].value, Some(4.0));
}

#[test]
fn test_company_file_blank_moving_average() {
    let raw = RawTable::from_csv(COMPANY_CSV).unwrap();
    let table = normalize(&raw, ExpectedShape::Grouped).unwrap();
    let derived = derive(&table);

    let acme: Vec<Option<f64>> = derived
        .records
        .iter()
        .filter(|r| r.record.group_key.as_deref() == Some("Acme"))
        .map(|r| r.cumulative_moving_average)
        .collect();
    assert_eq!(acme, vec![None, Some(1.5)]);
}

#[test]
fn test_monthly_shape_rejects_file_without_items() {
    let raw = RawTable::from_csv("year_month,category,ma_6,conversion_flag\n2023-01,AI,1.0,False\n").unwrap();
    let err = normalize(&raw, ExpectedShape::Monthly).unwrap_err();
    assert!(matches!(err, TrendError::Schema { ref concept, .. } if concept == "item count"));
    assert!(err.to_string().contains("year_month"));
}

#[test]
fn test_cache_serves_stale_contents_until_invalidated() {
    let fixtures = FixtureDir::new().unwrap();
    let path = fixtures.write("monthly.csv", MONTHLY_CSV).unwrap();
    let mut cache = TableCache::new();

    let first = cache.get_or_load(&path, ExpectedShape::Monthly).unwrap();
    assert_eq!(first.len(), 5);

    fixtures
        .write("monthly.csv", "year_month,category,items,ma_6,conversion_flag\n2024-01,AI,1,1.0,False\n")
        .unwrap();

    let second = cache.get_or_load(&path, ExpectedShape::Monthly).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    cache.invalidate(&path, ExpectedShape::Monthly);
    let third = cache.get_or_load(&path, ExpectedShape::Monthly).unwrap();
    assert_eq!(third.len(), 1);
}

//! Integration tests for chart aggregation
//!
//! records → samples → buckets (quantiles, derived anxiety) → recency alpha

use chrono::{Duration, TimeZone, Utc};
use moodvoice::core::{bucketize, recency_alpha};
use moodvoice::types::{AnxietyEstimate, Granularity, MoodRecord, MoodSample};
use moodvoice::{ANXIETY_PLACEHOLDER, RECENCY_ALPHA_MIN};
use pretty_assertions::assert_eq;

fn record_at(mood: u8, energy: u8, anxiety: u8, day: u32, hour: u32) -> MoodSample {
    let mut record = MoodRecord::manual(mood, energy, anxiety, "");
    record.created_at = Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap();
    MoodSample::from(&record)
}

#[test]
fn test_week_of_records() {
    let samples = vec![
        record_at(20, 3, 5, 2, 9),
        record_at(25, 4, 5, 2, 20),
        record_at(70, 6, 3, 4, 8),
        record_at(80, 7, 2, 4, 19),
    ];
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    let end = start + Duration::days(7);
    let buckets = bucketize(&samples, Granularity::Day, start, end);

    assert_eq!(buckets.len(), 7);
    assert_eq!(
        buckets.iter().map(|b| b.count).collect::<Vec<_>>(),
        vec![2, 0, 2, 0, 0, 0, 0]
    );

    // Monday: anxiety never reported, back-filled from low mood
    let monday = &buckets[0];
    assert_eq!(monday.mood.unwrap().p50, 22.5);
    match monday.anxiety.unwrap() {
        AnxietyEstimate::Derived { value, basis } => {
            assert!(value > ANXIETY_PLACEHOLDER);
            assert_eq!(basis.mood_p50, 22.5);
        }
        other => panic!("expected derived anxiety, got {:?}", other),
    }

    // Tuesday is explicitly empty
    assert!(buckets[1].is_empty());
    assert!(buckets[1].mood.is_none() && buckets[1].anxiety.is_none());

    // Wednesday: reported anxiety stays raw
    let wednesday = buckets[2].anxiety.unwrap();
    assert!(!wednesday.is_derived());
    assert_eq!(wednesday.center(), 2.5);
}

#[test]
fn test_hour_buckets_respect_range() {
    let samples = vec![record_at(50, 5, 4, 1, 9), record_at(60, 6, 4, 1, 11)];
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let buckets = bucketize(&samples, Granularity::Hour, start, end);

    let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["2026-03-01 09:00", "2026-03-01 10:00", "2026-03-01 11:00"]);
    // 09:00 sample sits before the range start
    assert_eq!(buckets[0].count, 0);
    assert_eq!(buckets[2].count, 1);
}

#[test]
fn test_bucket_json_tags_provenance() {
    let samples = vec![record_at(20, 3, 5, 2, 9)];
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    let buckets = bucketize(&samples, Granularity::Day, start, start + Duration::days(1));
    let json = serde_json::to_value(&buckets[0]).unwrap();
    assert_eq!(json["anxiety"]["kind"], "derived");
    assert_eq!(json["anxiety"]["basis"]["rule"], "low_mood");
}

#[test]
fn test_recency_alpha_orders_samples() {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);
    let alphas: Vec<f64> = [0, 10, 20, 30]
        .iter()
        .map(|d| recency_alpha(start + Duration::days(*d), start, end))
        .collect();
    assert_eq!(alphas[0], RECENCY_ALPHA_MIN);
    assert_eq!(alphas[3], 1.0);
    assert!(alphas.windows(2).all(|w| w[0] < w[1]));
}

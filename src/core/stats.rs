//! Chart aggregation: quantiles, derived-anxiety fallback, recency alpha

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};

use crate::types::{
    AggregateBucket, AnxietyEstimate, DerivationRule, DerivedBasis, Granularity, MetricStats,
    MoodSample,
};
use crate::{ANXIETY_PLACEHOLDER, RECENCY_ALPHA_MIN};

/// Upper bound on buckets per request
pub const MAX_BUCKETS: usize = 10_000;

/// Linear-interpolated quantile of sorted values (q in 0..=1)
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !q.is_finite() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Five-number summary; `None` when no finite values
pub fn metric_stats(values: impl IntoIterator<Item = f64>) -> Option<MetricStats> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(MetricStats {
        p25: quantile(&sorted, 0.25)?,
        p50: quantile(&sorted, 0.50)?,
        p75: quantile(&sorted, 0.75)?,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

/// Rule table for back-filling anxiety from mood (0-100) and energy (1-10)
pub fn derive_anxiety(mood_p50: f64, energy_p50: f64) -> (f64, DerivationRule) {
    if mood_p50 < 30.0 {
        if energy_p50 >= 7.0 {
            (9.0, DerivationRule::LowMoodHighEnergy)
        } else {
            (8.0, DerivationRule::LowMood)
        }
    } else if mood_p50 < 45.0 {
        (7.0, DerivationRule::BelowAverageMood)
    } else if mood_p50 >= 70.0 {
        if energy_p50 <= 4.0 {
            (5.0, DerivationRule::HighMoodLowEnergy)
        } else {
            (3.0, DerivationRule::HighMood)
        }
    } else if energy_p50 >= 8.0 {
        (6.0, DerivationRule::MidMoodHighEnergy)
    } else {
        (4.0, DerivationRule::MidMood)
    }
}

fn is_placeholder(anxiety: f64) -> bool {
    (anxiety - ANXIETY_PLACEHOLDER).abs() < 1e-9
}

/// Aggregate one bucket's samples
pub fn build_bucket(label: impl Into<String>, start: DateTime<Utc>, samples: &[&MoodSample]) -> AggregateBucket {
    let mut bucket = AggregateBucket::empty(label, start);
    if samples.is_empty() {
        return bucket;
    }
    bucket.count = samples.len();
    bucket.mood = metric_stats(samples.iter().map(|s| s.mood));
    bucket.energy = metric_stats(samples.iter().map(|s| s.energy));

    bucket.anxiety = if samples.iter().all(|s| is_placeholder(s.anxiety)) {
        match (bucket.mood, bucket.energy) {
            (Some(mood), Some(energy)) => {
                let (value, rule) = derive_anxiety(mood.p50, energy.p50);
                Some(AnxietyEstimate::Derived {
                    value,
                    basis: DerivedBasis {
                        mood_p50: mood.p50,
                        energy_p50: energy.p50,
                        rule,
                    },
                })
            }
            _ => None,
        }
    } else {
        metric_stats(samples.iter().map(|s| s.anxiety)).map(|value| AnxietyEstimate::Raw { value })
    };
    bucket
}

/// Start of the bucket containing `at`
pub fn bucket_start(at: DateTime<Utc>, granularity: Granularity) -> DateTime<Utc> {
    let date = at.date_naive();
    let naive = match granularity {
        Granularity::Hour => date.and_hms_opt(at.hour(), 0, 0),
        Granularity::Day => date.and_hms_opt(0, 0, 0),
        Granularity::Week => {
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.and_hms_opt(0, 0, 0)
        }
        Granularity::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    };
    naive.map(|n| Utc.from_utc_datetime(&n)).unwrap_or(at)
}

fn next_bucket(start: DateTime<Utc>, granularity: Granularity) -> Option<DateTime<Utc>> {
    match granularity {
        Granularity::Hour => Some(start + Duration::hours(1)),
        Granularity::Day => Some(start + Duration::days(1)),
        Granularity::Week => Some(start + Duration::weeks(1)),
        Granularity::Month => {
            let (y, m) = if start.month() == 12 { (start.year() + 1, 1) } else { (start.year(), start.month() + 1) };
            NaiveDate::from_ymd_opt(y, m, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| Utc.from_utc_datetime(&n))
        }
    }
}

pub fn bucket_label(start: DateTime<Utc>, granularity: Granularity) -> String {
    let format = match granularity {
        Granularity::Hour => "%Y-%m-%d %H:00",
        Granularity::Day => "%Y-%m-%d",
        Granularity::Week => "%G-W%V",
        Granularity::Month => "%Y-%m",
    };
    start.format(format).to_string()
}

/// Every bucket overlapping [start, end), empty ones included
pub fn bucketize(
    samples: &[MoodSample],
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<AggregateBucket> {
    let mut buckets = Vec::new();
    let mut cursor = bucket_start(start, granularity);
    while cursor < end && buckets.len() < MAX_BUCKETS {
        let next = match next_bucket(cursor, granularity) {
            Some(n) => n,
            None => break,
        };
        let members: Vec<&MoodSample> = samples
            .iter()
            .filter(|s| s.at >= cursor && s.at < next && s.at >= start && s.at < end)
            .collect();
        buckets.push(build_bucket(bucket_label(cursor, granularity), cursor, &members));
        cursor = next;
    }
    buckets
}

/// Opacity for a sample at `at` inside the visible window: oldest fades to
/// the minimum, newest is full strength.
pub fn recency_alpha(at: DateTime<Utc>, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> f64 {
    let span = (window_end - window_start).num_milliseconds();
    if span <= 0 {
        return 1.0;
    }
    let t = ((at - window_start).num_milliseconds() as f64 / span as f64).clamp(0.0, 1.0);
    RECENCY_ALPHA_MIN + (1.0 - RECENCY_ALPHA_MIN) * t
}

// =============================================================================
// TESTS
// =============================================================================

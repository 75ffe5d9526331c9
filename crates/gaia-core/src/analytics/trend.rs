//! Temporal trend classification by linear regression over sample order,
//! plus period-over-period comparison of named metrics.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::math::{linear_fit, round_to};

/// |slope| below this is classified as stable (index units per sample).
pub const STABLE_SLOPE: f64 = 0.01;

/// One observation in a time series. `D` is any ordered date-like key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSample<D> {
    pub date: D,
    pub value: f64,
}

impl<D> From<(D, f64)> for TrendSample<D> {
    fn from((date, value): (D, f64)) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    InsufficientData,
    Stable,
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

impl Confidence {
    /// high if |r| > 0.7, moderate if |r| > 0.4, else low.
    pub fn from_correlation(r: f64) -> Self {
        let r = r.abs();
        if r > 0.7 {
            Confidence::High
        } else if r > 0.4 {
            Confidence::Moderate
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub trend: Trend,
    /// (last − first) / |first| · 100, rounded to 2 decimals; 0 when first == 0.
    pub change_percent: f64,
    /// Value units per sample step, rounded to 4 decimals.
    pub slope: f64,
    /// Rounded to 3 decimals.
    pub r_squared: f64,
    pub confidence: Confidence,
}

impl TrendReport {
    fn insufficient() -> Self {
        Self {
            trend: Trend::InsufficientData,
            change_percent: 0.0,
            slope: 0.0,
            r_squared: 0.0,
            confidence: Confidence::Low,
        }
    }
}

/// Classify the trend of a time series.
///
/// Samples are sorted ascending by date (stable, so equal dates keep input
/// order) and regressed against their ordinal position 0..n−1, so uneven
/// sampling intervals are not weighted.
pub fn analyze_temporal_trends<D: Ord + Clone>(samples: &[TrendSample<D>]) -> TrendReport {
    if samples.len() < 2 {
        debug!(available = samples.len(), "trend analysis skipped: too few samples");
        return TrendReport::insufficient();
    }

    let mut sorted: Vec<&TrendSample<D>> = samples.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let ys: Vec<f64> = sorted.iter().map(|s| s.value).collect();
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();

    let Some(fit) = linear_fit(&xs, &ys) else {
        return TrendReport::insufficient();
    };

    let trend = if fit.slope.abs() < STABLE_SLOPE {
        Trend::Stable
    } else if fit.slope > 0.0 {
        Trend::Increasing
    } else {
        Trend::Decreasing
    };

    let first = ys[0];
    let last = ys[ys.len() - 1];
    let change_percent = if first != 0.0 {
        (last - first) / first.abs() * 100.0
    } else {
        0.0
    };

    TrendReport {
        trend,
        change_percent: round_to(change_percent, 2),
        slope: round_to(fit.slope, 4),
        r_squared: round_to(fit.r * fit.r, 3),
        confidence: Confidence::from_correlation(fit.r),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

/// Change of one metric between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    /// Rounded to 2 decimals; 0 when `previous` is 0.
    pub change_percent: f64,
    pub direction: Direction,
}

/// Compare every metric present in both periods. Keys only in one period
/// are skipped.
pub fn compare_periods(
    current: &BTreeMap<String, f64>,
    previous: &BTreeMap<String, f64>,
) -> BTreeMap<String, PeriodChange> {
    current
        .iter()
        .filter_map(|(key, &cur)| {
            let prev = *previous.get(key)?;
            let change_percent = if prev != 0.0 {
                (cur - prev) / prev.abs() * 100.0
            } else {
                0.0
            };
            let direction = if cur > prev {
                Direction::Up
            } else if cur < prev {
                Direction::Down
            } else {
                Direction::Stable
            };
            Some((
                key.clone(),
                PeriodChange {
                    current: cur,
                    previous: prev,
                    change: cur - prev,
                    change_percent: round_to(change_percent, 2),
                    direction,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(points: &[(i32, f64)]) -> Vec<TrendSample<i32>> {
        points.iter().copied().map(TrendSample::from).collect()
    }

    #[test]
    fn linear_increase() {
        let r = analyze_temporal_trends(&series(&[(1, 10.0), (2, 20.0), (3, 30.0)]));
        assert_eq!(r.trend, Trend::Increasing);
        assert_eq!(r.slope, 10.0);
        assert_eq!(r.change_percent, 200.0);
        assert_eq!(r.r_squared, 1.0);
        assert_eq!(r.confidence, Confidence::High);
    }

    #[test]
    fn single_point_is_insufficient() {
        let r = analyze_temporal_trends(&series(&[(1, 10.0)]));
        assert_eq!(r.trend, Trend::InsufficientData);
        assert_eq!(r.slope, 0.0);
        assert_eq!(r.change_percent, 0.0);
    }

    #[test]
    fn constant_series_is_stable() {
        let r = analyze_temporal_trends(&series(&[(1, 5.0), (2, 5.0), (3, 5.0)]));
        assert_eq!(r.trend, Trend::Stable);
        assert_abs_diff_eq!(r.slope, 0.0, epsilon = 1e-12);
        assert_eq!(r.change_percent, 0.0);
        assert_eq!(r.confidence, Confidence::Low);
    }

    #[test]
    fn samples_are_sorted_by_date_first() {
        let r = analyze_temporal_trends(&series(&[(3, 0.2), (1, 0.8), (2, 0.5)]));
        assert_eq!(r.trend, Trend::Decreasing);
        assert_abs_diff_eq!(r.slope, -0.3, epsilon = 1e-9);
        assert_eq!(r.change_percent, -75.0);
    }

    #[test]
    fn zero_first_value_guards_change_percent() {
        let r = analyze_temporal_trends(&series(&[(1, 0.0), (2, 1.0)]));
        assert_eq!(r.trend, Trend::Increasing);
        assert_eq!(r.change_percent, 0.0);
    }

    #[test]
    fn string_dates_sort_lexicographically() {
        let samples = vec![
            TrendSample { date: "2024-03-01".to_string(), value: 0.30 },
            TrendSample { date: "2024-01-01".to_string(), value: 0.60 },
            TrendSample { date: "2024-02-01".to_string(), value: 0.45 },
        ];
        assert_eq!(analyze_temporal_trends(&samples).trend, Trend::Decreasing);
    }

    #[test]
    fn period_comparison_skips_unshared_keys() {
        let current = BTreeMap::from([
            ("ndvi".to_string(), 0.6),
            ("rain".to_string(), 0.0),
            ("only_now".to_string(), 1.0),
        ]);
        let previous = BTreeMap::from([("ndvi".to_string(), 0.5), ("rain".to_string(), 0.0)]);
        let changes = compare_periods(&current, &previous);
        assert_eq!(changes.len(), 2);
        let ndvi = changes["ndvi"];
        assert_eq!(ndvi.direction, Direction::Up);
        assert_eq!(ndvi.change_percent, 20.0);
        assert_eq!(changes["rain"].direction, Direction::Stable);
        assert_eq!(changes["rain"].change_percent, 0.0);
    }
}

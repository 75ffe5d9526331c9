//! Threshold alerts over composite scores and the index trend.
use serde::{Deserialize, Serialize};

use super::composite::CompositeScoreSet;
use super::trend::{Trend, TrendReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    WaterStress,
    VegetationHealth,
    EnvironmentalRisk,
    Productivity,
    DecliningHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    pub kind: AlertKind,
    pub message: String,
    pub action_required: bool,
}

const WATER_STRESS_CRITICAL: f64 = 70.0;
const VEGETATION_HEALTH_CRITICAL: f64 = 30.0;
const ENVIRONMENTAL_RISK_HIGH: f64 = 70.0;
const PRODUCTIVITY_LOW: f64 = 40.0;
/// Percent decline over the series that raises a declining-health alert.
const DECLINE_PERCENT: f64 = 10.0;

/// Raise alerts for scores past their critical thresholds and for a
/// decreasing index trend that lost more than 10% over the series.
pub fn detect_alerts(scores: &CompositeScoreSet, trend: Option<&TrendReport>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if scores.water_stress > WATER_STRESS_CRITICAL {
        alerts.push(Alert {
            severity: Severity::High,
            kind: AlertKind::WaterStress,
            message: format!("Critical water stress detected ({}/100)", scores.water_stress),
            action_required: true,
        });
    }
    if scores.vegetation_health < VEGETATION_HEALTH_CRITICAL {
        alerts.push(Alert {
            severity: Severity::High,
            kind: AlertKind::VegetationHealth,
            message: format!("Very low vegetation health ({}/100)", scores.vegetation_health),
            action_required: true,
        });
    }
    if scores.environmental_risk > ENVIRONMENTAL_RISK_HIGH {
        alerts.push(Alert {
            severity: Severity::Medium,
            kind: AlertKind::EnvironmentalRisk,
            message: format!("High environmental risk ({}/100)", scores.environmental_risk),
            action_required: true,
        });
    }
    if scores.productivity < PRODUCTIVITY_LOW {
        alerts.push(Alert {
            severity: Severity::Medium,
            kind: AlertKind::Productivity,
            message: format!("Low expected productivity ({}/100)", scores.productivity),
            action_required: false,
        });
    }

    if let Some(t) = trend {
        if t.trend == Trend::Decreasing && t.change_percent.abs() > DECLINE_PERCENT {
            alerts.push(Alert {
                severity: Severity::Medium,
                kind: AlertKind::DecliningHealth,
                message: format!("Index declining by {}%", t.change_percent.abs()),
                action_required: false,
            });
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::composite::{calculate_composite_scores, RawIndexSet};
    use crate::analytics::trend::Confidence;

    #[test]
    fn baseline_scores_raise_nothing() {
        let scores = calculate_composite_scores(&RawIndexSet::default());
        assert!(detect_alerts(&scores, None).is_empty());
    }

    #[test]
    fn stressed_parcel_raises_expected_alerts() {
        let scores = CompositeScoreSet {
            vegetation_health: 22.0,
            water_stress: 81.5,
            productivity: 30.0,
            environmental_risk: 65.0,
            sustainability: 25.0,
        };
        let trend = TrendReport {
            trend: Trend::Decreasing,
            change_percent: -18.4,
            slope: -0.05,
            r_squared: 0.9,
            confidence: Confidence::High,
        };
        let kinds: Vec<AlertKind> = detect_alerts(&scores, Some(&trend)).into_iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::WaterStress, AlertKind::VegetationHealth, AlertKind::Productivity, AlertKind::DecliningHealth]
        );
    }
}

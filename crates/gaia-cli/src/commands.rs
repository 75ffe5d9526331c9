use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gaia_core::analytics::composite::{interpret_score, ScoreBand};
use gaia_core::analytics::{
    analyze_statistics, analyze_temporal_trends, calculate_composite_scores, detect_alerts, detect_spatial_anomalies,
    segment_homogeneous_zones, Alert, AnomalyReport, CompositeScoreSet, RawIndexSet, StatisticalSummary, TrendReport,
    TrendSample, ZoneSegmentation,
};
use gaia_core::terroir::{FieldData, MultiSourceObservation, ReferenceDatabase, TerroirAudit, TerroirEngine};
use gaia_core::{null_as_nan_vec, EngineConfig, IndexRaster};

use crate::cli::{AuditArgs, InputArgs, ParcelArgs, ScoresArgs, ZonesArgs};

// ── IO helpers ────────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A flat JSON array of pixel values; `null` = no data.
#[derive(Deserialize)]
struct Values(#[serde(deserialize_with = "null_as_nan_vec")] Vec<f64>);

fn read_series(path: &Path) -> Result<Vec<TrendSample<NaiveDate>>> {
    read_json(path)
}

/// Shared state built from the global flags.
pub struct Session {
    pub config: EngineConfig,
    pub references: Option<ReferenceDatabase>,
}

impl Session {
    pub fn load(config: Option<&Path>, references: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(p) => EngineConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
            None => EngineConfig::default(),
        };
        let references = references
            .map(|p| ReferenceDatabase::load(p).with_context(|| format!("loading references {}", p.display())))
            .transpose()?;
        if let Some(db) = &references {
            if db.is_empty() {
                warn!("reference file has no entries; matching will return nothing");
            } else {
                info!(references = db.len(), "reference database loaded");
            }
        }
        Ok(Self { config, references })
    }

    fn engine(&self) -> TerroirEngine<'_> {
        let db = self.references.as_ref().unwrap_or_else(|| ReferenceDatabase::builtin());
        TerroirEngine::new(db, self.config.clone())
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ScoresOutput {
    scores: CompositeScoreSet,
    bands: ScoreBands,
    trend: Option<TrendReport>,
    alerts: Vec<Alert>,
}

#[derive(Serialize)]
struct ScoreBands {
    vegetation_health: ScoreBand,
    productivity: ScoreBand,
    sustainability: ScoreBand,
}

fn score_report(raw: &RawIndexSet, trend: Option<TrendReport>) -> ScoresOutput {
    let scores = calculate_composite_scores(raw);
    let alerts = detect_alerts(&scores, trend.as_ref());
    ScoresOutput {
        bands: ScoreBands {
            vegetation_health: interpret_score(scores.vegetation_health),
            productivity: interpret_score(scores.productivity),
            sustainability: interpret_score(scores.sustainability),
        },
        scores,
        trend,
        alerts,
    }
}

pub fn scores(_session: &Session, args: ScoresArgs) -> Result<()> {
    let raw: RawIndexSet = read_json(&args.input)?;
    let trend = args
        .trend
        .as_deref()
        .map(|p| read_series(p).map(|s| analyze_temporal_trends(&s)))
        .transpose()?;
    let out = score_report(&raw, trend);
    info!(alerts = out.alerts.len(), sustainability = out.scores.sustainability, "scores computed");
    emit(&out)
}

#[derive(Serialize)]
struct StatsOutput {
    statistics: StatisticalSummary,
    anomalies: AnomalyReport,
}

fn stats_report(session: &Session, values: &[f64]) -> Result<StatsOutput> {
    Ok(StatsOutput {
        statistics: analyze_statistics(values),
        anomalies: detect_spatial_anomalies(values, session.config.anomaly_threshold)?,
    })
}

pub fn stats(session: &Session, args: InputArgs) -> Result<()> {
    let Values(values) = read_json(&args.input)?;
    let out = stats_report(session, &values)?;
    info!(
        samples = values.len(),
        sufficient = out.anomalies.status.is_sufficient(),
        anomalies = out.anomalies.anomaly_count,
        "statistics computed"
    );
    emit(&out)
}

pub fn trend(_session: &Session, args: InputArgs) -> Result<()> {
    let series = read_series(&args.input)?;
    let report = analyze_temporal_trends(&series);
    info!(samples = series.len(), trend = ?report.trend, "trend analysed");
    emit(&report)
}

fn zone_report(session: &Session, raster: &IndexRaster, n_zones: Option<usize>) -> Result<ZoneSegmentation> {
    let n_zones = n_zones.unwrap_or(session.config.n_zones);
    let clustering = &session.config.clustering;
    Ok(segment_homogeneous_zones(raster, n_zones, &clustering.kmeans(), clustering.seed)?)
}

pub fn zones(session: &Session, args: ZonesArgs) -> Result<()> {
    let raster: IndexRaster = read_json(&args.input)?;
    let seg = zone_report(session, &raster, args.n_zones)?;
    info!(
        sufficient = seg.status.is_sufficient(),
        zones = seg.zones.len(),
        pixels = seg.total_pixels,
        "zones segmented"
    );
    emit(&seg)
}

fn read_parcel(args: &ParcelArgs) -> Result<(MultiSourceObservation, Option<FieldData>)> {
    let obs: MultiSourceObservation = read_json(&args.input)?;
    let field = args.field.as_deref().map(read_json::<FieldData>).transpose()?;
    Ok((obs, field))
}

pub fn fingerprint(session: &Session, args: ParcelArgs) -> Result<()> {
    let (obs, field) = read_parcel(&args)?;
    let fp = session.engine().create_terroir_fingerprint(&obs, field.as_ref());
    emit(&serde_json::json!({
        "fingerprint": fp,
        "vector": fp.to_vector().to_vec(),
    }))
}

pub fn matches(session: &Session, args: ParcelArgs) -> Result<()> {
    let (obs, field) = read_parcel(&args)?;
    let mut engine = session.engine();
    let fp = engine.create_terroir_fingerprint(&obs, field.as_ref());
    let matches = engine.find_matching_terroir(&fp);
    info!(references = matches.len(), "matching done");
    emit(&matches)
}

/// Full audit; an explicit benchmark replaces the best-match gap report.
fn audit_report(
    session: &Session,
    obs: &MultiSourceObservation,
    field: Option<&FieldData>,
    benchmark: Option<&str>,
) -> Result<TerroirAudit> {
    let mut engine = session.engine();
    let mut audit = engine.audit(obs, field)?;
    if let Some(id) = benchmark {
        audit.gaps = Some(engine.detect_critical_gaps(&audit.fingerprint, id)?);
    }
    Ok(audit)
}

pub fn audit(session: &Session, args: AuditArgs) -> Result<()> {
    let (obs, field) = read_parcel(&args.parcel)?;
    let audit = audit_report(session, &obs, field.as_ref(), args.benchmark.as_deref())?;
    info!(
        best = audit.matches.first().map(|m| m.id.as_str()).unwrap_or("-"),
        gaps = audit.gaps.as_ref().map_or(0, |g| g.gaps.len()),
        "audit done"
    );
    emit(&audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaia_core::analytics::Sufficiency;
    use gaia_core::terroir::gaps::{BenchmarkResolution, FallbackPolicy};
    use gaia_core::terroir::matcher::VarianceConfig;

    fn session() -> Session {
        let config = EngineConfig {
            variance: VarianceConfig::Off,
            ..EngineConfig::default()
        };
        Session { config, references: None }
    }

    fn parcel() -> (MultiSourceObservation, FieldData) {
        let obs: MultiSourceObservation = serde_json::from_str(
            r#"{"topography": {"elevation": 265.0, "slope": 4.2, "aspect": 135.0}}"#,
        )
        .unwrap();
        let mut field = FieldData::default();
        field.physical.clay_percent = Some(33.0);
        field.chemical.ph_h2o = Some(6.0);
        (obs, field)
    }

    #[test]
    fn values_accept_nulls() {
        let Values(v) = serde_json::from_str("[0.2, null, 0.4]").unwrap();
        assert_eq!(v.len(), 3);
        assert!(v[1].is_nan());
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = read_json::<RawIndexSet>(Path::new("/nonexistent/raw.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/raw.json"));
    }

    #[test]
    fn stats_skip_null_pixels() {
        let Values(v) = serde_json::from_str("[0.5, null, 0.5, 0.5]").unwrap();
        let out = stats_report(&session(), &v).unwrap();
        assert_eq!(out.anomalies.status, Sufficiency::Sufficient);
        assert_eq!(out.anomalies.anomaly_count, 0);
    }

    #[test]
    fn zone_count_override_wins_over_config() {
        let raster: IndexRaster = serde_json::from_str(r#"{"data":[0.1,0.9],"width":2,"height":1}"#).unwrap();
        let seg = zone_report(&session(), &raster, Some(2)).unwrap();
        assert_eq!(seg.n_zones, 2);
        assert_eq!(seg.zones.len(), 2);
    }

    #[test]
    fn empty_index_set_scores_with_bands() {
        let out = score_report(&RawIndexSet::default(), None);
        assert_eq!(out.bands.sustainability, interpret_score(out.scores.sustainability));
        assert!(out.trend.is_none());
    }

    #[test]
    fn audit_uses_best_match_without_benchmark() {
        let (obs, field) = parcel();
        let audit = audit_report(&session(), &obs, Some(&field), None).unwrap();
        let gaps = audit.gaps.unwrap();
        assert_eq!(gaps.benchmark, BenchmarkResolution::Found { id: "vosne_romanee_grand_cru".into() });
        assert_eq!(gaps.gaps[0].recommendation, "Liming");
    }

    #[test]
    fn audit_benchmark_override_replaces_gaps() {
        let (obs, field) = parcel();
        let audit = audit_report(&session(), &obs, Some(&field), Some("pauillac_premier_cru")).unwrap();
        assert_eq!(audit.matches[0].id, "vosne_romanee_grand_cru");
        let gaps = audit.gaps.unwrap();
        assert_eq!(gaps.benchmark, BenchmarkResolution::Found { id: "pauillac_premier_cru".into() });
    }

    #[test]
    fn unknown_benchmark_override_falls_back_or_fails() {
        let (obs, field) = parcel();
        let audit = audit_report(&session(), &obs, Some(&field), Some("nowhere")).unwrap();
        assert!(audit.gaps.unwrap().benchmark.is_fallback());

        let mut strict = session();
        strict.config.benchmark_fallback = FallbackPolicy::Strict;
        assert!(audit_report(&strict, &obs, Some(&field), Some("nowhere")).is_err());
    }
}

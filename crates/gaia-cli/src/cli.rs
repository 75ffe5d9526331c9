use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gaia", about = "Offline runner for the area analytics and terroir-matching core")]
pub struct Cli {
    /// Engine configuration JSON. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference terroir database JSON. The built-in set is used when omitted.
    #[arg(short, long, global = true)]
    pub references: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Composite scores, score bands and alerts from a raw index set.
    Scores(ScoresArgs),
    /// Descriptive statistics and z-score anomalies over a JSON array of values.
    Stats(InputArgs),
    /// Trend classification of a dated series.
    Trend(InputArgs),
    /// Zone segmentation of an index raster.
    Zones(ZonesArgs),
    /// Build the fingerprint vector of a parcel.
    Fingerprint(ParcelArgs),
    /// Rank reference terroirs against a parcel.
    Match(ParcelArgs),
    /// Fingerprint, match and gap analysis in one pass.
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Input JSON file.
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ScoresArgs {
    /// RawIndexSet JSON file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Optional dated series whose trend feeds the alert rules.
    #[arg(short, long)]
    pub trend: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ZonesArgs {
    /// IndexRaster JSON file (`data`, `width`, `height`; null = no data).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Override the configured zone count.
    #[arg(short = 'k', long)]
    pub n_zones: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ParcelArgs {
    /// Multi-source observation JSON file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Field soil data JSON file. The default template is used when omitted.
    #[arg(short, long)]
    pub field: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    pub parcel: ParcelArgs,

    /// Benchmark id for the gap analysis. Defaults to the best match.
    #[arg(short, long)]
    pub benchmark: Option<String>,
}

use anyhow::Result;
use clap::Parser;
use demandnorm::{normalize, supply::SupplyIndex, workbook};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Normalize a demand-forecast workbook: fold small per-period values into the \
             next period, round demand up to multiples of ten, and keep rows whose raw \
             demand already exceeds the available supply"
)]
struct Args {
    /// Input workbook (.xlsx)
    input: PathBuf,
    /// Output path; defaults to `<input stem>_output_<NNNN>.xlsx` beside the input
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).init();

    let args = Args::parse();
    anyhow::ensure!(
        args.input.is_file(),
        "input file {} does not exist",
        args.input.display()
    );

    // ─── 2) read workbook ────────────────────────────────────────────
    let input = workbook::read::read_workbook(&args.input)?;
    info!(
        rows = input.demand.rows.len(),
        periods = input.demand.period_count(),
        "demand table loaded"
    );

    // ─── 3) build supply index ───────────────────────────────────────
    let index = SupplyIndex::build(&input.supply_records);
    info!(items = index.len(), "supply index built");

    // ─── 4) normalize ────────────────────────────────────────────────
    let normalized = normalize::normalize_table(&input.demand, &index);

    // ─── 5) write output ─────────────────────────────────────────────
    let out_path = args
        .output
        .unwrap_or_else(|| workbook::write::default_output_path(&args.input));
    let written = workbook::write::write_workbook(&input, &normalized, &out_path)?;
    info!(path = %written.display(), "processing complete");
    Ok(())
}

#![deny(unsafe_code)]
mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use env_logger::Env;
use log::info;

use abfreq_lib::aggregate::{
    FULL_RESULTS_FILENAME, RESULTS_FILENAME, ResultAggregator, discover_shards, write_full_results,
};
use abfreq_lib::logging::{OperationTimer, format_count};
use abfreq_lib::query::QueryParams;
use abfreq_lib::validation::{prepare_output_dir, validate_database_dir};

/// Custom styles for CLI help output
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Search antibody repertoire shards for gene-segment, length and motif
/// matches.
#[derive(Parser, Debug)]
#[command(name = "abfreq", version, styles = STYLES)]
#[command(
    about = "Search antibody repertoire shards and summarize hit frequencies per subject",
    long_about = r#"
Search a directory of per-subject repertoire shards (*.csv.gz) for rows
matching an IGHV/IGHD/IGHJ, CDRH3-length and H3-motif query.

Gene patterns accept pipe-separated alternatives: "3-20|3-22" matches
either segment, and a segment without a hyphen selects the whole family
("3" means "3-"). J segments are given without the leading J ("4|5").
The motif uses a small wildcard grammar: "." matches one residue, ".*"
matches any run, anything else is literal, e.g. "YY.D.*G".

Writes results.csv (per-subject hits, totals and derived rates) to the
output directory, and fullresults.csv (every matching row, annotated with
its source subject) when --full-results is 1.

Example usage:
  abfreq --ighv "3-20|3-22" --cdrh3-length 14 --h3-motif "YY.D.*G" \
      --database repertoires/ --outputdir results/ --overwrite 1
"#
)]
struct Args {
    /// IGHV pattern: "3-" or "3-22", multiple via "3-20|3-22"
    #[arg(long = "ighv", default_value = "")]
    ighv: String,

    /// IGHD pattern: "3-" or "3-22", multiple via "3-20|3-22"
    #[arg(long = "ighd", default_value = "")]
    ighd: String,

    /// IGHJ pattern: "5", multiple via "4|5"
    #[arg(long = "ighj", default_value = "")]
    ighj: String,

    /// CDRH3 length (with C-x-W, so add 2 if necessary)
    #[arg(long = "cdrh3-length")]
    cdrh3_length: Option<u32>,

    /// CDRH3 motif: "." for one residue, ".*" for a run, e.g. "YY.D.*G"
    #[arg(long = "h3-motif", default_value = "")]
    h3_motif: String,

    /// Directory holding the per-subject *.csv.gz shards
    #[arg(long = "database")]
    database: PathBuf,

    /// Output directory for results.csv and fullresults.csv
    #[arg(long = "outputdir", default_value = "output")]
    outputdir: PathBuf,

    /// Also write the full matching-row table. 1 for true, 0 for false
    #[arg(long = "full-results", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=1))]
    full_results: u8,

    /// Allow writing into an existing output directory. 1 for true, 0 for false
    #[arg(long = "overwrite", default_value_t = 0,
          value_parser = clap::value_parser!(u8).range(0..=1))]
    overwrite: u8,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Running abfreq version {}", version::VERSION.as_str());

    let params = QueryParams {
        ighv: args.ighv.clone(),
        ighd: args.ighd.clone(),
        ighj: args.ighj.clone(),
        cdrh3_length: args.cdrh3_length,
        h3_motif: args.h3_motif.clone(),
    };
    params.validate()?;
    validate_database_dir(&args.database)?;
    prepare_output_dir(&args.outputdir, args.overwrite == 1)?;

    let query = params.normalize();
    info!("Search request:");
    info!("  IGHV: {}", query.v.as_str());
    info!("  IGHD: {}", query.d.as_str());
    info!("  IGHJ: {}", query.j.as_str());
    info!("  CDRH3 length: {}", query.length_prefix);
    info!("  H3 motif: {}", query.motif.as_str());
    info!("  Database: {}", args.database.display());
    info!("  Output directory: {}", args.outputdir.display());
    info!("  Full results: {}", args.full_results == 1);
    info!("  Overwrite: {}", args.overwrite == 1);

    let timer = OperationTimer::new("Scanning repertoire shards");
    let shards = discover_shards(&args.database)?;
    info!("Found {} shards in {}", shards.len(), args.database.display());

    let aggregator = ResultAggregator::new(&query, args.full_results == 1);
    let output = aggregator.run(&shards)?;

    let results_path = args.outputdir.join(RESULTS_FILENAME);
    output.summary.write_csv(&results_path)?;
    info!("Wrote summary for {} subjects to: {}", output.summary.subjects.len(), results_path.display());

    if let Some(rows) = &output.matched_rows {
        info!("Merging full results file... (this may take a while)");
        let full_path = args.outputdir.join(FULL_RESULTS_FILENAME);
        write_full_results(&full_path, rows)?;
        info!("Wrote {} matching rows to: {}", format_count(rows.len() as u64), full_path.display());
    }

    timer.log_completion(output.rows_scanned);
    Ok(())
}

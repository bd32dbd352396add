mod input;
mod model;
mod pipeline;
mod report;
mod tracing;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::input::{InputError, InputPaths, load_input};
use crate::model::config::{
    ConfigError, DEFAULT_NUM_BINS, DEFAULT_SPECIFIC_CUTOFF, DEFAULT_THRESHOLD, JoinPolicy,
    OutputFormat, RankOrder, ReportOptions, ScorerConfig,
};
use crate::pipeline::stage3_join::JoinError;
use crate::pipeline::stage5_report::{ReportError, Stage5Input, describe_record, write_reports};
use crate::pipeline::{ScoringContext, run_scoring};
use crate::report::InputSummary;

const TOP_GENES_LOGGED: usize = 5;

#[derive(Debug, Error)]
enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("metadata join failed: {0}")]
    Join(#[from] JoinError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Parser)]
#[command(name = "kira-tissuetau", version, about = "Tissue-specificity (tau) scoring of gene x tissue expression matrices")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bin, score, join, filter and rank one expression matrix.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Gene x tissue matrix (TSV or GCT, optionally .gz)
    #[arg(long)]
    matrix: PathBuf,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Gene metadata table with id and symbol columns
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Gene ids to keep, one per line
    #[arg(long)]
    genes: Option<PathBuf>,

    /// Noise floor; values at or below it get bin 0
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Number of quantile bins per tissue
    #[arg(long, default_value_t = DEFAULT_NUM_BINS)]
    num_bins: u8,

    /// Drop genes whose maximum expression is below this value
    #[arg(long)]
    min_max_expression: Option<f64>,

    #[arg(long, value_enum, default_value_t = JoinPolicy::Drop)]
    join_policy: JoinPolicy,

    #[arg(long, value_enum, default_value_t = RankOrder::Desc)]
    order: RankOrder,

    /// Keep not-expressed and single-tissue genes (ranked last)
    #[arg(long)]
    keep_degenerate: bool,

    /// Tau at or above which a gene counts as tissue-specific in summary.json
    #[arg(long, default_value_t = DEFAULT_SPECIFIC_CUTOFF)]
    specific_cutoff: f64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,

    /// Also write the per-tissue bin matrix
    #[arg(long)]
    write_bins: bool,

    /// Gzip the table outputs
    #[arg(long)]
    gzip_output: bool,
}

impl RunArgs {
    fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            threshold: self.threshold,
            num_bins: self.num_bins,
            min_max_expression: self.min_max_expression,
            gene_subset: None,
            join_policy: self.join_policy,
            rank_order: self.order,
            keep_degenerate: self.keep_degenerate,
            specific_cutoff: self.specific_cutoff,
        }
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            format: self.format,
            write_bins: self.write_bins,
            gzip_output: self.gzip_output,
        }
    }

    fn input_paths(&self) -> InputPaths {
        InputPaths {
            matrix: self.matrix.clone(),
            meta: self.meta.clone(),
            genes: self.genes.clone(),
        }
    }
}

fn main() {
    crate::tracing::init_logging();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        crate::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), RunError> {
    match cli.command {
        Command::Run(args) => run_scoring_command(&args),
    }
}

fn run_scoring_command(args: &RunArgs) -> Result<(), RunError> {
    let mut config = args.scorer_config();
    config.validate()?;
    let options = args.report_options();
    crate::info!(
        "config: threshold={}, num_bins={}, min_max_expression={:?}, join_policy={:?}, order={:?}, keep_degenerate={}",
        config.threshold,
        config.num_bins,
        config.min_max_expression,
        config.join_policy,
        config.rank_order,
        config.keep_degenerate
    );

    let bundle = load_input(&args.input_paths())?;
    config.gene_subset = bundle.subset.clone();

    let matrix = &bundle.loaded.matrix;
    let ctx = ScoringContext {
        matrix,
        meta: bundle.meta.as_ref(),
        config: &config,
    };
    let output = run_scoring(&ctx)?;

    for record in output.records.iter().take(TOP_GENES_LOGGED) {
        crate::info!("top: {}", describe_record(record));
    }

    let paths = &bundle.paths;
    let input_summary = InputSummary {
        matrix: paths.matrix.display().to_string(),
        meta: paths.meta.as_ref().map(|p| p.display().to_string()),
        genes: paths.genes.as_ref().map(|p| p.display().to_string()),
        layout: bundle.loaded.layout.name().to_string(),
        n_genes: matrix.n_genes(),
        n_tissues: matrix.n_tissues(),
        missing_cells: bundle.loaded.missing_cells,
        gene_subset_size: bundle.subset.as_ref().map(|s| s.len()),
    };
    let report_input = Stage5Input {
        matrix,
        output: &output,
        config: &config,
        input_summary,
        tool_name: env!("CARGO_PKG_NAME").to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    write_reports(&report_input, &args.out, &options)?;

    crate::info!(
        "done: {} genes written to {}",
        output.records.len(),
        args.out.display()
    );
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;

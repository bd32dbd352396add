pub mod stage1_bin;
pub mod stage2_tau;
pub mod stage3_join;
pub mod stage4_rank;
pub mod stage5_report;

use crate::input::meta::GeneMeta;
use crate::model::config::ScorerConfig;
use crate::model::matrix::{BinMatrix, ExpressionMatrix};
use crate::model::tau::TauValue;
use stage1_bin::bin_matrix;
use stage2_tau::{TauCounts, count_taus, tau_vector};
use stage3_join::{GeneRecord, JoinError, join_metadata};
use stage4_rank::{FilterCounts, apply_filters, count_missing_subset, rank};

/// Explicit inputs of one scoring run.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub matrix: &'a ExpressionMatrix,
    pub meta: Option<&'a GeneMeta>,
    pub config: &'a ScorerConfig,
}

#[derive(Debug, Clone)]
pub struct ScoringOutput {
    pub bins: BinMatrix,
    pub taus: Vec<TauValue>,
    pub records: Vec<GeneRecord>,
    pub tau_counts: TauCounts,
    pub join_unmatched: usize,
    pub join_dropped: usize,
    pub filters: FilterCounts,
}

pub fn run_scoring(ctx: &ScoringContext<'_>) -> Result<ScoringOutput, JoinError> {
    let cfg = ctx.config;

    let bins = bin_matrix(ctx.matrix, cfg.threshold, cfg.num_bins);
    crate::info!(
        "binned: genes={}, tissues={}, num_bins={}, threshold={}",
        bins.n_genes(),
        bins.n_tissues(),
        cfg.num_bins,
        cfg.threshold
    );
    let taus = tau_vector(&bins);
    let tau_counts = count_taus(&taus);
    crate::info!(
        "tau computed: genes={}, scored={}, not_expressed={}, single_tissue={}",
        taus.len(),
        tau_counts.scored,
        tau_counts.not_expressed,
        tau_counts.single_tissue
    );

    let joined = join_metadata(ctx.matrix, &taus, ctx.meta, cfg.join_policy)?;

    let (filtered, mut filters) = apply_filters(joined.records, cfg);
    if let Some(subset) = &cfg.gene_subset {
        filters.subset_missing = count_missing_subset(subset, ctx.matrix);
        if filters.subset_missing > 0 {
            crate::warn!(
                "{} of {} requested genes are not in the matrix",
                filters.subset_missing,
                subset.len()
            );
        }
    }
    crate::info!(
        "filters: subset_excluded={}, below_min_expression={}, degenerate_excluded={}",
        filters.subset_excluded,
        filters.below_min_expression,
        filters.degenerate_excluded
    );

    let records = rank(filtered, cfg.rank_order);

    Ok(ScoringOutput {
        bins,
        taus,
        records,
        tau_counts,
        join_unmatched: joined.unmatched,
        join_dropped: joined.dropped,
        filters,
    })
}

use std::collections::HashSet;

use crate::input::meta::strip_version;
use crate::model::config::{GeneSubset, RankOrder, ScorerConfig};
use crate::model::matrix::ExpressionMatrix;
use crate::pipeline::stage3_join::GeneRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    /// Subset ids with no matching gene in the matrix.
    pub subset_missing: usize,
    pub subset_excluded: usize,
    pub below_min_expression: usize,
    pub degenerate_excluded: usize,
}

fn in_subset(subset: &GeneSubset, gene_id: &str) -> bool {
    subset.contains(gene_id) || subset.contains(strip_version(gene_id))
}

pub fn count_missing_subset(subset: &GeneSubset, matrix: &ExpressionMatrix) -> usize {
    let mut present: HashSet<&str> = HashSet::with_capacity(matrix.n_genes() * 2);
    for id in matrix.gene_ids() {
        present.insert(id.as_str());
        present.insert(strip_version(id));
    }
    subset
        .ids
        .iter()
        .filter(|id| !present.contains(id.as_str()))
        .count()
}

/// Applies gene subset, min-max-expression floor and degenerate exclusion,
/// in that order. Relative order of surviving records is preserved.
pub fn apply_filters(
    records: Vec<GeneRecord>,
    config: &ScorerConfig,
) -> (Vec<GeneRecord>, FilterCounts) {
    let mut counts = FilterCounts::default();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        if let Some(subset) = &config.gene_subset {
            if !in_subset(subset, &record.gene_id) {
                counts.subset_excluded += 1;
                continue;
            }
        }
        if let Some(floor) = config.min_max_expression {
            let passes = record.max_expression.is_some_and(|max| max >= floor);
            if !passes {
                counts.below_min_expression += 1;
                continue;
            }
        }
        if record.tau.is_degenerate() && !config.keep_degenerate {
            counts.degenerate_excluded += 1;
            continue;
        }
        kept.push(record);
    }

    (kept, counts)
}

/// Stable sort on tau; degenerate records, if any, follow every scored record
/// in their original order.
pub fn rank(records: Vec<GeneRecord>, order: RankOrder) -> Vec<GeneRecord> {
    let (mut scored, degenerate): (Vec<GeneRecord>, Vec<GeneRecord>) =
        records.into_iter().partition(|r| !r.tau.is_degenerate());

    scored.sort_by(|a, b| {
        let (ta, tb) = match (a.tau.score(), b.tau.score()) {
            (Some(ta), Some(tb)) => (ta, tb),
            _ => return std::cmp::Ordering::Equal,
        };
        match order {
            RankOrder::Desc => tb.total_cmp(&ta),
            RankOrder::Asc => ta.total_cmp(&tb),
        }
    });

    scored.extend(degenerate);
    scored
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_rank.rs"]
mod tests;

use thiserror::Error;

use crate::input::meta::GeneMeta;
use crate::model::config::JoinPolicy;
use crate::model::matrix::ExpressionMatrix;
use crate::model::tau::TauValue;

const UNMATCHED_EXAMPLES: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum JoinError {
    #[error("{count} gene ids have no metadata entry (first: {examples}); use --join-policy drop|keep to continue")]
    Unmatched { count: usize, examples: String },
}

/// One gene's result row, carried through filtering, ranking and output.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneRecord {
    pub row: usize,
    pub gene_id: String,
    pub symbol: String,
    pub tau: TauValue,
    pub max_expression: Option<f64>,
    pub max_tissue: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub records: Vec<GeneRecord>,
    pub unmatched: usize,
    pub dropped: usize,
}

/// Attaches symbols and per-gene maxima to the tau vector. Without metadata
/// every gene is kept and the symbol falls back to the matrix description.
pub fn join_metadata(
    matrix: &ExpressionMatrix,
    taus: &[TauValue],
    meta: Option<&GeneMeta>,
    policy: JoinPolicy,
) -> Result<JoinOutcome, JoinError> {
    let mut records = Vec::with_capacity(matrix.n_genes());
    let mut unmatched_ids = Vec::new();

    for (row, (gene_id, &tau)) in matrix.gene_ids().iter().zip(taus).enumerate() {
        let symbol = match meta {
            Some(meta) => match meta.symbol(gene_id) {
                Some(symbol) => Some(symbol.to_string()),
                None => {
                    unmatched_ids.push(gene_id.as_str());
                    None
                }
            },
            None => Some(matrix.description(row).unwrap_or("").to_string()),
        };

        let symbol = match (symbol, policy) {
            (Some(symbol), _) => symbol,
            (None, JoinPolicy::Keep) => String::new(),
            (None, _) => continue,
        };

        let (max_expression, max_tissue) = match matrix.row_max(row) {
            Some((tissue, value)) => (Some(value), Some(matrix.tissues()[tissue].clone())),
            None => (None, None),
        };

        records.push(GeneRecord {
            row,
            gene_id: gene_id.clone(),
            symbol,
            tau,
            max_expression,
            max_tissue,
        });
    }

    let unmatched = unmatched_ids.len();
    if unmatched > 0 {
        let examples = unmatched_ids
            .iter()
            .take(UNMATCHED_EXAMPLES)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        match policy {
            JoinPolicy::Fail => {
                return Err(JoinError::Unmatched {
                    count: unmatched,
                    examples,
                });
            }
            JoinPolicy::Drop => crate::warn!(
                "dropped {} genes without metadata (first: {})",
                unmatched,
                examples
            ),
            JoinPolicy::Keep => crate::warn!(
                "kept {} genes without metadata with empty symbol (first: {})",
                unmatched,
                examples
            ),
        }
    }

    let dropped = if policy == JoinPolicy::Drop {
        unmatched
    } else {
        0
    };

    Ok(JoinOutcome {
        records,
        unmatched,
        dropped,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_join.rs"]
mod tests;

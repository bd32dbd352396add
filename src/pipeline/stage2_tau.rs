use crate::model::matrix::BinMatrix;
use crate::model::tau::TauValue;

/// `sum(1 - b_i / max(b)) / (N - 1)` over one gene's bins.
pub fn tau(bin_row: &[u8]) -> TauValue {
    let n = bin_row.len();
    if n < 2 {
        return TauValue::SingleTissue;
    }
    let max = bin_row.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return TauValue::NotExpressed;
    }
    let max = max as f64;
    let deviation: f64 = bin_row.iter().map(|&b| 1.0 - b as f64 / max).sum();
    TauValue::Score((deviation / (n - 1) as f64).clamp(0.0, 1.0))
}

pub fn tau_vector(bins: &BinMatrix) -> Vec<TauValue> {
    (0..bins.n_genes()).map(|gene| tau(bins.row(gene))).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TauCounts {
    pub scored: usize,
    pub not_expressed: usize,
    pub single_tissue: usize,
}

pub fn count_taus(taus: &[TauValue]) -> TauCounts {
    let mut counts = TauCounts::default();
    for t in taus {
        match t {
            TauValue::Score(_) => counts.scored += 1,
            TauValue::NotExpressed => counts.not_expressed += 1,
            TauValue::SingleTissue => counts.single_tissue += 1,
        }
    }
    counts
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_tau.rs"]
mod tests;

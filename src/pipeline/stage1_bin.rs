use crate::model::matrix::{BinMatrix, ExpressionMatrix};

/// Cut points at probabilities `k / num_bins`, `k = 0..=num_bins`, over sorted
/// values using linear interpolation between order statistics
/// (`h = p * (n - 1)`). Empty input yields no cut points.
pub fn quantile_cuts(sorted: &[f64], num_bins: u8) -> Vec<f64> {
    if sorted.is_empty() {
        return Vec::new();
    }
    let n = sorted.len();
    let mut cuts = Vec::with_capacity(num_bins as usize + 1);
    for k in 0..=num_bins {
        let p = k as f64 / num_bins as f64;
        cuts.push(interpolate_sorted(sorted, p, n));
    }
    cuts
}

fn interpolate_sorted(sorted: &[f64], p: f64, n: usize) -> f64 {
    if n == 1 || p <= 0.0 {
        return sorted[0];
    }
    if p >= 1.0 {
        return sorted[n - 1];
    }
    let pos = p * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = lo + 1;
    if hi >= n {
        return sorted[n - 1];
    }
    let frac = pos - lo as f64;
    // Equal neighbours reproduce the value exactly.
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Bins one tissue column. Values strictly above `threshold` get the smallest
/// bin `k` in `1..=num_bins` with `value <= cut[k]`; everything else is 0.
pub fn quantile_bin(column: &[Option<f64>], threshold: f64, num_bins: u8) -> Vec<u8> {
    let mut above: Vec<f64> = column
        .iter()
        .filter_map(|v| *v)
        .filter(|&v| v > threshold)
        .collect();
    if above.is_empty() {
        return vec![0; column.len()];
    }
    above.sort_by(|a, b| a.total_cmp(b));
    let cuts = quantile_cuts(&above, num_bins);

    column
        .iter()
        .map(|value| match *value {
            Some(v) if v > threshold => bin_for(v, &cuts, num_bins),
            _ => 0,
        })
        .collect()
}

fn bin_for(value: f64, cuts: &[f64], num_bins: u8) -> u8 {
    cuts.iter()
        .skip(1)
        .position(|&cut| value <= cut)
        .map(|idx| (idx + 1) as u8)
        .unwrap_or(num_bins)
}

/// Bins every tissue independently.
pub fn bin_matrix(matrix: &ExpressionMatrix, threshold: f64, num_bins: u8) -> BinMatrix {
    let columns: Vec<Vec<u8>> = (0..matrix.n_tissues())
        .map(|tissue| quantile_bin(&matrix.column(tissue), threshold, num_bins))
        .collect();
    BinMatrix::from_columns(matrix.n_genes(), &columns)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_bin.rs"]
mod tests;

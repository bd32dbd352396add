use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::config::{ReportOptions, ScorerConfig};

pub mod json;

#[derive(Debug, Clone, Serialize)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub matrix: String,
    pub meta: Option<String>,
    pub genes: Option<String>,
    pub layout: String,
    pub n_genes: usize,
    pub n_tissues: usize,
    pub missing_cells: usize,
    pub gene_subset_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CountSummary {
    pub scored: usize,
    pub not_expressed: usize,
    pub single_tissue: usize,
    pub join_unmatched: usize,
    pub join_dropped: usize,
    pub subset_missing: usize,
    pub subset_excluded: usize,
    pub below_min_expression: usize,
    pub degenerate_excluded: usize,
    pub written: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TauStats {
    pub median: Option<f64>,
    pub p90: Option<f64>,
    pub specific_cutoff: f64,
    /// Written genes with tau >= cutoff, keyed by the tissue of maximum expression.
    pub specific_genes_by_tissue: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool: ToolMeta,
    pub input: InputSummary,
    pub config: ScorerConfig,
    pub report: ReportOptions,
    pub counts: CountSummary,
    pub tau: TauStats,
    pub outputs: Vec<String>,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn format_opt_f64_6(v: Option<f64>) -> String {
    v.map(format_f64_6).unwrap_or_else(|| "NA".to_string())
}

pub fn quantile_indexed(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let idx = ((n - 1) as f64 * p).ceil() as usize;
    Some(sorted[idx.min(n - 1)])
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_indexed(values, 0.5)
}

pub fn p90(values: &[f64]) -> Option<f64> {
    quantile_indexed(values, 0.90)
}

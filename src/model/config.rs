use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

/// Noise floor, 2^-5 in expression units.
pub const DEFAULT_THRESHOLD: f64 = 0.03125;
pub const DEFAULT_NUM_BINS: u8 = 10;
pub const DEFAULT_SPECIFIC_CUTOFF: f64 = 0.8;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be finite and >= 0 (got {0})")]
    Threshold(f64),
    #[error("num_bins must be >= 1")]
    NumBins,
    #[error("min_max_expression must be finite and >= 0 (got {0})")]
    MinMaxExpression(f64),
    #[error("specific_cutoff must be within [0, 1] (got {0})")]
    SpecificCutoff(f64),
}

/// What happens to genes that have no row in the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Abort the run.
    Fail,
    /// Remove them from the output and report the count.
    Drop,
    /// Keep them with an empty symbol and report the count.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Most tissue-specific first.
    Desc,
    /// Most ubiquitous first.
    Asc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Tsv,
    Csv,
}

impl OutputFormat {
    pub fn delimiter(&self) -> char {
        match self {
            OutputFormat::Tsv => '\t',
            OutputFormat::Csv => ',',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Identifiers a caller wants to keep in the ranked output.
#[derive(Debug, Clone, Default)]
pub struct GeneSubset {
    pub ids: BTreeSet<String>,
}

impl GeneSubset {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScorerConfig {
    pub threshold: f64,
    pub num_bins: u8,
    pub min_max_expression: Option<f64>,
    #[serde(skip)]
    pub gene_subset: Option<GeneSubset>,
    pub join_policy: JoinPolicy,
    pub rank_order: RankOrder,
    pub keep_degenerate: bool,
    pub specific_cutoff: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            num_bins: DEFAULT_NUM_BINS,
            min_max_expression: None,
            gene_subset: None,
            join_policy: JoinPolicy::Drop,
            rank_order: RankOrder::Desc,
            keep_degenerate: false,
            specific_cutoff: DEFAULT_SPECIFIC_CUTOFF,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if self.num_bins == 0 {
            return Err(ConfigError::NumBins);
        }
        if let Some(floor) = self.min_max_expression {
            if !floor.is_finite() || floor < 0.0 {
                return Err(ConfigError::MinMaxExpression(floor));
            }
        }
        if !(0.0..=1.0).contains(&self.specific_cutoff) {
            return Err(ConfigError::SpecificCutoff(self.specific_cutoff));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub write_bins: bool,
    pub gzip_output: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Tsv,
            write_bins: false,
            gzip_output: false,
        }
    }
}

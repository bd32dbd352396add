use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::input::reader::create_writer;
use crate::model::config::{ReportOptions, ScorerConfig};
use crate::model::matrix::ExpressionMatrix;
use crate::pipeline::ScoringOutput;
use crate::pipeline::stage3_join::GeneRecord;
use crate::report::json::render_summary_json;
use crate::report::{
    CountSummary, InputSummary, SummaryData, TauStats, ToolMeta, format_opt_f64_6, median, p90,
};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

const TAU_HEADER: [&str; 6] = [
    "gene_id",
    "symbol",
    "tau",
    "max_expression",
    "max_tissue",
    "status",
];

#[derive(Debug, Clone)]
pub struct Stage5Input<'a> {
    pub matrix: &'a ExpressionMatrix,
    pub output: &'a ScoringOutput,
    pub config: &'a ScorerConfig,
    pub input_summary: InputSummary,
    pub tool_name: String,
    pub tool_version: String,
}

pub fn write_reports(
    input: &Stage5Input<'_>,
    out_dir: &Path,
    options: &ReportOptions,
) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();

    let tau_path = out_dir.join(table_name("tau", options));
    with_writer(&tau_path, options.gzip_output, |w| {
        write_tau_table(w, &input.output.records, options.format.delimiter())
    })?;
    written.push(tau_path);

    if options.write_bins {
        let bins_path = out_dir.join(table_name("bins", options));
        with_writer(&bins_path, options.gzip_output, |w| {
            write_bin_table(w, input.matrix, input.output, options.format.delimiter())
        })?;
        written.push(bins_path);
    }

    let summary_path = out_dir.join("summary.json");
    let mut outputs: Vec<String> = written.iter().map(|p| file_name(p)).collect();
    outputs.push(file_name(&summary_path));
    let summary = build_summary(input, options, outputs);
    let json = render_summary_json(&summary)?;
    fs::write(&summary_path, json).map_err(|source| ReportError::Io {
        path: summary_path.clone(),
        source,
    })?;
    written.push(summary_path);

    for path in &written {
        crate::info!("wrote {}", path.display());
    }
    Ok(written)
}

fn table_name(stem: &str, options: &ReportOptions) -> String {
    let mut name = format!("{}.{}", stem, options.format.extension());
    if options.gzip_output {
        name.push_str(".gz");
    }
    name
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn with_writer<F>(path: &Path, gzip: bool, body: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let io_err = |source: std::io::Error| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut w = create_writer(path, gzip).map_err(io_err)?;
    body(w.as_mut()).map_err(io_err)?;
    w.flush().map_err(io_err)
}

pub fn write_tau_table(
    w: &mut dyn Write,
    records: &[GeneRecord],
    delim: char,
) -> std::io::Result<()> {
    let sep = delim.to_string();
    writeln!(w, "{}", TAU_HEADER.join(&sep))?;
    for record in records {
        let row = [
            escape_field(&record.gene_id, delim),
            escape_field(&record.symbol, delim),
            format_opt_f64_6(record.tau.score()),
            format_opt_f64_6(record.max_expression),
            escape_field(record.max_tissue.as_deref().unwrap_or("NA"), delim),
            record.tau.status().to_string(),
        ]
        .join(&sep);
        writeln!(w, "{}", row)?;
    }
    Ok(())
}

pub fn write_bin_table(
    w: &mut dyn Write,
    matrix: &ExpressionMatrix,
    output: &ScoringOutput,
    delim: char,
) -> std::io::Result<()> {
    let sep = delim.to_string();
    let mut header = vec!["gene_id".to_string()];
    header.extend(matrix.tissues().iter().map(|t| escape_field(t, delim)));
    writeln!(w, "{}", header.join(&sep))?;

    for (gene, gene_id) in matrix.gene_ids().iter().enumerate() {
        let mut row = vec![escape_field(gene_id, delim)];
        row.extend(output.bins.row(gene).iter().map(|b| b.to_string()));
        writeln!(w, "{}", row.join(&sep))?;
    }
    Ok(())
}

/// Quotes a field for CSV when it contains the delimiter, a quote or a newline.
pub fn escape_field(field: &str, delim: char) -> String {
    if delim == ',' && (field.contains(',') || field.contains('"') || field.contains('\n')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn build_summary(
    input: &Stage5Input<'_>,
    options: &ReportOptions,
    outputs: Vec<String>,
) -> SummaryData {
    let output = input.output;
    let scored: Vec<f64> = output.taus.iter().filter_map(|t| t.score()).collect();

    let cutoff = input.config.specific_cutoff;
    let mut specific: BTreeMap<String, usize> = BTreeMap::new();
    for record in &output.records {
        if let (Some(tau), Some(tissue)) = (record.tau.score(), &record.max_tissue) {
            if tau >= cutoff {
                *specific.entry(tissue.clone()).or_insert(0) += 1;
            }
        }
    }

    SummaryData {
        tool: ToolMeta {
            name: input.tool_name.clone(),
            version: input.tool_version.clone(),
        },
        input: input.input_summary.clone(),
        config: input.config.clone(),
        report: options.clone(),
        counts: CountSummary {
            scored: output.tau_counts.scored,
            not_expressed: output.tau_counts.not_expressed,
            single_tissue: output.tau_counts.single_tissue,
            join_unmatched: output.join_unmatched,
            join_dropped: output.join_dropped,
            subset_missing: output.filters.subset_missing,
            subset_excluded: output.filters.subset_excluded,
            below_min_expression: output.filters.below_min_expression,
            degenerate_excluded: output.filters.degenerate_excluded,
            written: output.records.len(),
        },
        tau: TauStats {
            median: median(&scored),
            p90: p90(&scored),
            specific_cutoff: cutoff,
            specific_genes_by_tissue: specific,
        },
        outputs,
    }
}

pub fn describe_record(record: &GeneRecord) -> String {
    format!(
        "{} ({}) tau={} max={} at {}",
        record.gene_id,
        if record.symbol.is_empty() {
            "-"
        } else {
            record.symbol.as_str()
        },
        format_opt_f64_6(record.tau.score()),
        format_opt_f64_6(record.max_expression),
        record.max_tissue.as_deref().unwrap_or("NA")
    )
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_report.rs"]
mod tests;

use std::path::Path;

use crate::input::InputError;
use crate::input::reader::{next_line, open_maybe_gz};
use crate::model::matrix::{ExpressionMatrix, MatrixError};

/// Text layouts accepted for the expression matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixLayout {
    /// `id<TAB>tissue...` header followed by one row per gene.
    Plain,
    /// GCT 1.x: version line, dimension line, then `Name<TAB>Description<TAB>tissue...`.
    Gct,
}

impl MatrixLayout {
    pub fn name(&self) -> &'static str {
        match self {
            MatrixLayout::Plain => "tsv",
            MatrixLayout::Gct => "gct",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedMatrix {
    pub matrix: ExpressionMatrix,
    pub layout: MatrixLayout,
    pub missing_cells: usize,
}

pub fn parse_expression_matrix(path: &Path) -> Result<LoadedMatrix, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut line_no = 0usize;

    if !next_line(reader.as_mut(), &mut buf, &mut line_no)? {
        return Err(InputError::Parse(format!(
            "{} is empty",
            path.display()
        )));
    }

    let layout = if buf.starts_with("#1.") {
        // Dimension line is informational only; the header and rows are authoritative.
        if !next_line(reader.as_mut(), &mut buf, &mut line_no)? {
            return Err(InputError::Parse("GCT file has no dimension line".to_string()));
        }
        if !next_line(reader.as_mut(), &mut buf, &mut line_no)? {
            return Err(InputError::Parse("GCT file has no header line".to_string()));
        }
        MatrixLayout::Gct
    } else {
        MatrixLayout::Plain
    };

    let header: Vec<String> = buf.split('\t').map(|s| s.trim().to_string()).collect();
    let lead_cols = match layout {
        MatrixLayout::Plain => 1,
        MatrixLayout::Gct => 2,
    };
    if header.len() <= lead_cols {
        return Err(InputError::Matrix {
            line: line_no,
            source: MatrixError::NoTissues,
        });
    }
    let tissues = header[lead_cols..].to_vec();
    let n_fields = header.len();

    let mut gene_ids = Vec::new();
    let mut descriptions = Vec::new();
    let mut rows = Vec::new();
    let mut missing_cells = 0usize;

    while next_line(reader.as_mut(), &mut buf, &mut line_no)? {
        let fields: Vec<&str> = buf.split('\t').collect();
        let gene = fields[0].trim().to_string();
        if gene.is_empty() {
            return Err(InputError::Parse(format!(
                "line {}: empty gene identifier",
                line_no
            )));
        }
        if fields.len() != n_fields {
            return Err(InputError::Matrix {
                line: line_no,
                source: MatrixError::NonRectangular {
                    gene,
                    expected: tissues.len(),
                    found: fields.len().saturating_sub(lead_cols),
                },
            });
        }

        let mut row = Vec::with_capacity(tissues.len());
        for (tissue, raw) in tissues.iter().zip(&fields[lead_cols..]) {
            match parse_cell(raw) {
                Cell::Value(v) if v < 0.0 => {
                    return Err(InputError::Matrix {
                        line: line_no,
                        source: MatrixError::Negative {
                            gene,
                            tissue: tissue.clone(),
                            value: v,
                        },
                    });
                }
                Cell::Value(v) => row.push(Some(v)),
                Cell::Missing => {
                    missing_cells += 1;
                    row.push(None);
                }
                Cell::Invalid => {
                    return Err(InputError::Matrix {
                        line: line_no,
                        source: MatrixError::NonNumeric {
                            gene,
                            tissue: tissue.clone(),
                            value: raw.trim().to_string(),
                        },
                    });
                }
            }
        }

        if layout == MatrixLayout::Gct {
            descriptions.push(fields[1].trim().to_string());
        }
        gene_ids.push(gene);
        rows.push(row);
    }

    let matrix = ExpressionMatrix::from_rows(gene_ids, tissues, rows).map_err(|source| {
        InputError::Matrix {
            line: line_no,
            source,
        }
    })?;
    let matrix = if layout == MatrixLayout::Gct {
        matrix.with_descriptions(descriptions)
    } else {
        matrix
    };

    crate::info!(
        "loaded expression matrix {}: layout={}, genes={}, tissues={}, missing_cells={}",
        path.display(),
        layout.name(),
        matrix.n_genes(),
        matrix.n_tissues(),
        missing_cells
    );

    Ok(LoadedMatrix {
        matrix,
        layout,
        missing_cells,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    Missing,
    Invalid,
}

pub fn parse_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        _ => Cell::Invalid,
    }
}

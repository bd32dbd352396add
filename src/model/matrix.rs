use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MatrixError {
    #[error("matrix has no tissue columns")]
    NoTissues,
    #[error("matrix has no gene rows")]
    NoGenes,
    #[error("duplicate tissue column '{0}'")]
    DuplicateTissue(String),
    #[error("duplicate gene id '{0}'")]
    DuplicateGene(String),
    #[error("{ids} gene ids but {rows} value rows")]
    RowCount { ids: usize, rows: usize },
    #[error("gene '{gene}' has {found} values, expected {expected}")]
    NonRectangular {
        gene: String,
        expected: usize,
        found: usize,
    },
    #[error("gene '{gene}', tissue '{tissue}': non-numeric value '{value}'")]
    NonNumeric {
        gene: String,
        tissue: String,
        value: String,
    },
    #[error("gene '{gene}', tissue '{tissue}': negative value {value}")]
    Negative {
        gene: String,
        tissue: String,
        value: f64,
    },
}

/// Gene x tissue expression values, row-major. `None` marks a missing cell.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    gene_ids: Vec<String>,
    tissues: Vec<String>,
    descriptions: Option<Vec<String>>,
    values: Vec<Option<f64>>,
}

impl ExpressionMatrix {
    pub fn from_rows(
        gene_ids: Vec<String>,
        tissues: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, MatrixError> {
        if tissues.is_empty() {
            return Err(MatrixError::NoTissues);
        }
        if gene_ids.is_empty() {
            return Err(MatrixError::NoGenes);
        }

        let mut seen = HashSet::with_capacity(tissues.len());
        for tissue in &tissues {
            if !seen.insert(tissue.as_str()) {
                return Err(MatrixError::DuplicateTissue(tissue.clone()));
            }
        }

        let mut seen = HashSet::with_capacity(gene_ids.len());
        for gene in &gene_ids {
            if !seen.insert(gene.as_str()) {
                return Err(MatrixError::DuplicateGene(gene.clone()));
            }
        }

        if rows.len() != gene_ids.len() {
            return Err(MatrixError::RowCount {
                ids: gene_ids.len(),
                rows: rows.len(),
            });
        }

        let n_tissues = tissues.len();
        let mut values = Vec::with_capacity(gene_ids.len() * n_tissues);
        for (gene, row) in gene_ids.iter().zip(rows.iter()) {
            if row.len() != n_tissues {
                return Err(MatrixError::NonRectangular {
                    gene: gene.clone(),
                    expected: n_tissues,
                    found: row.len(),
                });
            }
            for (tissue, value) in tissues.iter().zip(row.iter()) {
                if let Some(v) = *value {
                    if !v.is_finite() {
                        return Err(MatrixError::NonNumeric {
                            gene: gene.clone(),
                            tissue: tissue.clone(),
                            value: v.to_string(),
                        });
                    }
                    if v < 0.0 {
                        return Err(MatrixError::Negative {
                            gene: gene.clone(),
                            tissue: tissue.clone(),
                            value: v,
                        });
                    }
                }
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            gene_ids,
            tissues,
            descriptions: None,
            values,
        })
    }

    /// Attaches a per-gene description column (GCT `Description`).
    pub fn with_descriptions(mut self, descriptions: Vec<String>) -> Self {
        if descriptions.len() == self.gene_ids.len() {
            self.descriptions = Some(descriptions);
        }
        self
    }

    pub fn n_genes(&self) -> usize {
        self.gene_ids.len()
    }

    pub fn n_tissues(&self) -> usize {
        self.tissues.len()
    }

    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    pub fn tissues(&self) -> &[String] {
        &self.tissues
    }

    pub fn description(&self, gene: usize) -> Option<&str> {
        self.descriptions
            .as_ref()
            .and_then(|d| d.get(gene))
            .map(|s| s.as_str())
    }

    pub fn row(&self, gene: usize) -> &[Option<f64>] {
        let n = self.tissues.len();
        &self.values[gene * n..(gene + 1) * n]
    }

    pub fn column(&self, tissue: usize) -> Vec<Option<f64>> {
        (0..self.gene_ids.len())
            .map(|gene| self.values[gene * self.tissues.len() + tissue])
            .collect()
    }

    /// Maximum present value of a gene and the first tissue index reaching it.
    pub fn row_max(&self, gene: usize) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (tissue, value) in self.row(gene).iter().enumerate() {
            if let Some(v) = *value {
                match best {
                    Some((_, current)) if v <= current => {}
                    _ => best = Some((tissue, v)),
                }
            }
        }
        best
    }
}

/// Per-tissue quantile bins, same shape as the source matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinMatrix {
    n_genes: usize,
    n_tissues: usize,
    bins: Vec<u8>,
}

impl BinMatrix {
    /// Builds the row-major matrix from per-tissue columns of equal length.
    pub fn from_columns(n_genes: usize, columns: &[Vec<u8>]) -> Self {
        let n_tissues = columns.len();
        let mut bins = vec![0u8; n_genes * n_tissues];
        for (tissue, column) in columns.iter().enumerate() {
            for (gene, &bin) in column.iter().enumerate().take(n_genes) {
                bins[gene * n_tissues + tissue] = bin;
            }
        }
        Self {
            n_genes,
            n_tissues,
            bins,
        }
    }

    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    pub fn n_tissues(&self) -> usize {
        self.n_tissues
    }

    pub fn row(&self, gene: usize) -> &[u8] {
        &self.bins[gene * self.n_tissues..(gene + 1) * self.n_tissues]
    }

    pub fn column(&self, tissue: usize) -> Vec<u8> {
        (0..self.n_genes)
            .map(|gene| self.bins[gene * self.n_tissues + tissue])
            .collect()
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod matrix;
pub mod meta;
pub mod reader;
pub mod subset;

use crate::model::config::GeneSubset;
use crate::model::matrix::MatrixError;
use matrix::{LoadedMatrix, parse_expression_matrix};
use meta::{GeneMeta, load_gene_meta};
use subset::parse_gene_subset;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("malformed matrix at line {line}: {source}")]
    Matrix { line: usize, source: MatrixError },
}

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub matrix: PathBuf,
    pub meta: Option<PathBuf>,
    pub genes: Option<PathBuf>,
}

/// Everything a scoring run reads from disk.
#[derive(Debug, Clone)]
pub struct InputBundle {
    pub paths: InputPaths,
    pub loaded: LoadedMatrix,
    pub meta: Option<GeneMeta>,
    pub subset: Option<GeneSubset>,
}

pub fn load_input(paths: &InputPaths) -> Result<InputBundle, InputError> {
    crate::info!(
        "input files: matrix={}, meta={}, genes={}",
        paths.matrix.display(),
        display_opt(paths.meta.as_deref()),
        display_opt(paths.genes.as_deref())
    );

    let loaded = parse_expression_matrix(&paths.matrix)?;
    let meta = match &paths.meta {
        Some(path) => Some(load_gene_meta(path)?),
        None => None,
    };
    let subset = match &paths.genes {
        Some(path) => Some(parse_gene_subset(path)?),
        None => None,
    };

    Ok(InputBundle {
        paths: paths.clone(),
        loaded,
        meta,
        subset,
    })
}

pub fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;

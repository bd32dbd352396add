use std::path::Path;

use crate::input::InputError;
use crate::input::reader::{next_line, open_maybe_gz};
use crate::model::config::GeneSubset;

/// One identifier per line; `#` starts a comment, extra columns are ignored.
pub fn parse_gene_subset(path: &Path) -> Result<GeneSubset, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut line_no = 0usize;
    let mut subset = GeneSubset::default();

    while next_line(reader.as_mut(), &mut buf, &mut line_no)? {
        let line = buf.split('#').next().unwrap_or("").trim();
        let id = line.split('\t').next().unwrap_or("").trim();
        if id.is_empty() {
            continue;
        }
        if !subset.ids.insert(id.to_string()) {
            crate::warn!("duplicate id in gene list (line {}, id {})", line_no, id);
        }
    }

    if subset.is_empty() {
        return Err(InputError::Parse(format!(
            "gene list {} contains no identifiers",
            path.display()
        )));
    }

    crate::info!(
        "loaded gene list {}: ids={}",
        path.display(),
        subset.len()
    );

    Ok(subset)
}

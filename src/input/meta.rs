use std::collections::HashMap;
use std::path::Path;

use crate::input::InputError;
use crate::input::reader::{next_line, open_maybe_gz};

const ID_COLUMNS: &[&str] = &["gene_id", "id", "ensembl_id", "gene"];
const SYMBOL_COLUMNS: &[&str] = &["symbol", "gene_symbol", "gene_name", "name"];

/// Gene identifier -> symbol table, keyed by both the raw id and its
/// version-stripped Ensembl form.
#[derive(Debug, Clone)]
pub struct GeneMeta {
    pub id_column: String,
    pub symbol_column: String,
    by_id: HashMap<String, String>,
    by_stable_id: HashMap<String, String>,
}

impl GeneMeta {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut meta = GeneMeta {
            id_column: "gene_id".to_string(),
            symbol_column: "symbol".to_string(),
            by_id: HashMap::new(),
            by_stable_id: HashMap::new(),
        };
        for (id, symbol) in pairs {
            meta.insert(id, symbol);
        }
        meta
    }

    fn insert(&mut self, id: String, symbol: String) -> bool {
        if self.by_id.contains_key(&id) {
            return false;
        }
        self.by_stable_id
            .entry(strip_version(&id).to_string())
            .or_insert_with(|| symbol.clone());
        self.by_id.insert(id, symbol);
        true
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Exact id first, then the version-stripped id.
    pub fn symbol(&self, gene_id: &str) -> Option<&str> {
        self.by_id
            .get(gene_id)
            .or_else(|| self.by_stable_id.get(strip_version(gene_id)))
            .map(|s| s.as_str())
    }
}

pub fn load_gene_meta(path: &Path) -> Result<GeneMeta, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut line_no = 0usize;

    if !next_line(reader.as_mut(), &mut buf, &mut line_no)? {
        return Err(InputError::Parse("gene metadata file is empty".to_string()));
    }
    let header: Vec<String> = buf.split('\t').map(|s| s.trim().to_string()).collect();
    if header.len() < 2 {
        return Err(InputError::Parse(
            "gene metadata header needs an id and a symbol column".to_string(),
        ));
    }

    let id_col = find_column(&header, ID_COLUMNS).unwrap_or(0);
    let symbol_col = find_column(&header, SYMBOL_COLUMNS)
        .filter(|&idx| idx != id_col)
        .unwrap_or(if id_col == 0 { 1 } else { 0 });

    let mut meta = GeneMeta {
        id_column: header[id_col].clone(),
        symbol_column: header[symbol_col].clone(),
        by_id: HashMap::new(),
        by_stable_id: HashMap::new(),
    };

    while next_line(reader.as_mut(), &mut buf, &mut line_no)? {
        let fields: Vec<&str> = buf.split('\t').collect();
        let id = fields.get(id_col).map(|s| s.trim()).unwrap_or("");
        if id.is_empty() {
            crate::warn!("gene metadata line has empty id; skipping (line {})", line_no);
            continue;
        }
        let symbol = fields.get(symbol_col).map(|s| s.trim()).unwrap_or("");
        if !meta.insert(id.to_string(), symbol.to_string()) {
            crate::warn!(
                "duplicate gene id in metadata; keeping first (line {}, id {})",
                line_no,
                id
            );
        }
    }

    if meta.is_empty() {
        return Err(InputError::Parse(
            "gene metadata file has no data rows".to_string(),
        ));
    }

    crate::info!(
        "loaded gene metadata {}: entries={}, id_column={}, symbol_column={}",
        path.display(),
        meta.len(),
        meta.id_column,
        meta.symbol_column
    );

    Ok(meta)
}

fn find_column(header: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|&want| {
        header
            .iter()
            .position(|name| name.eq_ignore_ascii_case(want))
    })
}

/// `ENSG00000141510.16` -> `ENSG00000141510`; anything else unchanged.
pub fn strip_version(id: &str) -> &str {
    let trimmed = id.trim();
    if let Some((left, right)) = trimmed.rsplit_once('.') {
        if left
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("ENS"))
            && !right.is_empty()
            && right.chars().all(|c| c.is_ascii_digit())
        {
            return left;
        }
    }
    trimmed
}

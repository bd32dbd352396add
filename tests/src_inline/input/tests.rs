use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::matrix::{Cell, MatrixLayout, parse_cell, parse_expression_matrix};
use super::meta::{GeneMeta, load_gene_meta, strip_version};
use super::subset::parse_gene_subset;
use super::{InputError, InputPaths, load_input};
use crate::model::matrix::MatrixError;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_tissuetau_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_parse_plain_matrix_with_missing() {
    let dir = make_temp_dir();
    let path = dir.join("m.tsv");
    write_file(
        &path,
        "gene\tLiver\tBrain\tLung\nG1\t1.5\tNA\t0\nG2\t\t3\t4e1\r\n\nG3\t0\t0\tnan\n",
    );

    let loaded = parse_expression_matrix(&path).unwrap();
    assert_eq!(loaded.layout, MatrixLayout::Plain);
    assert_eq!(loaded.missing_cells, 3);
    let m = &loaded.matrix;
    assert_eq!(m.n_genes(), 3);
    assert_eq!(m.tissues(), &["Liver", "Brain", "Lung"]);
    assert_eq!(m.row(0), &[Some(1.5), None, Some(0.0)]);
    assert_eq!(m.row(1), &[None, Some(3.0), Some(40.0)]);
    assert_eq!(m.row(2), &[Some(0.0), Some(0.0), None]);
}

#[test]
fn test_parse_gct_gz_matrix() {
    let dir = make_temp_dir();
    let path = dir.join("gtex.gct.gz");
    write_gz(
        &path,
        "#1.2\n2\t2\nName\tDescription\tLiver\tBrain\nENSG01.3\tALB\t900\t1\nENSG02.1\tGFAP\t0\t50\n",
    );

    let loaded = parse_expression_matrix(&path).unwrap();
    assert_eq!(loaded.layout, MatrixLayout::Gct);
    let m = &loaded.matrix;
    assert_eq!(m.gene_ids(), &["ENSG01.3", "ENSG02.1"]);
    assert_eq!(m.description(0), Some("ALB"));
    assert_eq!(m.description(1), Some("GFAP"));
    assert_eq!(m.row(1), &[Some(0.0), Some(50.0)]);
}

#[test]
fn test_malformed_matrix_fails_fast() {
    let dir = make_temp_dir();

    let ragged = dir.join("ragged.tsv");
    write_file(&ragged, "gene\tA\tB\nG1\t1\t2\nG2\t1\n");
    match parse_expression_matrix(&ragged) {
        Err(InputError::Matrix {
            line: 3,
            source: MatrixError::NonRectangular { found: 1, .. },
        }) => {}
        other => panic!("unexpected: {other:?}"),
    }

    let negative = dir.join("negative.tsv");
    write_file(&negative, "gene\tA\tB\nG1\t1\t-2\n");
    match parse_expression_matrix(&negative) {
        Err(InputError::Matrix {
            line: 2,
            source: MatrixError::Negative { tissue, .. },
        }) => assert_eq!(tissue, "B"),
        other => panic!("unexpected: {other:?}"),
    }

    let text = dir.join("text.tsv");
    write_file(&text, "gene\tA\nG1\thigh\n");
    match parse_expression_matrix(&text) {
        Err(InputError::Matrix {
            source: MatrixError::NonNumeric { value, .. },
            ..
        }) => assert_eq!(value, "high"),
        other => panic!("unexpected: {other:?}"),
    }

    let dup = dir.join("dup.tsv");
    write_file(&dup, "gene\tA\nG1\t1\nG1\t2\n");
    assert!(matches!(
        parse_expression_matrix(&dup),
        Err(InputError::Matrix {
            source: MatrixError::DuplicateGene(_),
            ..
        })
    ));

    let no_tissues = dir.join("no_tissues.tsv");
    write_file(&no_tissues, "gene\nG1\n");
    assert!(matches!(
        parse_expression_matrix(&no_tissues),
        Err(InputError::Matrix {
            source: MatrixError::NoTissues,
            ..
        })
    ));

    let header_only = dir.join("header_only.tsv");
    write_file(&header_only, "gene\tA\tB\n");
    assert!(matches!(
        parse_expression_matrix(&header_only),
        Err(InputError::Matrix {
            source: MatrixError::NoGenes,
            ..
        })
    ));

    assert!(matches!(
        parse_expression_matrix(&dir.join("absent.tsv")),
        Err(InputError::MissingInput(_))
    ));
}

#[test]
fn test_parse_cell_values() {
    assert_eq!(parse_cell(" 2.5 "), Cell::Value(2.5));
    assert_eq!(parse_cell("NA"), Cell::Missing);
    assert_eq!(parse_cell(""), Cell::Missing);
    assert_eq!(parse_cell("inf"), Cell::Invalid);
    assert_eq!(parse_cell("x1"), Cell::Invalid);
}

#[test]
fn test_gene_meta_columns_and_versions() {
    let dir = make_temp_dir();
    let path = dir.join("meta.tsv");
    write_file(
        &path,
        "chrom\tgene_name\tgene_id\nchr1\tALB\tENSG01\nchr2\tGFAP\tENSG02\nchr3\tDUP\tENSG02\n",
    );

    let meta = load_gene_meta(&path).unwrap();
    assert_eq!(meta.id_column, "gene_id");
    assert_eq!(meta.symbol_column, "gene_name");
    assert_eq!(meta.len(), 2);
    assert_eq!(meta.symbol("ENSG02"), Some("GFAP"));
    assert_eq!(meta.symbol("ENSG01.7"), Some("ALB"));
    assert_eq!(meta.symbol("ENSG03"), None);
}

#[test]
fn test_strip_version() {
    assert_eq!(strip_version("ENSG00000141510.16"), "ENSG00000141510");
    assert_eq!(strip_version("ensmusg0001.2"), "ensmusg0001");
    assert_eq!(strip_version("TP53.1a"), "TP53.1a");
    assert_eq!(strip_version("GENE.2"), "GENE.2");
    let meta = GeneMeta::from_pairs(vec![("ENSG9.1".to_string(), "X".to_string())]);
    assert_eq!(meta.symbol("ENSG9.4"), Some("X"));
}

#[test]
fn test_gene_subset_parsing() {
    let dir = make_temp_dir();
    let path = dir.join("genes.txt");
    write_file(&path, "# liver panel\nG1\nG2\t extra\n\nG1\nG3 # trailing\n");

    let subset = parse_gene_subset(&path).unwrap();
    assert_eq!(subset.len(), 3);
    assert!(subset.contains("G1"));
    assert!(subset.contains("G2"));
    assert!(subset.contains("G3"));

    let empty = dir.join("empty.txt");
    write_file(&empty, "# nothing\n");
    assert!(matches!(
        parse_gene_subset(&empty),
        Err(InputError::Parse(_))
    ));
}

#[test]
fn test_load_input_bundle() {
    let dir = make_temp_dir();
    let matrix = dir.join("m.tsv");
    let meta = dir.join("meta.tsv");
    let genes = dir.join("genes.txt");
    write_file(&matrix, "id\tA\tB\nG1\t1\t2\nG2\t3\t4\n");
    write_file(&meta, "gene_id\tsymbol\nG1\tS1\n");
    write_file(&genes, "G2\n");

    let bundle = load_input(&InputPaths {
        matrix,
        meta: Some(meta),
        genes: Some(genes),
    })
    .unwrap();
    assert_eq!(bundle.loaded.matrix.n_genes(), 2);
    assert_eq!(bundle.meta.as_ref().map(|m| m.len()), Some(1));
    assert_eq!(bundle.subset.as_ref().map(|s| s.len()), Some(1));
}

use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let mut argv = vec!["kira-tissuetau"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv)
}

fn run_args(cli: Cli) -> RunArgs {
    match cli.command {
        Command::Run(args) => args,
    }
}

#[test]
fn test_parse_args_defaults() {
    let args = run_args(parse(&["run", "--matrix", "m.tsv", "--out", "out"]).unwrap());
    let config = args.scorer_config();
    assert_eq!(config.threshold, DEFAULT_THRESHOLD);
    assert_eq!(config.num_bins, 10);
    assert_eq!(config.join_policy, JoinPolicy::Drop);
    assert_eq!(config.rank_order, RankOrder::Desc);
    assert!(!config.keep_degenerate);
    assert_eq!(args.report_options().format, OutputFormat::Tsv);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_args_options() {
    let args = run_args(
        parse(&[
            "run",
            "--matrix",
            "m.tsv",
            "--out",
            "out",
            "--threshold",
            "0",
            "--num-bins",
            "5",
            "--join-policy",
            "fail",
            "--order",
            "asc",
            "--keep-degenerate",
            "--min-max-expression",
            "1.5",
            "--format",
            "csv",
            "--write-bins",
        ])
        .unwrap(),
    );
    let config = args.scorer_config();
    assert_eq!(config.threshold, 0.0);
    assert_eq!(config.num_bins, 5);
    assert_eq!(config.join_policy, JoinPolicy::Fail);
    assert_eq!(config.rank_order, RankOrder::Asc);
    assert!(config.keep_degenerate);
    assert_eq!(config.min_max_expression, Some(1.5));
    let options = args.report_options();
    assert_eq!(options.format, OutputFormat::Csv);
    assert!(options.write_bins);
    assert!(!options.gzip_output);
}

#[test]
fn test_parse_args_missing_matrix() {
    assert!(parse(&["run", "--out", "out"]).is_err());
    assert!(parse(&["score", "--matrix", "m.tsv", "--out", "out"]).is_err());
}

#[test]
fn test_zero_bins_fails_validation() {
    let args = run_args(
        parse(&["run", "--matrix", "m.tsv", "--out", "out", "--num-bins", "0"]).unwrap(),
    );
    let err = run_scoring_command(&args).unwrap_err();
    assert!(matches!(err, RunError::Config(ConfigError::NumBins)));
}

fn temp_dir(tag: &str) -> PathBuf {
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "kira_tissuetau_main_{}_{}_{}",
        tag,
        std::process::id(),
        id
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_run_end_to_end_with_meta_and_subset() {
    let dir = temp_dir("e2e");
    let matrix = dir.join("matrix.tsv");
    let meta = dir.join("meta.tsv");
    let genes = dir.join("genes.txt");
    let out = dir.join("out");
    std::fs::write(
        &matrix,
        "gene_id\tLiver\tBrain\tLung\n\
         ENSG1.1\t500\t0\t0\n\
         ENSG2.4\t20\t20\t20\n\
         ENSG3.1\t0\t0\t0\n\
         ENSG4.2\t1\t80\t2\n",
    )
    .unwrap();
    std::fs::write(
        &meta,
        "gene_id\tsymbol\nENSG1\tALB\nENSG2\tACTB\nENSG3\tSILENT\n",
    )
    .unwrap();
    std::fs::write(&genes, "ENSG1\nENSG2\nENSG3\nENSG4\n").unwrap();

    let args = run_args(
        parse(&[
            "run",
            "--matrix",
            matrix.to_str().unwrap(),
            "--meta",
            meta.to_str().unwrap(),
            "--genes",
            genes.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--threshold",
            "0",
        ])
        .unwrap(),
    );
    run_scoring_command(&args).unwrap();

    let tau = std::fs::read_to_string(out.join("tau.tsv")).unwrap();
    let ids: Vec<&str> = tau
        .lines()
        .skip(1)
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    // ENSG4 has no metadata (dropped); ENSG3 is not expressed (excluded).
    assert_eq!(ids, vec!["ENSG1.1", "ENSG2.4"]);
    assert!(tau.contains("ENSG1.1\tALB\t1.000000\t500.000000\tLiver\tscored"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["counts"]["join_dropped"], 1);
    assert_eq!(summary["counts"]["degenerate_excluded"], 1);
    assert_eq!(summary["input"]["gene_subset_size"], 4);
}

#[test]
fn test_run_join_policy_fail() {
    let dir = temp_dir("fail");
    let matrix = dir.join("matrix.tsv");
    let meta = dir.join("meta.tsv");
    std::fs::write(&matrix, "id\tA\tB\nG1\t1\t0\nG2\t0\t1\n").unwrap();
    std::fs::write(&meta, "id\tsymbol\nG1\tONE\n").unwrap();

    let args = run_args(
        parse(&[
            "run",
            "--matrix",
            matrix.to_str().unwrap(),
            "--meta",
            meta.to_str().unwrap(),
            "--out",
            dir.join("out").to_str().unwrap(),
            "--join-policy",
            "fail",
        ])
        .unwrap(),
    );
    let err = run_scoring_command(&args).unwrap_err();
    assert!(matches!(err, RunError::Join(JoinError::Unmatched { count: 1, .. })));
}

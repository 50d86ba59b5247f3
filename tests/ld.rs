use std::cell::RefCell;
use std::fs;

use polars::prelude::*;

use betameta::ld::{
    LdAnnotationProvider, RscriptProvider, annotate_results, find_in_dirs, read_snp_list,
    result_snps, write_result_annotation,
};
use betameta::plot::{forest_rows, write_forest_plot};
use betameta::types::{Allele, Heterogeneity, PooledResult, PoolingModel};

fn result(snp: &str, heterogeneity: Heterogeneity) -> PooledResult {
    PooledResult {
        phenotype: "T2D".to_string(),
        variant_id: snp.to_string(),
        effect_allele: Allele::A,
        non_effect_allele: Allele::G,
        beta_meta: 0.2,
        beta_se_meta: 0.1,
        heterogeneity,
        model: PoolingModel::FixedEffect,
        n_studies: 2,
        p_value: 0.05,
        bh_p_value: 0.05,
    }
}

struct RecordingProvider {
    seen: RefCell<Vec<String>>,
}

impl LdAnnotationProvider for RecordingProvider {
    fn annotate(&self, snps: &[String]) -> anyhow::Result<DataFrame> {
        self.seen.borrow_mut().extend(snps.iter().cloned());
        let df = DataFrame::from_iter([
            Series::new("SNP".into(), snps.to_vec()),
            Series::new("R2".into(), vec![1.0f64; snps.len()]),
        ]);
        Ok(df)
    }
}

#[test]
fn snp_list_reads_plain_and_tabular_forms() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plain = dir.path().join("plain.txt");
    fs::write(&plain, "rs1\n\n rs2 \nrs3\n").expect("write");
    assert_eq!(read_snp_list(&plain).expect("plain"), vec!["rs1", "rs2", "rs3"]);

    let table = dir.path().join("table.tsv");
    fs::write(&table, "CHR\tSNP\n1\trs10\n2\trs20\n").expect("write");
    assert_eq!(read_snp_list(&table).expect("table"), vec!["rs10", "rs20"]);
}

#[test]
fn interpreter_lookup_walks_directories_in_order() {
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    fs::write(second.path().join("Rscript"), "").expect("write");
    let found = find_in_dirs(
        vec![first.path().to_path_buf(), second.path().to_path_buf()],
        "Rscript",
    );
    assert_eq!(found, Some(second.path().join("Rscript")));
    assert_eq!(find_in_dirs(vec![first.path().to_path_buf()], "Rscript"), None);
}

#[test]
fn missing_script_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = RscriptProvider::new(
        dir.path().join("ld.R"),
        Some(dir.path().join("Rscript")),
    );
    assert!(err.is_err());
}

#[test]
fn failing_interpreter_reports_external_tool_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("ld.R");
    fs::write(&script, "").expect("write");
    let provider = RscriptProvider::new(&script, Some(dir.path().join("no-such-rscript")))
        .expect("provider");
    let err = provider.annotate(&["rs1".to_string()]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<betameta::error::MetaError>(),
        Some(betameta::error::MetaError::ExternalTool(_))
    ));
}

#[test]
fn results_are_annotated_once_per_snp() {
    let results = vec![
        result("rs1", Heterogeneity::Unprocessed),
        result("rs2", Heterogeneity::Unprocessed),
        result("rs1", Heterogeneity::Unprocessed),
    ];
    assert_eq!(result_snps(&results), vec!["rs1", "rs2"]);

    let provider = RecordingProvider {
        seen: RefCell::new(Vec::new()),
    };
    let table = annotate_results(&results, &provider).expect("annotate");
    assert_eq!(table.height(), 2);
    assert_eq!(*provider.seen.borrow(), vec!["rs1", "rs2"]);
}

#[test]
fn annotation_table_is_written_after_pooling() {
    let results = vec![
        result("rs5", Heterogeneity::NoVariation),
        result("rs6", Heterogeneity::Unprocessed),
    ];
    let provider = RecordingProvider {
        seen: RefCell::new(Vec::new()),
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ld").join("annotation.tsv");
    let rows = write_result_annotation(&results, &provider, &path).expect("annotate");
    assert_eq!(rows, 2);

    let text = fs::read_to_string(&path).expect("read");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "SNP\tR2");
    assert!(lines[1].starts_with("rs5\t"));
    assert!(lines[2].starts_with("rs6\t"));
}

#[test]
fn forest_plot_skips_unprocessed_variants() {
    let computed = Heterogeneity::Computed {
        q: 1.2,
        i_square: 10.0,
    };
    let results = vec![
        result("rs1", computed),
        result("rs2", Heterogeneity::Unprocessed),
        result("rs3", Heterogeneity::NoVariation),
    ];
    let rows = forest_rows(&results);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "T2D - rs1");
    assert!((rows[0].lower - (0.2 - 1.96 * 0.1)).abs() < 1e-12);
    assert!((rows[0].upper - (0.2 + 1.96 * 0.1)).abs() < 1e-12);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plots").join("forest.html");
    assert_eq!(write_forest_plot(&results, &path).expect("plot"), 1);
    assert!(path.is_file());

    let skipped = dir.path().join("none.html");
    let unprocessed = vec![result("rs2", Heterogeneity::Unprocessed)];
    assert_eq!(write_forest_plot(&unprocessed, &skipped).expect("plot"), 0);
    assert!(!skipped.exists());
}

use betameta::direction::{Direction, direction, group_records, reconcile};
use betameta::types::{Allele, ReconcileStrategy, StudyRecord};

fn record(snp: &str, ea: Allele, nea: Allele, beta: f64, p: Option<f64>) -> StudyRecord {
    StudyRecord {
        phenotype: "T2D".to_string(),
        variant_id: snp.to_string(),
        effect_allele: ea,
        non_effect_allele: nea,
        beta,
        beta_se: 0.1,
        p_value: p,
    }
}

#[test]
fn identical_pairs_are_same() {
    let bases = ["A", "C", "G", "T"];
    for e in bases {
        for n in bases {
            if e != n {
                assert_eq!(direction(e, n, e, n), Direction::Same, "{e}/{n}");
            }
        }
    }
}

#[test]
fn swapped_pairs_are_opposite() {
    assert_eq!(direction("A", "G", "G", "A"), Direction::Opposite);
    assert_eq!(direction("A", "T", "T", "A"), Direction::Opposite);
    assert_eq!(direction("G", "C", "C", "G"), Direction::Opposite);
}

#[test]
fn complementary_strand_is_resolved() {
    // A/G read off the other strand is T/C.
    assert_eq!(direction("A", "G", "T", "C"), Direction::Same);
    assert_eq!(direction("A", "G", "C", "T"), Direction::Opposite);
    assert_eq!(direction("A", "C", "T", "G"), Direction::Same);
    assert_eq!(direction("A", "C", "G", "T"), Direction::Opposite);
}

#[test]
fn palindromic_pairs_only_merge_on_identical_alleles() {
    assert_eq!(direction("A", "T", "A", "T"), Direction::Same);
    assert_eq!(direction("A", "T", "G", "C"), Direction::Incompatible);
    assert_eq!(direction("C", "A", "C", "G"), Direction::Incompatible);
}

#[test]
fn single_base_overlap_is_incompatible() {
    assert_eq!(direction("A", "G", "A", "C"), Direction::Incompatible);
    assert_eq!(direction("T", "C", "T", "A"), Direction::Incompatible);
}

#[test]
fn non_acgt_is_incompatible() {
    assert_eq!(direction("-", "A", "G", "A"), Direction::Incompatible);
    assert_eq!(direction("A", "G", "A", "N"), Direction::Incompatible);
    assert_eq!(direction("a", "g", "A", "G"), Direction::Incompatible);
}

#[test]
fn groups_keep_first_seen_order() {
    let records = vec![
        record("rs2", Allele::A, Allele::G, 0.1, None),
        record("rs1", Allele::A, Allele::G, 0.2, None),
        record("rs2", Allele::A, Allele::G, 0.3, None),
    ];
    let groups = group_records(records);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0.variant_id, "rs2");
    assert_eq!(groups[0].1.len(), 2);
    assert_eq!(groups[1].0.variant_id, "rs1");
}

#[test]
fn first_record_strategy_swaps_and_never_drops() {
    let records = vec![
        record("rs1", Allele::A, Allele::G, 0.2, Some(0.5)),
        record("rs1", Allele::G, Allele::A, 0.3, Some(0.01)),
        record("rs1", Allele::T, Allele::C, 0.1, Some(0.2)),
    ];
    let (groups, dropped) = reconcile(records, ReconcileStrategy::FirstRecord);
    assert_eq!(dropped, 0);
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.reference, (Allele::A, Allele::G));
    assert_eq!(group.records.len(), 3);

    assert_eq!(group.records[1].allele_pair(), (Allele::A, Allele::G));
    assert_eq!(group.records[1].beta, -0.3);
    // Not an exact swap, so left alone.
    assert_eq!(group.records[2].allele_pair(), (Allele::T, Allele::C));
    assert_eq!(group.records[2].beta, 0.1);
}

#[test]
fn min_p_value_strategy_aligns_to_most_significant_record() {
    let records = vec![
        record("rs1", Allele::A, Allele::G, 0.2, Some(0.5)),
        record("rs1", Allele::C, Allele::T, 0.4, Some(0.01)),
        record("rs1", Allele::C, Allele::A, 0.3, Some(0.2)),
        record("rs1", Allele::A, Allele::T, 0.3, Some(0.3)),
        record("rs1", Allele::T, Allele::C, 0.5, None),
    ];
    let (groups, dropped) = reconcile(records, ReconcileStrategy::MinPValue);
    assert_eq!(dropped, 2);
    let group = &groups[0];
    assert_eq!(group.reference, (Allele::C, Allele::T));
    assert_eq!(group.records.len(), 3);
    for r in &group.records {
        assert_eq!(r.allele_pair(), (Allele::C, Allele::T));
    }
    // A/G against C/T: complementary strand, effect allele A pairs with T.
    assert_eq!(group.records[0].beta, -0.2);
    assert_eq!(group.records[1].beta, 0.4);
    assert_eq!(group.records[2].beta, -0.5);
}

#[test]
fn min_p_value_strategy_without_p_values_uses_first_record() {
    let records = vec![
        record("rs1", Allele::G, Allele::A, 0.2, None),
        record("rs1", Allele::A, Allele::G, 0.3, None),
    ];
    let (groups, dropped) = reconcile(records, ReconcileStrategy::MinPValue);
    assert_eq!(dropped, 0);
    assert_eq!(groups[0].reference, (Allele::G, Allele::A));
    assert_eq!(groups[0].records[1].beta, -0.3);
}

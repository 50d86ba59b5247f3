use std::collections::HashMap;

use crate::types::{Allele, ReconcileStrategy, StudyRecord, VariantGroup, VariantKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Same,
    Opposite,
    Incompatible,
}

fn strict_allele(value: &str) -> Option<Allele> {
    match value {
        "A" => Some(Allele::A),
        "C" => Some(Allele::C),
        "G" => Some(Allele::G),
        "T" => Some(Allele::T),
        _ => None,
    }
}

/// Classifies how `other` relates to the reference allele pair.
///
/// Any allele outside A/C/G/T makes the pair incompatible.
pub fn direction(
    ref_effect: &str,
    ref_non_effect: &str,
    other_effect: &str,
    other_non_effect: &str,
) -> Direction {
    match (
        strict_allele(ref_effect),
        strict_allele(ref_non_effect),
        strict_allele(other_effect),
        strict_allele(other_non_effect),
    ) {
        (Some(re), Some(rn), Some(oe), Some(on)) => compare_pairs((re, rn), (oe, on)),
        _ => Direction::Incompatible,
    }
}

pub fn compare_pairs(reference: (Allele, Allele), other: (Allele, Allele)) -> Direction {
    let mut ref_set = vec![reference.0, reference.1];
    ref_set.dedup();
    let not_shared = ref_set
        .iter()
        .filter(|a| **a != other.0 && **a != other.1)
        .count();

    match not_shared {
        0 => {
            if reference.0 == other.0 {
                Direction::Same
            } else {
                Direction::Opposite
            }
        }
        2 => {
            // Disjoint pairs are reported on the opposite strand. A/T and C/G
            // look identical on both strands, so they cannot be resolved.
            if is_palindromic(other.0, other.1) {
                Direction::Incompatible
            } else if reference.0.complement() == other.0 {
                Direction::Same
            } else {
                Direction::Opposite
            }
        }
        _ => Direction::Incompatible,
    }
}

pub fn is_palindromic(a: Allele, b: Allele) -> bool {
    a.complement() == b
}

/// Splits records into (phenotype, SNP) groups, in order of first appearance.
pub fn group_records(records: Vec<StudyRecord>) -> Vec<(VariantKey, Vec<StudyRecord>)> {
    let mut index: HashMap<VariantKey, usize> = HashMap::new();
    let mut groups: Vec<(VariantKey, Vec<StudyRecord>)> = Vec::new();
    for record in records {
        let key = record.key();
        match index.get(&key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }
    groups
}

fn min_p_value_index(records: &[StudyRecord]) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (i, record) in records.iter().enumerate() {
        if let Some(p) = record.p_value
            && best.is_none_or(|(_, b)| p < b)
        {
            best = Some((i, p));
        }
    }
    best.map(|(i, _)| i).unwrap_or(0)
}

fn relabel(record: &mut StudyRecord, reference: (Allele, Allele), flip: bool) {
    record.effect_allele = reference.0;
    record.non_effect_allele = reference.1;
    if flip {
        record.beta = -record.beta;
    }
}

/// Aligns a single group to the reference pair of the first record. Only
/// exact swaps are corrected; nothing is dropped.
pub fn reconcile_first_record(mut records: Vec<StudyRecord>) -> (Vec<StudyRecord>, usize) {
    let Some(first) = records.first() else {
        return (records, 0);
    };
    let reference = first.allele_pair();
    if reference.0 != reference.1 {
        for record in records.iter_mut() {
            if record.allele_pair() == (reference.1, reference.0) {
                relabel(record, reference, true);
            }
        }
    }
    (records, 0)
}

/// Aligns a single group to the pair of its most significant record and
/// drops the records whose alleles cannot be matched to it.
pub fn reconcile_min_p_value(records: Vec<StudyRecord>) -> (Vec<StudyRecord>, usize) {
    if records.is_empty() {
        return (records, 0);
    }
    let reference = records[min_p_value_index(&records)].allele_pair();
    let before = records.len();
    let kept: Vec<StudyRecord> = records
        .into_iter()
        .filter_map(|mut record| match compare_pairs(reference, record.allele_pair()) {
            Direction::Same => {
                relabel(&mut record, reference, false);
                Some(record)
            }
            Direction::Opposite => {
                relabel(&mut record, reference, true);
                Some(record)
            }
            Direction::Incompatible => None,
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn reference_pair(records: &[StudyRecord], strategy: ReconcileStrategy) -> Option<(Allele, Allele)> {
    match strategy {
        ReconcileStrategy::FirstRecord => records.first().map(StudyRecord::allele_pair),
        ReconcileStrategy::MinPValue => records
            .get(min_p_value_index(records))
            .map(StudyRecord::allele_pair),
    }
}

/// Groups records by (phenotype, SNP) and harmonizes allele direction
/// within each group. Returns the groups and the number of dropped records.
pub fn reconcile(
    records: Vec<StudyRecord>,
    strategy: ReconcileStrategy,
) -> (Vec<VariantGroup>, usize) {
    let mut dropped = 0usize;
    let mut out = Vec::new();
    for (key, members) in group_records(records) {
        let Some(reference) = reference_pair(&members, strategy) else {
            continue;
        };
        let (members, removed) = match strategy {
            ReconcileStrategy::FirstRecord => reconcile_first_record(members),
            ReconcileStrategy::MinPValue => reconcile_min_p_value(members),
        };
        dropped += removed;
        if members.is_empty() {
            continue;
        }
        out.push(VariantGroup {
            key,
            reference,
            records: members,
        });
    }
    (out, dropped)
}

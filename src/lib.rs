//! Inverse-variance meta-analysis of genetic association summary statistics.
//!
//! Study files are normalized, converted to beta/SE form, aligned to a common
//! effect allele per (phenotype, SNP), pooled with fixed or random effects,
//! and reported with per-phenotype Benjamini-Hochberg p-values.

pub mod error;
pub mod logging;
pub mod types;

pub mod df_utils;
pub mod io;
pub mod qc;
pub mod schema;

pub mod derive;
pub mod direction;
pub mod heterogeneity;
pub mod ld;
pub mod meta;
pub mod normalize;
pub mod plot;
pub mod pool;
pub mod significance;

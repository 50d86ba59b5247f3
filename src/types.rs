use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Allele {
    A,
    C,
    G,
    T,
}

impl Allele {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Allele::A),
            "C" => Some(Allele::C),
            "G" => Some(Allele::G),
            "T" => Some(Allele::T),
            _ => None,
        }
    }

    // Older exports encode alleles as 1..4.
    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 1.0 => Some(Allele::A),
            c if c == 2.0 => Some(Allele::C),
            c if c == 3.0 => Some(Allele::G),
            c if c == 4.0 => Some(Allele::T),
            _ => None,
        }
    }

    pub fn complement(self) -> Self {
        match self {
            Allele::A => Allele::T,
            Allele::T => Allele::A,
            Allele::C => Allele::G,
            Allele::G => Allele::C,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Allele::A => "A",
            Allele::C => "C",
            Allele::G => "G",
            Allele::T => "T",
        }
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub phenotype: String,
    pub variant_id: String,
    pub effect_allele: Allele,
    pub non_effect_allele: Allele,
    pub beta: Option<f64>,
    pub beta_se: Option<f64>,
    pub odds_ratio: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub p_value: Option<f64>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyRecord {
    pub phenotype: String,
    pub variant_id: String,
    pub effect_allele: Allele,
    pub non_effect_allele: Allele,
    pub beta: f64,
    pub beta_se: f64,
    pub p_value: Option<f64>,
}

impl StudyRecord {
    pub fn key(&self) -> VariantKey {
        VariantKey {
            phenotype: self.phenotype.clone(),
            variant_id: self.variant_id.clone(),
        }
    }

    pub fn allele_pair(&self) -> (Allele, Allele) {
        (self.effect_allele, self.non_effect_allele)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub phenotype: String,
    pub variant_id: String,
}

#[derive(Debug, Clone)]
pub struct VariantGroup {
    pub key: VariantKey,
    pub reference: (Allele, Allele),
    pub records: Vec<StudyRecord>,
}

/// Heterogeneity statistics of a pooled group.
///
/// `NoVariation` is a group of two or more studies whose Q is exactly zero:
/// Q is reported as 0 but I² is left uncomputed. `Unprocessed` is a group
/// with fewer than two studies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Heterogeneity {
    Computed { q: f64, i_square: f64 },
    NoVariation,
    Unprocessed,
}

impl Heterogeneity {
    pub fn q(&self) -> Option<f64> {
        match self {
            Heterogeneity::Computed { q, .. } => Some(*q),
            Heterogeneity::NoVariation => Some(0.0),
            Heterogeneity::Unprocessed => None,
        }
    }

    pub fn i_square(&self) -> Option<f64> {
        match self {
            Heterogeneity::Computed { i_square, .. } => Some(*i_square),
            Heterogeneity::NoVariation | Heterogeneity::Unprocessed => None,
        }
    }

    /// Whether I² was computed, i.e. the group was actually meta-analysed.
    pub fn is_processed(&self) -> bool {
        matches!(self, Heterogeneity::Computed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingModel {
    Single,
    FixedEffect,
    RandomEffects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileStrategy {
    FirstRecord,
    #[default]
    MinPValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PooledResult {
    pub phenotype: String,
    pub variant_id: String,
    pub effect_allele: Allele,
    pub non_effect_allele: Allele,
    pub beta_meta: f64,
    pub beta_se_meta: f64,
    pub heterogeneity: Heterogeneity,
    pub model: PoolingModel,
    pub n_studies: usize,
    pub p_value: f64,
    pub bh_p_value: f64,
}

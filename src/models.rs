// ==============================================================================
// models.rs - Clinical Record Data Models
// ==============================================================================
// Description: In-memory phenopacket model shared by the obfuscation engine
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

/// Root of the phenotypic abnormality subontology (HP:0000118)
pub const PHENOTYPIC_ABNORMALITY: &str = "HP:0000118";

/// One observed or explicitly excluded phenotype finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenotypeObservation {
    /// Ontology identifier (e.g., "HP:0001250")
    pub term_id: String,

    /// Term label (e.g., "Seizure")
    pub label: String,

    /// True for "NOT" observations (phenotype explicitly excluded)
    pub negated: bool,
}

impl PhenotypeObservation {
    pub fn new(term_id: impl Into<String>, label: impl Into<String>, negated: bool) -> Self {
        Self {
            term_id: term_id.into(),
            label: label.into(),
            negated,
        }
    }
}

/// Zygosity of a variant call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zygosity {
    Heterozygous,
    Homozygous,
}

impl Zygosity {
    /// GENO ontology class id used on the wire
    pub fn geno_id(&self) -> &'static str {
        match self {
            Zygosity::Heterozygous => "GENO:0000135",
            Zygosity::Homozygous => "GENO:0000136",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Zygosity::Heterozygous => "heterozygous",
            Zygosity::Homozygous => "homozygous",
        }
    }

    pub fn from_geno_id(id: &str) -> Option<Self> {
        match id {
            "GENO:0000135" => Some(Zygosity::Heterozygous),
            "GENO:0000136" => Some(Zygosity::Homozygous),
            _ => None,
        }
    }
}

/// Identity of a variant: (chromosome, position, REF, ALT)
///
/// The chromosome is stored without a leading "chr" (any case) so that
/// "chr7", "CHR7" and "7" compare equal. Zygosity and assembly are not part
/// of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub chromosome: String,
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
}

impl VariantKey {
    pub fn new(
        chromosome: &str,
        position: u64,
        ref_allele: impl Into<String>,
        alt_allele: impl Into<String>,
    ) -> Self {
        let chromosome = match chromosome.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &chromosome[3..],
            _ => chromosome,
        };

        Self {
            chromosome: chromosome.to_string(),
            position,
            ref_allele: ref_allele.into(),
            alt_allele: alt_allele.into(),
        }
    }
}

/// A single genotyped variant of the simulated patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCall {
    /// Chromosome as written in the record (e.g., "chr7" or "7")
    pub chromosome: String,

    /// 1-based position
    pub position: u64,

    /// Reference allele
    pub ref_allele: String,

    /// Alternate allele
    pub alt_allele: String,

    /// Genome assembly (e.g., "GRCh38")
    pub genome_assembly: String,

    pub zygosity: Zygosity,
}

impl VariantCall {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(
            &self.chromosome,
            self.position,
            self.ref_allele.clone(),
            self.alt_allele.clone(),
        )
    }

    /// Copy of this call with the given zygosity
    pub fn with_zygosity(&self, zygosity: Zygosity) -> Self {
        Self {
            zygosity,
            ..self.clone()
        }
    }
}

/// One simulated patient
///
/// `subject`, `diagnosis` and `gene` are carried as opaque JSON blocks; the
/// obfuscation engine never looks inside them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClinicalRecord {
    pub subject: Option<serde_json::Value>,
    pub diagnosis: Option<serde_json::Value>,
    pub gene: Option<serde_json::Value>,
    pub phenotype_observations: Vec<PhenotypeObservation>,
    pub variant_calls: Vec<VariantCall>,
}

impl ClinicalRecord {
    /// Copy of the record with a new phenotype list
    pub fn with_observations(&self, phenotype_observations: Vec<PhenotypeObservation>) -> Self {
        Self {
            phenotype_observations,
            ..self.clone()
        }
    }

    /// Copy of the record with a new variant list
    pub fn with_variants(&self, variant_calls: Vec<VariantCall>) -> Self {
        Self {
            variant_calls,
            ..self.clone()
        }
    }

    /// (observed, negated) counts of the phenotype list
    pub fn negation_counts(&self) -> (usize, usize) {
        let negated = self
            .phenotype_observations
            .iter()
            .filter(|o| o.negated)
            .count();
        (self.phenotype_observations.len() - negated, negated)
    }
}

/// Clinical significance of a reference variant (ClinVar CLNSIG)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathogenicityClass {
    Benign,
    LikelyBenign,
    Vus,
    LikelyPathogenic,
    Pathogenic,
    RiskFactor,
    Affects,
    Other,
}

/// Mode of inheritance inferred from a record's variant list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InheritanceMode {
    AutosomalRecessive,
    AutosomalDominant,
    /// Zero variants, or more than two
    Indeterminate,
}

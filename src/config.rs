// ==============================================================================
// config.rs - Obfuscation Strategy Configuration
// ==============================================================================
// Description: Validated, immutable strategy settings and run-mode selection
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// Mutually exclusive options are rejected once, when the configuration is
// built. Nothing downstream re-checks them.
// ==============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Invalid combination of obfuscation options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Cannot use --imprecision and --double-imprecision options at the same time")]
    ConflictingImprecision,

    #[error("Cannot use --match-noise with --n-alleles {0} (allele reduction must be 0)")]
    MatchNoiseWithAlleleReduction(u8),

    #[error("Invalid number of alleles to remove: {0} (must be 0, 1 or 2)")]
    InvalidAlleleCount(u8),

    #[error("Cannot use both --replace and --biallelic options at the same time")]
    BiallelicWithReplace,

    #[error("Sorting by mode of inheritance requires a ClinVar VCF (--clinvar)")]
    MissingReferenceVariants,
}

/// How many generations to move each term up the ontology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprecisionDepth {
    Parent,
    Grandparent,
}

/// How many noise terms to append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseSetting {
    None,
    Count(usize),
    /// As many noise terms as there are observations after the term transform
    MatchObservations,
}

/// Number of pathogenic alleles to take away from a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleReduction {
    /// Leave the variant list untouched
    Keep,
    /// Keep one heterozygous allele
    One,
    /// Drop all variants (unknown genotype)
    Both,
}

impl AlleleReduction {
    pub fn from_count(n_alleles: u8) -> Result<Self, ConfigurationError> {
        match n_alleles {
            0 => Ok(AlleleReduction::Keep),
            1 => Ok(AlleleReduction::One),
            2 => Ok(AlleleReduction::Both),
            n => Err(ConfigurationError::InvalidAlleleCount(n)),
        }
    }
}

/// Settings for the combined `obfuscate` pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObfuscationConfig {
    pub imprecision: Option<ImprecisionDepth>,
    pub noise: NoiseSetting,
    pub alleles: AlleleReduction,
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        Self {
            imprecision: None,
            noise: NoiseSetting::None,
            alleles: AlleleReduction::One,
        }
    }
}

impl ObfuscationConfig {
    /// Build a configuration from command-line style flags
    ///
    /// # Errors
    /// * both imprecision flags set
    /// * `match_noise` with a non-zero `n_alleles`
    /// * `n_alleles` outside 0..=2
    pub fn from_flags(
        imprecision: bool,
        double_imprecision: bool,
        n_noise: usize,
        match_noise: bool,
        n_alleles: u8,
    ) -> Result<Self, ConfigurationError> {
        let imprecision = match (imprecision, double_imprecision) {
            (true, true) => return Err(ConfigurationError::ConflictingImprecision),
            (true, false) => Some(ImprecisionDepth::Parent),
            (false, true) => Some(ImprecisionDepth::Grandparent),
            (false, false) => None,
        };

        let alleles = AlleleReduction::from_count(n_alleles)?;

        let noise = if match_noise {
            if alleles != AlleleReduction::Keep {
                return Err(ConfigurationError::MatchNoiseWithAlleleReduction(n_alleles));
            }
            NoiseSetting::MatchObservations
        } else if n_noise > 0 {
            NoiseSetting::Count(n_noise)
        } else {
            NoiseSetting::None
        };

        Ok(Self {
            imprecision,
            noise,
            alleles,
        })
    }
}

/// One strategy run and the bucket it writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Combined pipeline (imprecision -> noise -> allele reduction)
    Obfuscate(ObfuscationConfig),
    /// Recessive records only, reduced to one heterozygous allele
    Biallelic,
    /// Every phenotype term replaced by a random one
    ReplaceAll,
    /// Negated ("NOT") observations removed
    RemoveNegated,
}

/// What a batch run does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// A single strategy
    Single(Strategy),
    /// The fixed battery of benchmark obfuscations, one bucket each
    AllObfuscations,
    /// Original records sorted by inheritance mode and ClinVar membership
    SortByInheritance { clinvar: PathBuf },
}

/// Command-line flags that select the run mode
#[derive(Debug, Clone, Default)]
pub struct ModeFlags {
    pub sort_by_moi: bool,
    pub clinvar: Option<PathBuf>,
    pub output_all: bool,
    pub biallelic: bool,
    pub replace: bool,
    pub no_not: bool,
    pub imprecision: bool,
    pub double_imprecision: bool,
    pub n_noise: usize,
    pub match_noise: bool,
    pub n_alleles: u8,
}

/// Fully validated batch configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    pub phenopacket_dir: PathBuf,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
}

impl RunMode {
    /// Pick the run mode from flags
    ///
    /// Precedence: sort-by-moi, all obfuscations, biallelic, replace,
    /// no-not, then the parameterized pipeline.
    pub fn from_flags(flags: &ModeFlags) -> Result<Self, ConfigurationError> {
        if flags.biallelic && flags.replace {
            return Err(ConfigurationError::BiallelicWithReplace);
        }

        if flags.sort_by_moi {
            let clinvar = flags
                .clinvar
                .clone()
                .ok_or(ConfigurationError::MissingReferenceVariants)?;
            return Ok(RunMode::SortByInheritance { clinvar });
        }

        if flags.output_all {
            return Ok(RunMode::AllObfuscations);
        }

        let strategy = if flags.biallelic {
            Strategy::Biallelic
        } else if flags.replace {
            Strategy::ReplaceAll
        } else if flags.no_not {
            Strategy::RemoveNegated
        } else {
            Strategy::Obfuscate(ObfuscationConfig::from_flags(
                flags.imprecision,
                flags.double_imprecision,
                flags.n_noise,
                flags.match_noise,
                flags.n_alleles,
            )?)
        };

        Ok(RunMode::Single(strategy))
    }
}

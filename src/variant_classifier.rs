// ==============================================================================
// variant_classifier.rs - Inheritance Mode & Biallelic Reduction
// ==============================================================================
// Description: Classifies a record's genotype and collapses it to one allele
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Rules:
//   - 2 calls (compound heterozygous or two homozygous) -> autosomal recessive
//   - 1 homozygous call                                 -> autosomal recessive
//   - 1 heterozygous call                               -> autosomal dominant
//   - 0 calls or more than 2                            -> indeterminate
// ==============================================================================

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{InheritanceMode, VariantCall, Zygosity};

/// Decide the mode of inheritance from a record's variant calls
///
/// Zero-variant and more-than-two-variant records are reported as
/// [`InheritanceMode::Indeterminate`]; the caller decides where they go.
pub fn classify_inheritance(variants: &[VariantCall]) -> InheritanceMode {
    match variants {
        [_, _] => InheritanceMode::AutosomalRecessive,
        [single] if single.zygosity == Zygosity::Homozygous => InheritanceMode::AutosomalRecessive,
        [_] => InheritanceMode::AutosomalDominant,
        _ => InheritanceMode::Indeterminate,
    }
}

/// Reduce a set of calls to one heterozygous allele
///
/// A single call is kept as is; with several calls one is chosen uniformly
/// at random, so each compound-het allele is equally likely to survive. The
/// result carries the chosen call's chromosome, position, alleles and
/// assembly with zygosity forced to heterozygous.
///
/// Returns `None` for an empty list.
pub fn heterozygous_reduction<R: Rng + ?Sized>(
    variants: &[VariantCall],
    rng: &mut R,
) -> Option<VariantCall> {
    let chosen = match variants {
        [] => return None,
        [single] => single,
        many => many.choose(rng)?,
    };

    Some(chosen.with_zygosity(Zygosity::Heterozygous))
}

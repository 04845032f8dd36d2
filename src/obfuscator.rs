// ==============================================================================
// obfuscator.rs - Phenopacket Obfuscation Engine
// ==============================================================================
// Description: Imprecision, noise, replacement, NOT-removal and allele
//              reduction strategies over a clinical record
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// Every strategy takes the record by reference and returns a new record; the
// input is never modified. Randomness comes only from the `rng` argument so a
// seeded generator reproduces a run exactly.
//
// Pipeline order for `obfuscate`:
//   1. term transform (imprecision, depth 1 or 2)
//   2. noise append (count fixed, or matched to the list from step 1)
//   3. variant reduction (keep / one heterozygous allele / none)
// ==============================================================================

use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::config::{AlleleReduction, ImprecisionDepth, NoiseSetting, ObfuscationConfig};
use crate::models::{ClinicalRecord, PhenotypeObservation, PHENOTYPIC_ABNORMALITY};
use crate::ontology::{TermGraph, UnresolvedTermError};
use crate::variant_classifier::heterozygous_reduction;

/// Errors that abort the transformation of a single record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObfuscationError {
    #[error(transparent)]
    UnresolvedTerm(#[from] UnresolvedTermError),

    #[error("Cannot keep one allele of a record without variants")]
    EmptyVariantList,
}

/// Applies obfuscation strategies using a shared, read-only ontology
pub struct Obfuscator<'a> {
    graph: &'a TermGraph,
    /// (id, label) of every term under the phenotypic abnormality root
    noise_pool: Vec<(&'a str, &'a str)>,
}

impl<'a> Obfuscator<'a> {
    /// Create an engine over `graph`
    ///
    /// Fails if the ontology does not contain the phenotypic abnormality root.
    pub fn new(graph: &'a TermGraph) -> Result<Self, UnresolvedTermError> {
        let noise_pool = graph
            .descendants_of(PHENOTYPIC_ABNORMALITY)?
            .into_iter()
            .map(|id| Ok((id, graph.label_of(id)?)))
            .collect::<Result<Vec<_>, UnresolvedTermError>>()?;

        debug!("Noise pool holds {} phenotype terms", noise_pool.len());

        Ok(Self { graph, noise_pool })
    }

    /// Number of candidate noise terms
    pub fn noise_pool_size(&self) -> usize {
        self.noise_pool.len()
    }

    /// Replace every term with an ancestor `depth` generations up
    ///
    /// The negation flag is kept and the label is looked up for the new term.
    ///
    /// # Errors
    /// [`UnresolvedTermError`] if a term is unknown or has no parent.
    pub fn imprecision<R: Rng + ?Sized>(
        &self,
        record: &ClinicalRecord,
        depth: ImprecisionDepth,
        rng: &mut R,
    ) -> Result<ClinicalRecord, ObfuscationError> {
        let observations = record
            .phenotype_observations
            .iter()
            .map(|obs| self.ancestor(obs, depth, rng))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(record.with_observations(observations))
    }

    fn ancestor<R: Rng + ?Sized>(
        &self,
        obs: &PhenotypeObservation,
        depth: ImprecisionDepth,
        rng: &mut R,
    ) -> Result<PhenotypeObservation, UnresolvedTermError> {
        let parents = self.graph.parents_of(&obs.term_id)?;
        if parents.is_empty() {
            return Err(UnresolvedTermError::NoParents {
                id: obs.term_id.clone(),
                label: obs.label.clone(),
            });
        }

        let candidates = match depth {
            ImprecisionDepth::Parent => parents,
            ImprecisionDepth::Grandparent => {
                let mut seen = HashSet::new();
                let mut grandparents = Vec::new();
                for parent in &parents {
                    for gp in self.graph.parents_of(parent)? {
                        if seen.insert(gp) {
                            grandparents.push(gp);
                        }
                    }
                }
                // Only one generation available; settle for the parents
                if grandparents.is_empty() {
                    parents
                } else {
                    grandparents
                }
            }
        };

        let term_id = candidates[rng.gen_range(0..candidates.len())];
        let label = self.graph.label_of(term_id)?;

        Ok(PhenotypeObservation::new(term_id, label, obs.negated))
    }

    /// Draw `count` random phenotype terms, with replacement
    pub fn noise_terms<R: Rng + ?Sized>(
        &self,
        count: usize,
        negated: bool,
        rng: &mut R,
    ) -> Vec<PhenotypeObservation> {
        (0..count)
            .map(|_| {
                let (id, label) = self.noise_pool[rng.gen_range(0..self.noise_pool.len())];
                PhenotypeObservation::new(id, label, negated)
            })
            .collect()
    }

    /// Append `count` random terms to the phenotype list
    pub fn inject_noise<R: Rng + ?Sized>(
        &self,
        record: &ClinicalRecord,
        count: usize,
        negate: bool,
        rng: &mut R,
    ) -> ClinicalRecord {
        let mut observations = record.phenotype_observations.clone();
        observations.extend(self.noise_terms(count, negate, rng));
        record.with_observations(observations)
    }

    /// Swap every observation for a random term, keeping the observed/negated
    /// split. Observed noise terms come first, then negated ones.
    ///
    /// The variant list is dropped: a fully randomized record carries no
    /// genotype.
    pub fn replace_all<R: Rng + ?Sized>(&self, record: &ClinicalRecord, rng: &mut R) -> ClinicalRecord {
        let (n_observed, n_negated) = record.negation_counts();

        let mut observations = self.noise_terms(n_observed, false, rng);
        observations.extend(self.noise_terms(n_negated, true, rng));

        record.with_observations(observations).with_variants(Vec::new())
    }

    /// Drop every negated observation, keeping order
    pub fn remove_negated(&self, record: &ClinicalRecord) -> ClinicalRecord {
        let observations = record
            .phenotype_observations
            .iter()
            .filter(|o| !o.negated)
            .cloned()
            .collect();
        record.with_observations(observations)
    }

    /// Take pathogenic alleles away from the record
    ///
    /// * `Keep` - variants untouched
    /// * `One` - replaced by a single heterozygous call
    /// * `Both` - variant list cleared (genotype unknown, not "no alleles")
    pub fn reduce_variants<R: Rng + ?Sized>(
        &self,
        record: &ClinicalRecord,
        alleles: AlleleReduction,
        rng: &mut R,
    ) -> Result<ClinicalRecord, ObfuscationError> {
        match alleles {
            AlleleReduction::Keep => Ok(record.clone()),
            AlleleReduction::Both => Ok(record.with_variants(Vec::new())),
            AlleleReduction::One => self.biallelic(record, rng),
        }
    }

    /// Reduce the variant list to one heterozygous allele; phenotypes untouched
    pub fn biallelic<R: Rng + ?Sized>(
        &self,
        record: &ClinicalRecord,
        rng: &mut R,
    ) -> Result<ClinicalRecord, ObfuscationError> {
        let het = heterozygous_reduction(&record.variant_calls, rng)
            .ok_or(ObfuscationError::EmptyVariantList)?;
        Ok(record.with_variants(vec![het]))
    }

    /// Combined pipeline: term transform, then noise, then allele reduction
    pub fn obfuscate<R: Rng + ?Sized>(
        &self,
        record: &ClinicalRecord,
        config: &ObfuscationConfig,
        rng: &mut R,
    ) -> Result<ClinicalRecord, ObfuscationError> {
        let transformed = match config.imprecision {
            Some(depth) => self.imprecision(record, depth, rng)?,
            None => record.clone(),
        };

        let n_noise = match config.noise {
            NoiseSetting::None => 0,
            NoiseSetting::Count(n) => n,
            NoiseSetting::MatchObservations => transformed.phenotype_observations.len(),
        };

        let noisy = if n_noise > 0 {
            self.inject_noise(&transformed, n_noise, false, rng)
        } else {
            transformed
        };

        debug!(
            "Obfuscated {} -> {} observations ({} noise)",
            record.phenotype_observations.len(),
            noisy.phenotype_observations.len(),
            n_noise
        );

        self.reduce_variants(&noisy, config.alleles, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::test_support::hpo_fixture;
    use crate::models::{InheritanceMode, VariantCall, Zygosity};
    use crate::variant_classifier::classify_inheritance;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn graph() -> TermGraph {
        hpo_fixture()
    }

    fn variant(chr: &str, position: u64, zygosity: Zygosity) -> VariantCall {
        VariantCall {
            chromosome: chr.to_string(),
            position,
            ref_allele: "C".to_string(),
            alt_allele: "T".to_string(),
            genome_assembly: "GRCh38".to_string(),
            zygosity,
        }
    }

    fn record() -> ClinicalRecord {
        ClinicalRecord {
            subject: Some(serde_json::json!({ "id": "proband" })),
            diagnosis: Some(serde_json::json!({ "term": { "id": "OMIM:251200" } })),
            gene: Some(serde_json::json!({ "id": "ENTREZ:3832", "symbol": "KIF11" })),
            phenotype_observations: vec![
                PhenotypeObservation::new("HP:0001250", "Seizure", false),
                PhenotypeObservation::new("HP:0000252", "Microcephaly", true),
            ],
            variant_calls: vec![
                variant("chr7", 117559590, Zygosity::Heterozygous),
                variant("chr13", 32338160, Zygosity::Heterozygous),
            ],
        }
    }

    #[test]
    fn test_imprecision_parent() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let input = record();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let out = engine.imprecision(&input, ImprecisionDepth::Parent, &mut rng).unwrap();
            assert_eq!(out.phenotype_observations.len(), 2);

            assert_eq!(out.phenotype_observations[0].term_id, "HP:0012638");
            assert_eq!(out.phenotype_observations[0].label, "Abnormal nervous system physiology");
            assert!(!out.phenotype_observations[0].negated);

            let microcephaly_parents = g.parents_of("HP:0000252").unwrap();
            assert!(microcephaly_parents.contains(&out.phenotype_observations[1].term_id.as_str()));
            assert!(out.phenotype_observations[1].negated);
        }
        assert_eq!(input, record());
    }

    #[test]
    fn test_imprecision_grandparent() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let input = record();
        for _ in 0..20 {
            let out = engine.imprecision(&input, ImprecisionDepth::Grandparent, &mut rng).unwrap();
            assert_eq!(out.phenotype_observations.len(), input.phenotype_observations.len());
            assert_eq!(out.phenotype_observations[0].term_id, "HP:0000707");
            assert!(["HP:0000152", "HP:0000707"].contains(&out.phenotype_observations[1].term_id.as_str()));

            for (before, after) in input.phenotype_observations.iter().zip(&out.phenotype_observations) {
                assert_ne!(before.term_id, after.term_id);
                assert!(!g.parents_of(&before.term_id).unwrap().contains(&after.term_id.as_str()));
                assert_eq!(before.negated, after.negated);
            }
        }
    }

    #[test]
    fn test_imprecision_grandparent_falls_back_to_parent() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let input = record().with_observations(vec![PhenotypeObservation::new(
            "HP:0000707",
            "Abnormality of the nervous system",
            false,
        )]);

        let mut rng = StepRng::new(0, 0);
        let out = engine.imprecision(&input, ImprecisionDepth::Grandparent, &mut rng).unwrap();
        assert_eq!(out.phenotype_observations[0].term_id, "HP:0000118");
        assert_eq!(out.phenotype_observations[0].label, "Phenotypic abnormality");
    }

    #[test]
    fn test_imprecision_root_has_no_parent() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let input = record().with_observations(vec![PhenotypeObservation::new(
            "HP:0000118",
            "Phenotypic abnormality",
            false,
        )]);

        let err = engine
            .imprecision(&input, ImprecisionDepth::Parent, &mut StepRng::new(0, 0))
            .unwrap_err();
        assert_eq!(
            err,
            ObfuscationError::UnresolvedTerm(UnresolvedTermError::NoParents {
                id: "HP:0000118".to_string(),
                label: "Phenotypic abnormality".to_string(),
            })
        );
    }

    #[test]
    fn test_imprecision_unknown_term() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let input = record().with_observations(vec![PhenotypeObservation::new("HP:9999999", "Made up", false)]);

        let err = engine
            .imprecision(&input, ImprecisionDepth::Parent, &mut StepRng::new(0, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            ObfuscationError::UnresolvedTerm(UnresolvedTermError::UnknownTerm(_))
        ));
    }

    #[test]
    fn test_engine_requires_root() {
        let g = TermGraph::builder().term("HP:0001250", "Seizure").build();
        assert!(Obfuscator::new(&g).is_err());
    }

    #[test]
    fn test_inject_noise_appends_with_replacement() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        assert_eq!(engine.noise_pool_size(), 7);

        // a constant generator always picks the first pool entry
        let out = engine.inject_noise(&record(), 3, false, &mut StepRng::new(0, 0));
        assert_eq!(out.phenotype_observations.len(), 5);
        assert_eq!(&out.phenotype_observations[..2], &record().phenotype_observations[..]);
        for obs in &out.phenotype_observations[2..] {
            assert_eq!(obs, &PhenotypeObservation::new("HP:0000118", "Phenotypic abnormality", false));
        }

        let negated = engine.inject_noise(&record(), 2, true, &mut StdRng::seed_from_u64(3));
        assert!(negated.phenotype_observations[2..].iter().all(|o| o.negated));
    }

    #[test]
    fn test_replace_all_preserves_counts() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let mut input = record();
        input
            .phenotype_observations
            .push(PhenotypeObservation::new("HP:0000707", "Abnormality of the nervous system", false));

        let out = engine.replace_all(&input, &mut StdRng::seed_from_u64(5));
        assert_eq!(out.negation_counts(), (2, 1));
        assert!(!out.phenotype_observations[0].negated);
        assert!(out.phenotype_observations[2].negated);
        for obs in &out.phenotype_observations {
            assert!(g.contains(&obs.term_id));
            assert_eq!(g.label_of(&obs.term_id).unwrap(), obs.label);
        }
        assert!(out.variant_calls.is_empty());
        assert_eq!(out.gene, input.gene);
        assert_eq!(out.diagnosis, input.diagnosis);
    }

    #[test]
    fn test_replace_all_drops_variants() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let input = record()
            .with_observations(vec![PhenotypeObservation::new("HP:0001250", "Seizure", false)])
            .with_variants(vec![variant("chr7", 117559590, Zygosity::Homozygous)]);

        let out = engine.replace_all(&input, &mut StdRng::seed_from_u64(1));
        assert_eq!(out.phenotype_observations.len(), 1);
        assert!(out.variant_calls.is_empty());
        assert_eq!(input.variant_calls.len(), 1);
    }

    #[test]
    fn test_remove_negated_is_idempotent() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();

        let input = record().with_observations(vec![
            PhenotypeObservation::new("HP:0001250", "Seizure", false),
            PhenotypeObservation::new("HP:0000252", "Microcephaly", true),
            PhenotypeObservation::new("HP:0000707", "Abnormality of the nervous system", false),
            PhenotypeObservation::new("HP:0000234", "Abnormality of the head", true),
            PhenotypeObservation::new("HP:0012638", "Abnormal nervous system physiology", false),
        ]);

        let once = engine.remove_negated(&input);
        let expected: Vec<_> = input
            .phenotype_observations
            .iter()
            .filter(|o| !o.negated)
            .cloned()
            .collect();
        assert_eq!(once.phenotype_observations, expected);
        assert_eq!(
            once.phenotype_observations
                .iter()
                .map(|o| o.term_id.as_str())
                .collect::<Vec<_>>(),
            vec!["HP:0001250", "HP:0000707", "HP:0012638"]
        );
        assert_eq!(once.variant_calls, input.variant_calls);
        assert_eq!(engine.remove_negated(&once), once);
    }

    #[test]
    fn test_reduce_variants() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let kept = engine.reduce_variants(&record(), AlleleReduction::Keep, &mut rng).unwrap();
        assert_eq!(kept, record());

        let cleared = engine.reduce_variants(&record(), AlleleReduction::Both, &mut rng).unwrap();
        assert!(cleared.variant_calls.is_empty());
        assert_eq!(cleared.phenotype_observations, record().phenotype_observations);

        let empty = record().with_variants(Vec::new());
        assert_eq!(
            engine.reduce_variants(&empty, AlleleReduction::One, &mut rng),
            Err(ObfuscationError::EmptyVariantList)
        );
    }

    #[test]
    fn test_round_trip_scenario() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let input = record();

        assert_eq!(classify_inheritance(&input.variant_calls), InheritanceMode::AutosomalRecessive);

        let out = engine
            .reduce_variants(&input, AlleleReduction::One, &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(out.variant_calls.len(), 1);
        let kept = &out.variant_calls[0];
        assert!(input.variant_calls.iter().any(|v| v.key() == kept.key()));
        assert_eq!(kept.zygosity, Zygosity::Heterozygous);
        assert_eq!(out.subject, input.subject);
        assert_eq!(out.gene, input.gene);
    }

    #[test]
    fn test_obfuscate_match_noise_counts_after_transform() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let config = ObfuscationConfig::from_flags(true, false, 0, true, 0).unwrap();

        let out = engine.obfuscate(&record(), &config, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(out.phenotype_observations.len(), 4);
        assert_eq!(out.phenotype_observations[0].term_id, "HP:0012638");
        assert_eq!(out.variant_calls, record().variant_calls);
    }

    #[test]
    fn test_obfuscate_default_keeps_one_allele() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();

        let out = engine
            .obfuscate(&record(), &ObfuscationConfig::default(), &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(out.phenotype_observations, record().phenotype_observations);
        assert_eq!(out.variant_calls.len(), 1);
    }

    #[test]
    fn test_obfuscate_is_reproducible_with_seed() {
        let g = graph();
        let engine = Obfuscator::new(&g).unwrap();
        let config = ObfuscationConfig::from_flags(false, true, 3, false, 2).unwrap();

        let a = engine.obfuscate(&record(), &config, &mut StdRng::seed_from_u64(1234)).unwrap();
        let b = engine.obfuscate(&record(), &config, &mut StdRng::seed_from_u64(1234)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.phenotype_observations.len(), 5);
        assert!(a.variant_calls.is_empty());
    }
}

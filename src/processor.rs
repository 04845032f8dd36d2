// ==============================================================================
// processor.rs - Batch Obfuscation Driver
// ==============================================================================
// Description: Runs the selected strategies over a directory of phenopackets
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// A record that fails to parse, transform or write is logged, recorded in the
// manifest and skipped; the batch carries on with the next one.
// ==============================================================================

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clinvar::PathogenicVariantIndex;
use crate::config::{
    AlleleReduction, ImprecisionDepth, NoiseSetting, ObfuscationConfig, RunConfig, RunMode, Strategy,
};
use crate::manifest::{ManifestCounts, RunManifest};
use crate::models::{ClinicalRecord, InheritanceMode};
use crate::obfuscator::Obfuscator;
use crate::ontology::TermGraph;
use crate::output::{Bucket, OutputWriter};
use crate::parsers::PhenopacketParser;
use crate::variant_classifier::classify_inheritance;

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub inputs: usize,
    pub counts: ManifestCounts,
    pub manifest: PathBuf,
}

/// Strategies run by `--output-all-obfuscations`, with their buckets
pub fn obfuscation_battery() -> Vec<(Strategy, Bucket)> {
    let obfuscate = |imprecision, noise, alleles| {
        Strategy::Obfuscate(ObfuscationConfig {
            imprecision,
            noise,
            alleles,
        })
    };

    vec![
        (Strategy::Biallelic, Bucket::Biallelic),
        (Strategy::ReplaceAll, Bucket::AllTermsRandomized),
        (Strategy::RemoveNegated, Bucket::NoNot),
        (
            obfuscate(None, NoiseSetting::Count(2), AlleleReduction::Keep),
            Bucket::Noise2,
        ),
        (
            obfuscate(Some(ImprecisionDepth::Parent), NoiseSetting::Count(2), AlleleReduction::Keep),
            Bucket::Noise2Imprecision,
        ),
        (
            obfuscate(Some(ImprecisionDepth::Grandparent), NoiseSetting::Count(2), AlleleReduction::Keep),
            Bucket::Noise2DoubleImprecision,
        ),
        (
            obfuscate(None, NoiseSetting::None, AlleleReduction::Both),
            Bucket::Remove2Alleles,
        ),
        (
            obfuscate(Some(ImprecisionDepth::Parent), NoiseSetting::Count(2), AlleleReduction::Both),
            Bucket::Remove2AlleleNoise2Imprecision,
        ),
    ]
}

/// Bucket a single strategy writes to
fn single_bucket(strategy: &Strategy) -> Bucket {
    match strategy {
        Strategy::Obfuscate(_) => Bucket::Obfuscated,
        Strategy::Biallelic => Bucket::Biallelic,
        Strategy::ReplaceAll => Bucket::AllTermsRandomized,
        Strategy::RemoveNegated => Bucket::NoNot,
    }
}

/// Phenopacket files directly inside `dir`, sorted by name
pub fn list_phenopackets(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Phenopacket directory not found: {:?}", dir);
    }

    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to read phenopacket directory {:?}", dir))?;
        let path = entry.path();

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if entry.file_type().is_file() && is_json {
            files.push(path.to_path_buf());
        } else {
            debug!("Ignoring {:?}", path);
        }
    }

    Ok(files)
}

pub struct BatchProcessor<'a> {
    config: RunConfig,
    obfuscator: Obfuscator<'a>,
    writer: OutputWriter,
    rng: StdRng,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(graph: &'a TermGraph, config: RunConfig) -> Result<Self> {
        let obfuscator = Obfuscator::new(graph).context("Ontology has no phenotypic abnormality root")?;

        let rng = match config.seed {
            Some(seed) => {
                info!("Using random seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        let writer = OutputWriter::new(config.output_dir.clone());

        Ok(Self {
            config,
            obfuscator,
            writer,
            rng,
        })
    }

    /// Main processing pipeline
    pub fn run(&mut self) -> Result<BatchSummary> {
        let inputs = list_phenopackets(&self.config.phenopacket_dir)?;
        info!(
            "Found {} phenopackets in {:?}",
            inputs.len(),
            self.config.phenopacket_dir
        );

        let mut manifest = RunManifest::create(self.writer.root())?;
        let run_id = manifest.run_id();
        let manifest_path = manifest.path().to_path_buf();

        match self.config.mode.clone() {
            RunMode::Single(strategy) => {
                let bucket = single_bucket(&strategy);
                info!("Running {} over {} records", bucket, inputs.len());
                self.run_strategies(&[(strategy, bucket)], &inputs, &mut manifest)?;
            }
            RunMode::AllObfuscations => {
                info!("Running all obfuscations over {} records", inputs.len());
                self.run_strategies(&obfuscation_battery(), &inputs, &mut manifest)?;
            }
            RunMode::SortByInheritance { clinvar } => {
                info!("Loading ClinVar variants from {:?}", clinvar);
                let index = PathogenicVariantIndex::open(&clinvar)
                    .with_context(|| format!("Failed to load ClinVar file {:?}", clinvar))?;
                self.sort_by_inheritance(&index, &inputs, &mut manifest)?;
            }
        }

        let counts = manifest.finish()?;
        info!(
            "Run {} complete: {} written, {} skipped, {} failed",
            run_id, counts.written, counts.skipped, counts.failed
        );

        Ok(BatchSummary {
            run_id,
            inputs: inputs.len(),
            counts,
            manifest: manifest_path,
        })
    }

    fn run_strategies(
        &mut self,
        strategies: &[(Strategy, Bucket)],
        inputs: &[PathBuf],
        manifest: &mut RunManifest,
    ) -> Result<()> {
        for input in inputs {
            let record = match PhenopacketParser::parse(input)
                .with_context(|| format!("Failed to read phenopacket {:?}", input))
            {
                Ok(record) => record,
                Err(e) => {
                    warn!("{:#}", e);
                    manifest.failed(None, input, &e)?;
                    continue;
                }
            };

            for (strategy, bucket) in strategies {
                if let Err(e) = self.apply(strategy, *bucket, input, &record, manifest) {
                    warn!("{} failed for {:?}: {:#}", bucket, input, e);
                    manifest.failed(Some(*bucket), input, &e)?;
                }
            }
        }

        Ok(())
    }

    fn apply(
        &mut self,
        strategy: &Strategy,
        bucket: Bucket,
        input: &Path,
        record: &ClinicalRecord,
        manifest: &mut RunManifest,
    ) -> Result<()> {
        let obfuscated = match strategy {
            Strategy::Biallelic => {
                let mode = classify_inheritance(&record.variant_calls);
                if mode != InheritanceMode::AutosomalRecessive {
                    debug!("Skipping {:?} for biallelic obfuscation: {:?}", input, mode);
                    return manifest.skipped(Some(bucket), input, "not autosomal recessive");
                }

                let copy = self.writer.copy_original(Bucket::BiallelicNonObfuscated, input)?;
                manifest.written(Bucket::BiallelicNonObfuscated, input, &copy)?;

                self.obfuscator.biallelic(record, &mut self.rng)?
            }
            Strategy::ReplaceAll => self.obfuscator.replace_all(record, &mut self.rng),
            Strategy::RemoveNegated => self.obfuscator.remove_negated(record),
            Strategy::Obfuscate(config) => self.obfuscator.obfuscate(record, config, &mut self.rng)?,
        };

        let path = self.writer.write_record(bucket, input, &obfuscated)?;
        manifest.written(bucket, input, &path)
    }

    fn sort_by_inheritance(
        &mut self,
        index: &PathogenicVariantIndex,
        inputs: &[PathBuf],
        manifest: &mut RunManifest,
    ) -> Result<()> {
        for input in inputs {
            let record = match PhenopacketParser::parse(input)
                .with_context(|| format!("Failed to read phenopacket {:?}", input))
            {
                Ok(record) => record,
                Err(e) => {
                    warn!("{:#}", e);
                    manifest.failed(None, input, &e)?;
                    continue;
                }
            };

            let in_clinvar = index.contains_pathogenic(&record);
            let bucket = match (classify_inheritance(&record.variant_calls), in_clinvar) {
                (InheritanceMode::AutosomalRecessive, true) => Bucket::MoiRecessiveClinvar,
                (InheritanceMode::AutosomalRecessive, false) => Bucket::MoiRecessiveNoClinvar,
                (InheritanceMode::AutosomalDominant, true) => Bucket::MoiDominantClinvar,
                (InheritanceMode::AutosomalDominant, false) => Bucket::MoiDominantNoClinvar,
                (InheritanceMode::Indeterminate, _) => {
                    info!(
                        "Skipping {:?}: {} variants, mode of inheritance indeterminate",
                        input,
                        record.variant_calls.len()
                    );
                    manifest.skipped(None, input, "indeterminate mode of inheritance")?;
                    continue;
                }
            };

            match self.writer.copy_original(bucket, input) {
                Ok(path) => manifest.written(bucket, input, &path)?,
                Err(e) => {
                    warn!("{} failed for {:?}: {:#}", bucket, input, e);
                    manifest.failed(Some(bucket), input, &e)?;
                }
            }
        }

        Ok(())
    }
}

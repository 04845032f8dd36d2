// ==============================================================================
// output.rs - Output Buckets & Record Writer
// ==============================================================================
// Description: Named output directories, output file naming and writing of
//              obfuscated phenopackets
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::ClinicalRecord;
use crate::parsers::PhenopacketParser;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("Input file has no name: {0}")]
    MissingFileName(String),

    #[error("Input file name has no extension: {0}")]
    MissingExtension(String),
}

/// Output directory a strategy writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Parameterized pipeline
    Obfuscated,
    Biallelic,
    /// Untouched copies of the records that went through `Biallelic`
    BiallelicNonObfuscated,
    AllTermsRandomized,
    NoNot,
    Noise2,
    Noise2Imprecision,
    Noise2DoubleImprecision,
    Remove2Alleles,
    Remove2AlleleNoise2Imprecision,
    MoiRecessiveClinvar,
    MoiRecessiveNoClinvar,
    MoiDominantClinvar,
    MoiDominantNoClinvar,
}

impl Bucket {
    /// Directory name under the output root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Bucket::Obfuscated => "OBFUSCATED",
            Bucket::Biallelic => "BIALLELIC",
            Bucket::BiallelicNonObfuscated => "BIALLELIC_NON_OBFUSCATED",
            Bucket::AllTermsRandomized => "ALLTERMS_RANDOMIZED",
            Bucket::NoNot => "NO_NOT",
            Bucket::Noise2 => "NOISE_2",
            Bucket::Noise2Imprecision => "NOISE_2_IMPRECISION",
            Bucket::Noise2DoubleImprecision => "NOISE_2_DOUBLEIMPRECISION",
            Bucket::Remove2Alleles => "REMOVE_2_ALLELES",
            Bucket::Remove2AlleleNoise2Imprecision => "REMOVE_2_ALLELE_NOISE_2_IMPRECISION",
            Bucket::MoiRecessiveClinvar => "MOI_RECESSIVE_CLINVAR",
            Bucket::MoiRecessiveNoClinvar => "MOI_RECESSIVE_NO_CLINVAR",
            Bucket::MoiDominantClinvar => "MOI_DOMINANT_CLINVAR",
            Bucket::MoiDominantNoClinvar => "MOI_DOMINANT_NO_CLINVAR",
        }
    }

    /// Suffix inserted before the extension of output files, if any
    pub fn file_suffix(&self) -> Option<&'static str> {
        match self {
            Bucket::Biallelic => Some("_biallelic_obfuscated"),
            Bucket::AllTermsRandomized => Some("_terms_replaced_obfuscated"),
            Bucket::NoNot => Some("_nots_removed"),
            _ => None,
        }
    }

    /// Output file name for `input` in this bucket
    pub fn output_file_name(&self, input: &Path) -> Result<String, OutputError> {
        output_file_name(input, self.file_suffix())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Build an output file name: `<stem><suffix>.<ext>`
///
/// # Errors
/// The input name has no extension (`phenopacket` rather than `phenopacket.json`).
pub fn output_file_name(input: &Path, suffix: Option<&str>) -> Result<String, OutputError> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| OutputError::MissingFileName(input.display().to_string()))?;

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => return Err(OutputError::MissingExtension(file_name)),
    };

    Ok(format!("{}{}.{}", stem, suffix.unwrap_or(""), ext))
}

/// Writes records into bucket directories below an output root
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.dir_name())
    }

    /// Create the bucket directory (and the root) if missing
    pub fn prepare(&self, bucket: Bucket) -> Result<PathBuf> {
        let dir = self.bucket_dir(bucket);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
        debug!("Output directory ready: {:?}", dir);
        Ok(dir)
    }

    /// Serialize `record` into `bucket`, naming the file after `input`
    pub fn write_record(&self, bucket: Bucket, input: &Path, record: &ClinicalRecord) -> Result<PathBuf> {
        let file_name = bucket.output_file_name(input)?;
        let path = self.prepare(bucket)?.join(file_name);

        PhenopacketParser::write(record, &path)
            .with_context(|| format!("Failed to write phenopacket {:?}", path))?;

        info!("Wrote {:?}", path);
        Ok(path)
    }

    /// Copy `input` byte for byte into `bucket`, keeping its name
    pub fn copy_original(&self, bucket: Bucket, input: &Path) -> Result<PathBuf> {
        let file_name = output_file_name(input, None)?;
        let path = self.prepare(bucket)?.join(file_name);

        std::fs::copy(input, &path)
            .with_context(|| format!("Failed to copy {:?} to {:?}", input, path))?;

        debug!("Copied original {:?} -> {:?}", input, path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhenotypeObservation;
    use tempfile::TempDir;

    #[test]
    fn test_bucket_dir_names() {
        assert_eq!(Bucket::Biallelic.dir_name(), "BIALLELIC");
        assert_eq!(Bucket::Noise2DoubleImprecision.to_string(), "NOISE_2_DOUBLEIMPRECISION");
        assert_eq!(
            Bucket::Remove2AlleleNoise2Imprecision.dir_name(),
            "REMOVE_2_ALLELE_NOISE_2_IMPRECISION"
        );
    }

    #[test]
    fn test_output_file_name() {
        let input = Path::new("/data/PMID_1234_proband.json");
        assert_eq!(
            Bucket::Biallelic.output_file_name(input).unwrap(),
            "PMID_1234_proband_biallelic_obfuscated.json"
        );
        assert_eq!(
            Bucket::AllTermsRandomized.output_file_name(input).unwrap(),
            "PMID_1234_proband_terms_replaced_obfuscated.json"
        );
        assert_eq!(
            Bucket::NoNot.output_file_name(input).unwrap(),
            "PMID_1234_proband_nots_removed.json"
        );
        assert_eq!(
            Bucket::Noise2.output_file_name(input).unwrap(),
            "PMID_1234_proband.json"
        );

        // only the last extension is split off
        assert_eq!(
            output_file_name(Path::new("case.v2.json"), Some("_x")).unwrap(),
            "case.v2_x.json"
        );
    }

    #[test]
    fn test_output_file_name_without_extension() {
        assert_eq!(
            output_file_name(Path::new("/data/phenopacket"), Some("_nots_removed")),
            Err(OutputError::MissingExtension("phenopacket".to_string()))
        );
        assert!(output_file_name(Path::new(".json"), None).is_err());
    }

    #[test]
    fn test_write_and_copy() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path().join("out"));

        let input = dir.path().join("case.json");
        std::fs::write(&input, "{\"id\": \"case\"}").unwrap();

        let record = ClinicalRecord {
            phenotype_observations: vec![PhenotypeObservation::new("HP:0001250", "Seizure", false)],
            ..Default::default()
        };

        let written = writer.write_record(Bucket::NoNot, &input, &record).unwrap();
        assert_eq!(written, dir.path().join("out/NO_NOT/case_nots_removed.json"));
        let parsed = PhenopacketParser::parse(&written).unwrap();
        assert_eq!(parsed.phenotype_observations, record.phenotype_observations);

        let copied = writer.copy_original(Bucket::BiallelicNonObfuscated, &input).unwrap();
        assert_eq!(std::fs::read_to_string(copied).unwrap(), "{\"id\": \"case\"}");
    }
}

// ==============================================================================
// clinvar.rs - Pathogenic Variant Reference Index
// ==============================================================================
// Description: Set of ClinVar variant keys used to bucket records by whether
//              their variants are independently known
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// Format: VCF body lines (tab-delimited), '#' lines ignored
//   #CHROM  POS     ID    REF  ALT  QUAL  FILTER  INFO
//   1       925952  rs1   G    A    .     .       ALLELEID=1003021;CLNSIG=Uncertain_significance
// ==============================================================================
// Malformed lines are skipped and counted, never fatal. Unrecognized CLNSIG
// values map to Other; each distinct value is warned about once.
// ==============================================================================

use csv::ReaderBuilder;
use flate2::read::MultiGzDecoder;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{ClinicalRecord, PathogenicityClass, VariantKey};

/// Minimum number of VCF columns needed (CHROM..INFO)
const REQUIRED_COLUMNS: usize = 8;

/// Errors that can occur while loading the reference file
#[derive(Error, Debug)]
pub enum ClinvarError {
    #[error("Failed to open reference VCF {path}: {source}")]
    FileOpenError {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error while reading reference VCF: {0}")]
    IoError(#[from] csv::Error),
}

/// Known reference variants keyed by (chromosome, position, REF, ALT)
#[derive(Debug, Clone, Default)]
pub struct PathogenicVariantIndex {
    variants: HashMap<VariantKey, PathogenicityClass>,
    skipped_lines: usize,
    unrecognized: BTreeSet<String>,
}

impl PathogenicVariantIndex {
    /// Build the index from VCF text lines
    pub fn build<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();

        for (line_idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            index.insert_fields(&fields, line_idx + 1);
        }

        index
    }

    /// Build the index from a VCF stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ClinvarError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut index = Self::default();

        for (record_idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let fields: Vec<&str> = record.iter().collect();
                    let line = record
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(record_idx + 1);
                    index.insert_fields(&fields, line);
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable reference line: {}", e);
                    index.skipped_lines += 1;
                }
            }
        }

        Ok(index)
    }

    /// Load a reference VCF (plain, or gzip/bgzip when the name ends in .gz)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClinvarError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClinvarError::FileOpenError {
            path: path.display().to_string(),
            source,
        })?;

        let index = if path.extension().is_some_and(|ext| ext == "gz") {
            Self::from_reader(MultiGzDecoder::new(file))?
        } else {
            Self::from_reader(file)?
        };

        info!(
            "Loaded {} reference variants from {} ({} lines skipped)",
            index.len(),
            path.display(),
            index.skipped_lines
        );

        Ok(index)
    }

    fn insert_fields(&mut self, fields: &[&str], line: usize) {
        if fields.len() < REQUIRED_COLUMNS {
            warn!(
                "Skipping reference line {}: expected at least {} columns, found {}",
                line,
                REQUIRED_COLUMNS,
                fields.len()
            );
            self.skipped_lines += 1;
            return;
        }

        let Ok(position) = fields[1].trim().parse::<u64>() else {
            warn!("Skipping reference line {}: invalid position '{}'", line, fields[1]);
            self.skipped_lines += 1;
            return;
        };

        let significance = match clnsig_value(fields[7]) {
            None => PathogenicityClass::Benign,
            Some(value) => classify_clnsig(value).unwrap_or_else(|| {
                if self.unrecognized.insert(value.to_ascii_uppercase()) {
                    warn!("Unrecognized CLNSIG value '{}', treating as Other", value);
                }
                PathogenicityClass::Other
            }),
        };

        let key = VariantKey::new(fields[0], position, fields[3], fields[4]);
        self.variants.insert(key, significance);
    }

    /// Whether the key was seen in the reference set (any significance)
    pub fn contains(&self, key: &VariantKey) -> bool {
        self.variants.contains_key(key)
    }

    /// Whether any of the record's variants appears in the reference set
    ///
    /// Membership alone counts; the stored significance is not consulted.
    /// Use [`significance`](Self::significance) for stricter routing.
    pub fn contains_pathogenic(&self, record: &ClinicalRecord) -> bool {
        record
            .variant_calls
            .iter()
            .any(|v| self.contains(&v.key()))
    }

    pub fn significance(&self, key: &VariantKey) -> Option<PathogenicityClass> {
        self.variants.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Lines dropped for missing columns or an unparseable position
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Distinct CLNSIG values that mapped to Other (upper-cased)
    pub fn unrecognized_significance(&self) -> impl Iterator<Item = &str> {
        self.unrecognized.iter().map(String::as_str)
    }
}

/// Value of the first CLNSIG key in a ';'-separated INFO column
fn clnsig_value(info: &str) -> Option<&str> {
    info.split(';').find_map(|field| {
        let (key, value) = field.split_once('=')?;
        key.trim().eq_ignore_ascii_case("CLNSIG").then_some(value.trim())
    })
}

/// Map a CLNSIG value to its class; `None` if the value is not recognized
pub fn classify_clnsig(value: &str) -> Option<PathogenicityClass> {
    let class = match value.to_ascii_uppercase().as_str() {
        "BENIGN" => PathogenicityClass::Benign,
        "LIKELY_BENIGN" | "BENIGN/LIKELY_BENIGN" => PathogenicityClass::LikelyBenign,
        "PATHOGENIC" | "PATHOGENIC,_RISK_FACTOR" => PathogenicityClass::Pathogenic,
        "LIKELY_PATHOGENIC" | "PATHOGENIC/LIKELY_PATHOGENIC" => PathogenicityClass::LikelyPathogenic,
        "UNCERTAIN_SIGNIFICANCE"
        | "CONFLICTING_INTERPRETATIONS_OF_PATHOGENICITY"
        | "NOT_PROVIDED" => PathogenicityClass::Vus,
        "RISK_FACTOR" => PathogenicityClass::RiskFactor,
        "AFFECTS" | "ASSOCIATION" => PathogenicityClass::Affects,
        other => {
            debug!("No class for CLNSIG '{}'", other);
            return None;
        }
    };
    Some(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VariantCall, Zygosity};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    const REFERENCE: &str = "\
##fileformat=VCFv4.1
##source=ClinVar
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr1\t100\trs1\tA\tG\t.\t.\tCLNSIG=Pathogenic
7\t117559590\t7105\tATCT\tA\t.\t.\tALLELEID=22155;CLNSIG=Pathogenic/Likely_pathogenic;GENEINFO=CFTR:1080
13\t32338160\t9325\tG\tT\t.\t.\tALLELEID=24364;clnsig=risk_factor
2\t500\t11\tC\tT\t.\t.\tALLELEID=1
3\t600\t12\tC\tT\t.\t.\tCLNSIG=drug_response
4\tnot_a_number\t13\tC\tT\t.\t.\tCLNSIG=Benign
5\t700\t14\tC
";

    fn record_with(chr: &str, position: u64, r: &str, a: &str) -> ClinicalRecord {
        ClinicalRecord {
            variant_calls: vec![VariantCall {
                chromosome: chr.to_string(),
                position,
                ref_allele: r.to_string(),
                alt_allele: a.to_string(),
                genome_assembly: "GRCh38".to_string(),
                zygosity: Zygosity::Heterozygous,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_and_query() {
        let index = PathogenicVariantIndex::build(["chr1\t100\trs1\tA\tG\t.\t.\tCLNSIG=Pathogenic"]);

        assert!(index.contains_pathogenic(&record_with("chr1", 100, "A", "G")));
        assert!(!index.contains_pathogenic(&record_with("chr1", 100, "C", "T")));
    }

    #[test]
    fn test_build_from_lines_skips_malformed() {
        let index = PathogenicVariantIndex::build(REFERENCE.lines());

        assert_eq!(index.len(), 5);
        assert_eq!(index.skipped_lines(), 2);
    }

    #[test]
    fn test_significance_mapping() {
        let index = PathogenicVariantIndex::build(REFERENCE.lines());

        let sig = |c: &str, p: u64, r: &str, a: &str| index.significance(&VariantKey::new(c, p, r, a));
        assert_eq!(sig("1", 100, "A", "G"), Some(PathogenicityClass::Pathogenic));
        assert_eq!(sig("chr7", 117559590, "ATCT", "A"), Some(PathogenicityClass::LikelyPathogenic));
        assert_eq!(sig("13", 32338160, "G", "T"), Some(PathogenicityClass::RiskFactor));
        // absent key defaults to benign
        assert_eq!(sig("2", 500, "C", "T"), Some(PathogenicityClass::Benign));
        assert_eq!(sig("3", 600, "C", "T"), Some(PathogenicityClass::Other));

        let unknown: Vec<&str> = index.unrecognized_significance().collect();
        assert_eq!(unknown, vec!["DRUG_RESPONSE"]);
    }

    #[test]
    fn test_membership_ignores_significance() {
        let index = PathogenicVariantIndex::build(REFERENCE.lines());
        // benign by default, still a member
        assert!(index.contains_pathogenic(&record_with("chr2", 500, "C", "T")));
    }

    #[test]
    fn test_classify_clnsig_table() {
        assert_eq!(classify_clnsig("Benign"), Some(PathogenicityClass::Benign));
        assert_eq!(classify_clnsig("Benign/Likely_benign"), Some(PathogenicityClass::LikelyBenign));
        assert_eq!(classify_clnsig("Pathogenic,_risk_factor"), Some(PathogenicityClass::Pathogenic));
        assert_eq!(
            classify_clnsig("Conflicting_interpretations_of_pathogenicity"),
            Some(PathogenicityClass::Vus)
        );
        assert_eq!(classify_clnsig("not_provided"), Some(PathogenicityClass::Vus));
        assert_eq!(classify_clnsig("association"), Some(PathogenicityClass::Affects));
        assert_eq!(classify_clnsig("protective"), None);
    }

    #[test]
    fn test_from_reader_matches_build() {
        let index = PathogenicVariantIndex::from_reader(REFERENCE.as_bytes()).unwrap();
        assert_eq!(index.len(), 5);
        assert_eq!(index.skipped_lines(), 2);
        assert!(index.contains(&VariantKey::new("7", 117559590, "ATCT", "A")));
    }

    #[test]
    fn test_open_plain_and_gzip() {
        let dir = tempdir().unwrap();

        let plain = dir.path().join("clinvar.vcf");
        std::fs::write(&plain, REFERENCE).unwrap();
        assert_eq!(PathogenicVariantIndex::open(&plain).unwrap().len(), 5);

        let gz = dir.path().join("clinvar.vcf.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(REFERENCE.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(PathogenicVariantIndex::open(&gz).unwrap().len(), 5);
    }

    #[test]
    fn test_open_missing_file() {
        let result = PathogenicVariantIndex::open("/nonexistent/clinvar.vcf");
        assert!(matches!(result, Err(ClinvarError::FileOpenError { .. })));
    }
}

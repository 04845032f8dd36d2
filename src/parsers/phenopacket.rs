// ==============================================================================
// parsers/phenopacket.rs - Phenopacket JSON Import/Export
// ==============================================================================
// Description: Reads and writes GA4GH phenopacket (v1) JSON records
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Format: protobuf JSON mapping of org.phenopackets.schema.v1.Phenopacket
// Example:
//   {
//     "subject": { "id": "proband A" },
//     "phenotypicFeatures": [
//       { "type": { "id": "HP:0001250", "label": "Seizure" } },
//       { "type": { "id": "HP:0000252", "label": "Microcephaly" }, "negated": true }
//     ],
//     "diseases": [ { "term": { "id": "OMIM:219700", "label": "Cystic fibrosis" } } ],
//     "genes": [ { "id": "ENTREZ:1080", "symbol": "CFTR" } ],
//     "variants": [ {
//       "vcfAllele": { "genomeAssembly": "GRCh38", "chr": "7", "pos": 117559590,
//                      "ref": "ATCT", "alt": "A" },
//       "zygosity": { "id": "GENO:0000136", "label": "homozygous" }
//     } ]
//   }
// ==============================================================================
// Only the first disease and first gene are kept, as opaque JSON. Fields
// outside subject/phenotypicFeatures/diseases/genes/variants are not carried
// into the exported record.
// ==============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::models::{ClinicalRecord, PhenotypeObservation, VariantCall, Zygosity};

/// Errors that can occur while reading or writing a phenopacket
#[derive(Error, Debug)]
pub enum PhenopacketError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid phenopacket JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Variant {index} has no vcfAllele")]
    MissingVcfAllele { index: usize },

    #[error("Variant {index} has unsupported zygosity '{zygosity}'")]
    UnsupportedZygosity { index: usize, zygosity: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OntologyClassJson {
    id: String,

    #[serde(default)]
    label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhenotypicFeatureJson {
    #[serde(rename = "type")]
    term: OntologyClassJson,

    #[serde(default, skip_serializing_if = "is_false")]
    negated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VcfAlleleJson {
    #[serde(default, alias = "genome_assembly")]
    genome_assembly: String,

    chr: String,

    pos: u64,

    #[serde(rename = "ref")]
    ref_allele: String,

    alt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantJson {
    #[serde(default, alias = "vcf_allele", skip_serializing_if = "Option::is_none")]
    vcf_allele: Option<VcfAlleleJson>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    zygosity: Option<OntologyClassJson>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhenopacketJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<Value>,

    #[serde(default, alias = "phenotypic_features", skip_serializing_if = "Vec::is_empty")]
    phenotypic_features: Vec<PhenotypicFeatureJson>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diseases: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    genes: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    variants: Vec<VariantJson>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Phenopacket JSON reader/writer
pub struct PhenopacketParser;

impl PhenopacketParser {
    /// Read one phenopacket file into a [`ClinicalRecord`]
    pub fn parse(path: impl AsRef<Path>) -> Result<ClinicalRecord, PhenopacketError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::parse_str(&contents)
    }

    /// Parse phenopacket JSON text
    pub fn parse_str(json: &str) -> Result<ClinicalRecord, PhenopacketError> {
        let packet: PhenopacketJson = serde_json::from_str(json)?;

        let phenotype_observations = packet
            .phenotypic_features
            .into_iter()
            .map(|f| PhenotypeObservation::new(f.term.id, f.term.label, f.negated))
            .collect();

        let variant_calls = packet
            .variants
            .into_iter()
            .enumerate()
            .map(|(index, v)| Self::variant_call(index, v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ClinicalRecord {
            subject: packet.subject,
            diagnosis: packet.diseases.into_iter().next(),
            gene: packet.genes.into_iter().next(),
            phenotype_observations,
            variant_calls,
        })
    }

    fn variant_call(index: usize, variant: VariantJson) -> Result<VariantCall, PhenopacketError> {
        let allele = variant
            .vcf_allele
            .ok_or(PhenopacketError::MissingVcfAllele { index })?;

        let zygosity_id = variant.zygosity.map(|z| z.id).unwrap_or_default();
        let zygosity = Zygosity::from_geno_id(&zygosity_id).ok_or_else(|| {
            PhenopacketError::UnsupportedZygosity {
                index,
                zygosity: zygosity_id.clone(),
            }
        })?;

        Ok(VariantCall {
            chromosome: allele.chr,
            position: allele.pos,
            ref_allele: allele.ref_allele,
            alt_allele: allele.alt,
            genome_assembly: allele.genome_assembly,
            zygosity,
        })
    }

    /// Serialize a record to pretty-printed phenopacket JSON
    pub fn to_json(record: &ClinicalRecord) -> Result<String, PhenopacketError> {
        let packet = PhenopacketJson {
            subject: record.subject.clone(),
            phenotypic_features: record
                .phenotype_observations
                .iter()
                .map(|o| PhenotypicFeatureJson {
                    term: OntologyClassJson {
                        id: o.term_id.clone(),
                        label: o.label.clone(),
                    },
                    negated: o.negated,
                })
                .collect(),
            diseases: record.diagnosis.iter().cloned().collect(),
            genes: record.gene.iter().cloned().collect(),
            variants: record
                .variant_calls
                .iter()
                .map(|v| VariantJson {
                    vcf_allele: Some(VcfAlleleJson {
                        genome_assembly: v.genome_assembly.clone(),
                        chr: v.chromosome.clone(),
                        pos: v.position,
                        ref_allele: v.ref_allele.clone(),
                        alt: v.alt_allele.clone(),
                    }),
                    zygosity: Some(OntologyClassJson {
                        id: v.zygosity.geno_id().to_string(),
                        label: v.zygosity.label().to_string(),
                    }),
                })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&packet)?)
    }

    /// Serialize a record and write it to `path`
    pub fn write(record: &ClinicalRecord, path: impl AsRef<Path>) -> Result<(), PhenopacketError> {
        let json = Self::to_json(record)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

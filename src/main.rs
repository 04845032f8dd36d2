// ==============================================================================
// main.rs - Phenopacket Obfuscator Entry Point
// ==============================================================================
// Description: Command-line driver for batch phenopacket obfuscation
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pheno_obfuscator::config::{ModeFlags, RunConfig, RunMode};
use pheno_obfuscator::parsers::OboParser;
use pheno_obfuscator::processor::BatchProcessor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to hp.obo
    #[arg(long)]
    hpo: PathBuf,

    /// Directory containing phenopacket JSON files
    #[arg(short, long)]
    phenopacket: PathBuf,

    /// Output root directory (one subdirectory per obfuscation)
    #[arg(long, default_value = "obfuscated")]
    out: PathBuf,

    /// Reduce recessive cases to a single heterozygous allele
    #[arg(long)]
    biallelic: bool,

    /// Number of pathogenic alleles to remove (0, 1 or 2)
    #[arg(long, default_value_t = 1)]
    n_alleles: u8,

    /// Replace each term with a parent term
    #[arg(long)]
    imprecision: bool,

    /// Replace each term with a grandparent term
    #[arg(long)]
    double_imprecision: bool,

    /// Number of random noise terms to add
    #[arg(long, default_value_t = 0)]
    n_noise: usize,

    /// Add as many noise terms as there are phenotype terms
    #[arg(long)]
    match_noise: bool,

    /// Replace every term with a random term
    #[arg(long)]
    replace: bool,

    /// Remove negated (excluded) terms
    #[arg(long)]
    no_not: bool,

    /// Run the full battery of obfuscations, one output directory each
    #[arg(long)]
    output_all_obfuscations: bool,

    /// Sort phenopackets by mode of inheritance and ClinVar membership
    #[arg(long)]
    sort_by_moi: bool,

    /// ClinVar VCF (plain or gzipped), required with --sort-by-moi
    #[arg(long)]
    clinvar: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long, env = "PHENO_OBFUSCATOR_SEED")]
    seed: Option<u64>,
}

impl Args {
    fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            sort_by_moi: self.sort_by_moi,
            clinvar: self.clinvar.clone(),
            output_all: self.output_all_obfuscations,
            biallelic: self.biallelic,
            replace: self.replace,
            no_not: self.no_not,
            imprecision: self.imprecision,
            double_imprecision: self.double_imprecision,
            n_noise: self.n_noise,
            match_noise: self.match_noise,
            n_alleles: self.n_alleles,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pheno_obfuscator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Phenopacket obfuscator starting...");

    let args = Args::parse();

    let mode = RunMode::from_flags(&args.mode_flags()).context("Invalid option combination")?;
    info!("Run mode: {:?}", mode);

    let config = RunConfig {
        mode,
        phenopacket_dir: args.phenopacket,
        output_dir: args.out,
        seed: args.seed,
    };

    let graph = OboParser::parse(&args.hpo)
        .with_context(|| format!("Failed to load HPO ontology from {:?}", args.hpo))?;

    let mut processor = BatchProcessor::new(&graph, config)?;
    let summary = processor.run()?;

    info!(
        "Processed {} phenopackets; manifest at {:?}",
        summary.inputs, summary.manifest
    );

    Ok(())
}

// ==============================================================================
// lib.rs - Phenopacket Obfuscator Library
// ==============================================================================
// Description: Library interface for phenopacket obfuscation modules
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

pub mod parsers;
pub mod models;
pub mod ontology;
pub mod config;
pub mod obfuscator;
pub mod variant_classifier;
pub mod clinvar;
pub mod output;
pub mod manifest;
pub mod processor;

// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for ontology and phenopacket file formats
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

pub mod obo;
pub mod phenopacket;

pub use obo::{OboParseError, OboParser};
pub use phenopacket::{PhenopacketError, PhenopacketParser};

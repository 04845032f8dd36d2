// ==============================================================================
// parsers/obo.rs - OBO Ontology Parser
// ==============================================================================
// Description: Loads hp.obo into a read-only TermGraph
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// Format: OBO 1.4 flat file, one stanza per term
// Example:
//   [Term]
//   id: HP:0001250
//   name: Seizure
//   alt_id: HP:0002279
//   is_a: HP:0012638 ! Abnormal nervous system physiology
// ==============================================================================
// Only [Term] stanzas are read. Obsolete terms are dropped, along with any
// is_a edges that point at them.
// ==============================================================================

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::ontology::{TermGraph, TermGraphBuilder};

/// Errors that can occur while loading an OBO file
#[derive(Error, Debug)]
pub enum OboParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid line format at line {line}: {details}")]
    InvalidFormat { line: usize, details: String },

    #[error("File contains no [Term] stanzas")]
    EmptyOntology,
}

#[derive(Debug, Default)]
struct Stanza {
    id: Option<String>,
    name: Option<String>,
    alt_ids: Vec<String>,
    parents: Vec<String>,
    obsolete: bool,
}

/// Parser for OBO ontology files
pub struct OboParser;

impl OboParser {
    /// Load an OBO file from disk
    pub fn parse(path: impl AsRef<Path>) -> Result<TermGraph, OboParseError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let graph = Self::parse_reader(file)?;

        info!("Loaded {} ontology terms from {}", graph.len(), path.display());
        Ok(graph)
    }

    /// Load OBO content from any reader
    pub fn parse_reader<R: Read>(reader: R) -> Result<TermGraph, OboParseError> {
        let reader = BufReader::new(reader);
        let mut builder = TermGraph::builder();

        let mut current: Option<Stanza> = None;
        let mut term_count = 0;

        for (line_idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('!') {
                continue;
            }

            // Stanza header
            if line.starts_with('[') {
                if let Some(stanza) = current.take() {
                    term_count += Self::finish(stanza, &mut builder);
                }
                if line == "[Term]" {
                    current = Some(Stanza::default());
                }
                continue;
            }

            // Header tags and non-Term stanzas
            let Some(stanza) = current.as_mut() else {
                continue;
            };

            let (tag, value) = line.split_once(':').ok_or_else(|| OboParseError::InvalidFormat {
                line: line_idx + 1,
                details: format!("Expected 'tag: value', found '{}'", line),
            })?;
            let value = strip_comment(value.trim());

            match tag {
                "id" => stanza.id = Some(value.to_string()),
                "name" => stanza.name = Some(value.to_string()),
                "alt_id" => stanza.alt_ids.push(value.to_string()),
                "is_a" => stanza.parents.push(value.to_string()),
                "is_obsolete" => stanza.obsolete = value == "true",
                _ => {}
            }
        }

        if let Some(stanza) = current.take() {
            term_count += Self::finish(stanza, &mut builder);
        }

        if term_count == 0 {
            return Err(OboParseError::EmptyOntology);
        }

        Ok(builder.build())
    }

    /// Push a completed stanza into the builder; returns 1 if a term was added
    fn finish(stanza: Stanza, builder: &mut TermGraphBuilder) -> usize {
        if stanza.obsolete {
            return 0;
        }
        let Some(id) = stanza.id else {
            return 0;
        };

        for parent in stanza.parents {
            builder.add_is_a(id.clone(), parent);
        }
        builder.add_term(id, stanza.name.unwrap_or_default(), stanza.alt_ids);
        1
    }
}

/// Drop a trailing "! comment" and any {qualifier} block from a tag value
fn strip_comment(value: &str) -> &str {
    let value = value.split(" !").next().unwrap_or(value);
    value.split(" {").next().unwrap_or(value).trim()
}

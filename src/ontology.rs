// ==============================================================================
// ontology.rs - Read-only Phenotype Ontology Graph
// ==============================================================================
// Description: Arena-backed HPO term graph with parent/descendant lookups
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Layout:
//   Terms live in a Vec; edges are index lists (parents and children) so the
//   graph is immutable and cheap to share once built. Alternate ids map to
//   the index of their primary term.
// ==============================================================================

use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

/// A term could not be resolved, or has no ancestor to move to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedTermError {
    #[error("Could not find term {0} in ontology")]
    UnknownTerm(String),

    #[error("Could not find parent term for {id} : {label}")]
    NoParents { id: String, label: String },
}

#[derive(Debug, Clone)]
struct TermNode {
    id: String,
    label: String,
    parents: Vec<usize>,
    children: Vec<usize>,
}

/// Immutable DAG of ontology terms
#[derive(Debug, Clone, Default)]
pub struct TermGraph {
    nodes: Vec<TermNode>,
    /// Primary and alternate ids -> node index
    index: HashMap<String, usize>,
}

impl TermGraph {
    pub fn builder() -> TermGraphBuilder {
        TermGraphBuilder::default()
    }

    /// Number of (non-obsolete) terms
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, term_id: &str) -> bool {
        self.index.contains_key(term_id)
    }

    fn resolve(&self, term_id: &str) -> Result<usize, UnresolvedTermError> {
        self.index
            .get(term_id)
            .copied()
            .ok_or_else(|| UnresolvedTermError::UnknownTerm(term_id.to_string()))
    }

    /// Primary id for a term id (alternate ids resolve to their primary term)
    pub fn primary_id(&self, term_id: &str) -> Result<&str, UnresolvedTermError> {
        let idx = self.resolve(term_id)?;
        Ok(&self.nodes[idx].id)
    }

    /// Label of a term
    pub fn label_of(&self, term_id: &str) -> Result<&str, UnresolvedTermError> {
        let idx = self.resolve(term_id)?;
        Ok(&self.nodes[idx].label)
    }

    /// Direct parents of a term, in the order the is_a edges were declared
    ///
    /// Returns an empty list for a root term.
    pub fn parents_of(&self, term_id: &str) -> Result<Vec<&str>, UnresolvedTermError> {
        let idx = self.resolve(term_id)?;
        Ok(self.nodes[idx]
            .parents
            .iter()
            .map(|&p| self.nodes[p].id.as_str())
            .collect())
    }

    /// The term itself and every term below it (breadth-first order)
    pub fn descendants_of(&self, term_id: &str) -> Result<Vec<&str>, UnresolvedTermError> {
        let start = self.resolve(term_id)?;

        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        let mut out = Vec::new();

        seen.insert(start);
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            out.push(self.nodes[idx].id.as_str());
            for &child in &self.nodes[idx].children {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        Ok(out)
    }
}

/// Collects terms and is_a edges, then freezes them into a [`TermGraph`]
#[derive(Debug, Default)]
pub struct TermGraphBuilder {
    terms: Vec<(String, String, Vec<String>)>,
    edges: Vec<(String, String)>,
}

impl TermGraphBuilder {
    /// Add a term with its label
    pub fn term(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.add_term(id, label, Vec::new());
        self
    }

    /// Add a `child is_a parent` edge
    pub fn is_a(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.add_is_a(child, parent);
        self
    }

    pub fn add_term(&mut self, id: impl Into<String>, label: impl Into<String>, alt_ids: Vec<String>) {
        self.terms.push((id.into(), label.into(), alt_ids));
    }

    pub fn add_is_a(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.edges.push((child.into(), parent.into()));
    }

    pub fn build(self) -> TermGraph {
        let mut graph = TermGraph::default();

        for (id, label, alt_ids) in self.terms {
            if label.trim().is_empty() {
                warn!("Skipping term {} without a label", id);
                continue;
            }
            if graph.index.contains_key(&id) {
                debug!("Duplicate term {}, keeping first definition", id);
                continue;
            }

            let idx = graph.nodes.len();
            graph.index.insert(id.clone(), idx);
            for alt in alt_ids {
                graph.index.entry(alt).or_insert(idx);
            }
            graph.nodes.push(TermNode {
                id,
                label,
                parents: Vec::new(),
                children: Vec::new(),
            });
        }

        let mut dropped = 0;
        for (child, parent) in self.edges {
            let (Some(&c), Some(&p)) = (graph.index.get(&child), graph.index.get(&parent)) else {
                debug!("Dropping edge {} is_a {} (unknown term)", child, parent);
                dropped += 1;
                continue;
            };
            if c == p || graph.nodes[c].parents.contains(&p) {
                continue;
            }
            graph.nodes[c].parents.push(p);
            graph.nodes[p].children.push(c);
        }

        if dropped > 0 {
            debug!("Dropped {} edges referencing unknown terms", dropped);
        }

        graph
    }
}

/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashSet;

use log::{info, warn};
use shared::candidate::IndexCandidate;

use crate::backend::{GraphBackend, NodeShape};
use crate::error::TunerError;

/// Where the action space came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Introspected,
    Fallback,
    Provided,
}

/// Candidates used when the live schema reports nothing (movie graph)
pub fn fallback_candidates() -> Vec<IndexCandidate> {
    let composite = |label: &str, first: &str, second: &str| {
        IndexCandidate::single(label, first).with_property(second)
    };

    vec![
        IndexCandidate::single("Movie", "released"),
        IndexCandidate::single("Movie", "title"),
        IndexCandidate::single("Movie", "tagline"),
        composite("Movie", "title", "released"),
        composite("Movie", "tagline", "released"),
        composite("Movie", "tagline", "title"),
        IndexCandidate::single("Person", "name"),
        IndexCandidate::single("Person", "born"),
        composite("Person", "name", "born"),
    ]
}

/// One single-property candidate per property of every labelled node shape.
/// Shapes are taken in the order reported; nothing is de-duplicated.
pub fn candidates_from_shapes(shapes: &[NodeShape]) -> Vec<IndexCandidate> {
    shapes
        .iter()
        .filter_map(|shape| shape.labels.first().map(|label| (label, &shape.properties)))
        .flat_map(|(label, properties)| {
            properties
                .iter()
                .filter(|p| !p.is_empty())
                .map(move |p| IndexCandidate::single(label.as_str(), p.as_str()))
        })
        .filter(|c| !c.label().is_empty())
        .collect()
}

/// The discrete action space: action id = position in the list.
#[derive(Debug, Clone)]
pub struct CandidateCatalog {
    candidates: Vec<IndexCandidate>,
    source: CatalogSource,
}

impl CandidateCatalog {
    /// Live introspection first, the fixed fallback list when it yields
    /// nothing. Statement errors during introspection (an unsupported
    /// procedure, say) also fall back; connectivity errors propagate.
    pub fn resolve(backend: &mut dyn GraphBackend) -> Result<Self, TunerError> {
        let introspected = match backend.node_shapes() {
            Ok(shapes) => candidates_from_shapes(&shapes),
            Err(e) if !e.is_fatal() => {
                warn!("Schema introspection failed: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let catalog = if introspected.is_empty() {
            warn!("Using hardcoded index candidates...");
            CandidateCatalog {
                candidates: fallback_candidates(),
                source: CatalogSource::Fallback,
            }
        } else {
            CandidateCatalog {
                candidates: introspected,
                source: CatalogSource::Introspected,
            }
        };

        let duplicates = catalog.duplicate_count();
        if duplicates > 0 {
            warn!("{} index candidate(s) duplicate an earlier action", duplicates);
        }
        info!("Resolved {} index candidates ({:?})", catalog.len(), catalog.source);
        Ok(catalog)
    }

    pub fn from_candidates(candidates: Vec<IndexCandidate>) -> Result<Self, TunerError> {
        if candidates.is_empty() {
            return Err(TunerError::EmptyCatalog);
        }
        Ok(CandidateCatalog {
            candidates,
            source: CatalogSource::Provided,
        })
    }

    pub fn get(&self, action: usize) -> Option<&IndexCandidate> {
        self.candidates.get(action)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexCandidate> {
        self.candidates.iter()
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// Number of actions whose candidate equals an earlier one
    pub fn duplicate_count(&self) -> usize {
        let mut seen = HashSet::new();
        self.candidates.iter().filter(|c| !seen.insert(*c)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(labels: &[&str], properties: &[&str]) -> NodeShape {
        NodeShape {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            properties: properties.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_fallback_list() {
        let statements: Vec<String> = fallback_candidates().iter().map(|c| c.create_statement()).collect();
        assert_eq!(
            statements,
            vec![
                "CREATE INDEX FOR (n:Movie) ON (n.released)",
                "CREATE INDEX FOR (n:Movie) ON (n.title)",
                "CREATE INDEX FOR (n:Movie) ON (n.tagline)",
                "CREATE INDEX FOR (n:Movie) ON (n.title, n.released)",
                "CREATE INDEX FOR (n:Movie) ON (n.tagline, n.released)",
                "CREATE INDEX FOR (n:Movie) ON (n.tagline, n.title)",
                "CREATE INDEX FOR (n:Person) ON (n.name)",
                "CREATE INDEX FOR (n:Person) ON (n.born)",
                "CREATE INDEX FOR (n:Person) ON (n.name, n.born)",
            ]
        );
    }

    #[test]
    fn test_one_candidate_per_property_using_first_label() {
        let shapes = vec![
            shape(&["Movie"], &["title", "released"]),
            shape(&[], &["orphan"]),
            shape(&["Person", "Actor"], &["name"]),
            shape(&["Empty"], &[]),
        ];
        let candidates = candidates_from_shapes(&shapes);
        assert_eq!(
            candidates,
            vec![
                IndexCandidate::single("Movie", "title"),
                IndexCandidate::single("Movie", "released"),
                IndexCandidate::single("Person", "name"),
            ]
        );
        assert!(candidates.iter().all(|c| !c.is_composite()));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let shapes = vec![shape(&["Person"], &["name"]), shape(&["Person"], &["name", "born"])];
        let catalog = CandidateCatalog::from_candidates(candidates_from_shapes(&shapes)).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.duplicate_count(), 1);
        assert_eq!(catalog.get(0), catalog.get(1));
    }

    #[test]
    fn test_empty_provided_catalog_is_rejected() {
        assert!(matches!(
            CandidateCatalog::from_candidates(Vec::new()),
            Err(TunerError::EmptyCatalog)
        ));
    }
}

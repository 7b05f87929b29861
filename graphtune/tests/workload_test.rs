/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod common;

extern crate graphtune;
use common::MockGraph;
use graphtune::error::TunerError;
use graphtune::workload::{ValuePools, WorkloadGenerator};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use shared::templates::{TemplateLibrary, BUILTIN_TEMPLATES};

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_pools() -> ValuePools {
        ValuePools::new(
            vec!["Keanu Reeves".to_string()],
            vec![2000, 2010, 2020],
            vec!["Alpha".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_unfiltered_actor_template_scenario() {
        let library = TemplateLibrary::from_texts([BUILTIN_TEMPLATES[0]]).unwrap();
        let generator = WorkloadGenerator::new(library, scenario_pools(), StdRng::seed_from_u64(42))
            .with_filter_probability(0.0);

        let expected = "true AND m.released IS NOT NULL AND d.born IS NOT NULL AND m.released > 2000";
        let samples: Vec<String> = generator.take(200).map(|s| s.into_string()).collect();
        assert!(samples.iter().all(|s| s.contains("WHERE true AND")));
        assert!(samples.iter().any(|s| s.contains(expected)));
    }

    #[test]
    fn test_full_library_never_leaves_placeholders() {
        let generator = WorkloadGenerator::new(TemplateLibrary::builtin(), scenario_pools(), StdRng::seed_from_u64(3))
            .with_filter_probability(1.0);
        for sample in generator.take(500) {
            assert!(!sample.as_str().contains('{'), "unrendered placeholder in {}", sample);
        }
    }

    #[test]
    fn test_capture_reads_pools_from_backend() {
        let mut graph = MockGraph::movies();
        let generator = WorkloadGenerator::capture(&mut graph, TemplateLibrary::builtin(), Some(1)).unwrap();

        assert_eq!(generator.pools().actors(), ["Keanu Reeves", "Carrie-Anne Moss"]);
        assert_eq!(generator.pools().years(), [1999, 2003, 2021]);
        assert_eq!(generator.pools().titles().len(), 2);
        assert_eq!(graph.count_calls("query_column"), 3);
        assert!(graph.indexes.is_empty());
    }

    #[test]
    fn test_capture_rejects_empty_database() {
        let mut graph = MockGraph::movies();
        graph.titles = vec![json!(null)];
        assert!(matches!(
            WorkloadGenerator::capture(&mut graph, TemplateLibrary::builtin(), None),
            Err(TunerError::EmptyPool("titles"))
        ));
    }

    #[test]
    fn test_generator_counts_samples() {
        let mut generator = WorkloadGenerator::new(TemplateLibrary::builtin(), scenario_pools(), StdRng::seed_from_u64(9));
        generator.next_sample();
        generator.next();
        assert_eq!(generator.produced(), 2);
    }
}

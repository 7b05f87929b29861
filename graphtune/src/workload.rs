/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Randomised Cypher workload.
//!
//! [`WorkloadGenerator`] is a forward-only, never-ending iterator of
//! [`WorkloadSample`]s. It cannot be rewound: to start over, capture fresh
//! [`ValuePools`] from the database, since the live names, years and titles
//! may have changed in the meantime.

use std::fmt;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use shared::templates::{escape_literal, Bindings, TemplateLibrary, ALWAYS_TRUE};

use crate::backend::GraphBackend;
use crate::error::TunerError;

pub const ACTOR_QUERY: &str = "MATCH (p:Person) WHERE p.name IS NOT NULL RETURN DISTINCT p.name AS name";
pub const YEAR_QUERY: &str = "MATCH (m:Movie) WHERE m.released IS NOT NULL RETURN DISTINCT m.released AS year";
pub const TITLE_QUERY: &str = "MATCH (m:Movie) WHERE m.title IS NOT NULL RETURN DISTINCT m.title AS title";

/// Share of generated queries that filter on a concrete actor or title
pub const DEFAULT_FILTER_PROBABILITY: f64 = 0.10;

/// One fully rendered query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadSample(String);

impl WorkloadSample {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for WorkloadSample {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Actor names, release years and titles captured once from the database.
/// All three are non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePools {
    actors: Vec<String>,
    years: Vec<i64>,
    titles: Vec<String>,
}

impl ValuePools {
    pub fn new(actors: Vec<String>, years: Vec<i64>, titles: Vec<String>) -> Result<Self, TunerError> {
        if actors.is_empty() {
            return Err(TunerError::EmptyPool("actors"));
        }
        if years.is_empty() {
            return Err(TunerError::EmptyPool("years"));
        }
        if titles.is_empty() {
            return Err(TunerError::EmptyPool("titles"));
        }
        Ok(ValuePools { actors, years, titles })
    }

    /// Runs the three read-only pool queries against the live database.
    pub fn capture(backend: &mut dyn GraphBackend) -> Result<Self, TunerError> {
        let actors = strings(backend.query_column(ACTOR_QUERY)?);
        let years: Vec<i64> = backend
            .query_column(YEAR_QUERY)?
            .iter()
            .filter_map(year_of)
            .collect();
        let titles = strings(backend.query_column(TITLE_QUERY)?);

        info!("Actors: {}", actors.len());
        info!("Years: {}", years.len());
        info!("Movies: {}", titles.len());
        Self::new(actors, years, titles)
    }

    pub fn actors(&self) -> &[String] {
        &self.actors
    }

    pub fn years(&self) -> &[i64] {
        &self.years
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }
}

fn strings(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => {
                debug!("Skipping non-string pool value {}", other);
                None
            }
        })
        .collect()
}

fn year_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct WorkloadGenerator<R = StdRng> {
    library: TemplateLibrary,
    pools: ValuePools,
    rng: R,
    filter_probability: f64,
    produced: u64,
}

impl WorkloadGenerator<StdRng> {
    /// Captures the value pools from `backend`. A `seed` makes the sample
    /// stream reproducible for a fixed database state.
    pub fn capture(
        backend: &mut dyn GraphBackend,
        library: TemplateLibrary,
        seed: Option<u64>,
    ) -> Result<Self, TunerError> {
        let pools = ValuePools::capture(backend)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::new(library, pools, rng))
    }
}

impl<R: Rng> WorkloadGenerator<R> {
    pub fn new(library: TemplateLibrary, pools: ValuePools, rng: R) -> Self {
        WorkloadGenerator {
            library,
            pools,
            rng,
            filter_probability: DEFAULT_FILTER_PROBABILITY,
            produced: 0,
        }
    }

    /// Probability, clamped to [0, 1], that an optional predicate is bound
    /// to a concrete value.
    pub fn with_filter_probability(mut self, probability: f64) -> Self {
        self.filter_probability = if probability.is_nan() {
            DEFAULT_FILTER_PROBABILITY
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn pools(&self) -> &ValuePools {
        &self.pools
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    fn pick<'p, T>(rng: &mut R, pool: &'p [T]) -> &'p T {
        &pool[rng.gen_range(0..pool.len())]
    }

    /// Draws a value for every placeholder. Both years come from the pool
    /// independently and are ordered so that `year <= year2`.
    pub fn sample_bindings(&mut self) -> Bindings {
        let actor = Self::pick(&mut self.rng, &self.pools.actors).clone();
        let actor_clause = if self.rng.gen_bool(self.filter_probability) {
            Bindings::equality_clause("a.name", &actor)
        } else {
            ALWAYS_TRUE.to_string()
        };

        let title = Self::pick(&mut self.rng, &self.pools.titles).clone();
        let title_clause = if self.rng.gen_bool(self.filter_probability) {
            Bindings::equality_clause("m.title", &title)
        } else {
            ALWAYS_TRUE.to_string()
        };

        let first = *Self::pick(&mut self.rng, &self.pools.years);
        let second = *Self::pick(&mut self.rng, &self.pools.years);

        Bindings {
            actor_clause,
            title_clause,
            year: first.min(second),
            year2: first.max(second),
            actor: escape_literal(&actor),
            title: escape_literal(&title),
        }
    }

    pub fn next_sample(&mut self) -> WorkloadSample {
        let index = self.rng.gen_range(0..self.library.count());
        let bindings = self.sample_bindings();
        let text = match self.library.template_at(index) {
            Some(template) => template.render(&bindings),
            None => unreachable!("template index drawn from 0..count"),
        };
        self.produced += 1;
        debug!("Workload sample #{} from template {}", self.produced, index);
        WorkloadSample(text)
    }
}

impl<R: Rng> Iterator for WorkloadGenerator<R> {
    type Item = WorkloadSample;

    fn next(&mut self) -> Option<WorkloadSample> {
        Some(self.next_sample())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

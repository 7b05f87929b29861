/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub mod backend;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod error;
pub mod neo4j_http;
pub mod timing;
pub mod workload;

pub use backend::{BackendError, GraphBackend, NodeShape};
pub use catalog::{CandidateCatalog, CatalogSource};
pub use config::TunerConfig;
pub use environment::{
    ActionSpace, Environment, Episode, EpisodePhase, EnvironmentSettings, ObservationSpace, StepResult,
    TuningEnvironment, OBSERVATION_DIM,
};
pub use error::TunerError;
pub use neo4j_http::Neo4jHttpBackend;
pub use timing::{latency_reward, LatencyProbe, WallClockProbe};
pub use workload::{ValuePools, WorkloadGenerator, WorkloadSample};

use ml::Embedder;

/// Connects to the configured database, captures the value pools and resolves
/// the candidate catalog.
pub fn build_environment<E: Embedder>(
    config: &TunerConfig,
    embedder: E,
) -> Result<TuningEnvironment<Neo4jHttpBackend, E>, TunerError> {
    config.validate()?;
    let mut backend = config.backend()?;
    let library = config.template_library()?;
    let workload = WorkloadGenerator::capture(&mut backend, library, config.seed)?
        .with_filter_probability(config.filter_probability);
    TuningEnvironment::new(backend, workload, embedder, config.settings())
}

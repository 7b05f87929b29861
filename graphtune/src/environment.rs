/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Single-step index tuning environment.
//!
//! Each episode is one `reset` followed by one `step`:
//!
//! 1. `reset` drops every index, pulls one workload sample and returns its
//!    embedding.
//! 2. `step(action)` times the query on a cold cache, creates the chosen
//!    index and waits for it to come online, times the query again and
//!    rewards the latency difference. The episode is then done.
//!
//! The index created by `step` stays until the next `reset`.

use std::time::Duration;

use log::{debug, info, warn};
use ml::Embedder;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use shared::candidate::IndexCandidate;

use crate::backend::{BackendError, GraphBackend};
use crate::catalog::CandidateCatalog;
use crate::config::DEFAULT_REWARD_SCALE;
use crate::error::TunerError;
use crate::timing::{latency_reward, LatencyProbe, WallClockProbe};
use crate::workload::{WorkloadGenerator, WorkloadSample};

/// Width of every observation vector
pub const OBSERVATION_DIM: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSpace {
    Discrete(usize),
}

impl ActionSpace {
    pub fn size(&self) -> usize {
        match self {
            ActionSpace::Discrete(n) => *n,
        }
    }

    /// Validates a raw action id from a learner. Never clamps.
    pub fn check(&self, action: i64) -> Result<usize, TunerError> {
        let count = self.size();
        match usize::try_from(action) {
            Ok(index) if index < count => Ok(index),
            _ => Err(TunerError::ActionOutOfRange { action, count }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationSpace {
    pub dim: usize,
    pub low: f32,
    pub high: f32,
}

impl ObservationSpace {
    pub fn contains(&self, observation: &[f32]) -> bool {
        observation.len() == self.dim
            && observation.iter().all(|v| *v >= self.low && *v <= self.high)
    }
}

impl Default for ObservationSpace {
    fn default() -> Self {
        ObservationSpace {
            dim: OBSERVATION_DIM,
            low: -1.0,
            high: 1.0,
        }
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult<O> {
    pub observation: O,
    pub reward: f64,
    pub done: bool,
    /// Always empty
    pub info: Map<String, Value>,
}

/// Gym-style reset/step contract consumed by a learner.
pub trait Environment {
    type Action;
    type Observation;

    fn reset(&mut self) -> Result<Self::Observation, TunerError>;

    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>, TunerError>;

    fn action_space(&self) -> ActionSpace;

    fn observation_space(&self) -> ObservationSpace;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EpisodePhase {
    Idle,
    BaselineMeasured,
    IndexApplied,
    IndexedMeasured,
    RewardComputed,
}

/// Record of one episode, complete once `reward` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub query: String,
    pub action: Option<usize>,
    pub candidate: Option<IndexCandidate>,
    pub baseline_latency: Option<Duration>,
    pub indexed_latency: Option<Duration>,
    pub reward: Option<f64>,
    /// Index creation or the wait for it was rejected by the database
    pub index_failed: bool,
    /// A latency measurement was rejected by the database
    pub measurement_failed: bool,
}

impl Episode {
    fn start(query: &WorkloadSample) -> Self {
        Episode {
            query: query.as_str().to_string(),
            action: None,
            candidate: None,
            baseline_latency: None,
            indexed_latency: None,
            reward: None,
            index_failed: false,
            measurement_failed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSettings {
    pub reward_scale: f64,
    /// Reward when the database rejects the index or one of the timed runs
    pub failed_index_reward: f64,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        EnvironmentSettings {
            reward_scale: DEFAULT_REWARD_SCALE,
            failed_index_reward: 0.0,
        }
    }
}

pub struct TuningEnvironment<B, E, R = StdRng, P = WallClockProbe> {
    backend: B,
    workload: WorkloadGenerator<R>,
    catalog: CandidateCatalog,
    embedder: E,
    probe: P,
    settings: EnvironmentSettings,
    current: Option<(WorkloadSample, Episode)>,
    last: Option<Episode>,
    phase: EpisodePhase,
}

impl<B, E, R> TuningEnvironment<B, E, R, WallClockProbe>
where
    B: GraphBackend,
    E: Embedder,
    R: Rng,
{
    /// Resolves the candidate catalog from the live schema.
    pub fn new(
        mut backend: B,
        workload: WorkloadGenerator<R>,
        embedder: E,
        settings: EnvironmentSettings,
    ) -> Result<Self, TunerError> {
        Self::check_embedder(&embedder)?;
        let catalog = CandidateCatalog::resolve(&mut backend)?;
        Ok(Self::assemble(backend, workload, catalog, embedder, settings))
    }

    /// Uses `catalog` as the action space instead of introspecting.
    pub fn with_catalog(
        backend: B,
        workload: WorkloadGenerator<R>,
        catalog: CandidateCatalog,
        embedder: E,
        settings: EnvironmentSettings,
    ) -> Result<Self, TunerError> {
        Self::check_embedder(&embedder)?;
        if catalog.is_empty() {
            return Err(TunerError::EmptyCatalog);
        }
        Ok(Self::assemble(backend, workload, catalog, embedder, settings))
    }

    fn check_embedder(embedder: &E) -> Result<(), TunerError> {
        if embedder.dimension() != OBSERVATION_DIM {
            return Err(TunerError::ObservationDimension {
                expected: OBSERVATION_DIM,
                actual: embedder.dimension(),
            });
        }
        Ok(())
    }

    fn assemble(
        backend: B,
        workload: WorkloadGenerator<R>,
        catalog: CandidateCatalog,
        embedder: E,
        settings: EnvironmentSettings,
    ) -> Self {
        TuningEnvironment {
            backend,
            workload,
            catalog,
            embedder,
            probe: WallClockProbe,
            settings,
            current: None,
            last: None,
            phase: EpisodePhase::Idle,
        }
    }
}

impl<B, E, R, P> TuningEnvironment<B, E, R, P>
where
    B: GraphBackend,
    E: Embedder,
    R: Rng,
    P: LatencyProbe,
{
    /// Swaps the latency measurement, e.g. for a scripted probe in tests.
    pub fn with_probe<Q: LatencyProbe>(self, probe: Q) -> TuningEnvironment<B, E, R, Q> {
        TuningEnvironment {
            backend: self.backend,
            workload: self.workload,
            catalog: self.catalog,
            embedder: self.embedder,
            probe,
            settings: self.settings,
            current: self.current,
            last: self.last,
            phase: self.phase,
        }
    }

    pub fn catalog(&self) -> &CandidateCatalog {
        &self.catalog
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn settings(&self) -> &EnvironmentSettings {
        &self.settings
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Query of the episode in progress, if `reset` has been called and
    /// `step` has not
    pub fn current_query(&self) -> Option<&str> {
        self.current.as_ref().map(|(sample, _)| sample.as_str())
    }

    pub fn last_episode(&self) -> Option<&Episode> {
        self.last.as_ref()
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Drops every index. Drops the database refuses (an index owned by a
    /// constraint, for instance) are logged and skipped.
    fn drop_all_indexes(&mut self) -> Result<(), TunerError> {
        for name in self.backend.list_indexes()? {
            match self.backend.drop_index(&name) {
                Ok(()) => debug!("Dropped index {}", name),
                Err(e) if !e.is_fatal() => warn!("Could not drop index {}: {}", name, e),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn observe(&mut self, query: &str) -> Result<Vec<f32>, TunerError> {
        let mut observation = self.embedder.embed(query)?;
        if observation.len() != OBSERVATION_DIM {
            return Err(TunerError::ObservationDimension {
                expected: OBSERVATION_DIM,
                actual: observation.len(),
            });
        }
        observation.iter_mut().for_each(|v| *v = v.clamp(-1.0, 1.0));
        Ok(observation)
    }

    /// Baseline run, index creation and the indexed run. Leaves `phase` at the
    /// last stage reached, so a failure can be attributed to its stage.
    fn measure_episode(
        &mut self,
        query: &str,
        candidate: &IndexCandidate,
        episode: &mut Episode,
    ) -> Result<f64, BackendError> {
        let baseline = self.probe.measure(&mut self.backend, query)?;
        episode.baseline_latency = Some(baseline);
        self.phase = EpisodePhase::BaselineMeasured;

        self.backend.create_index(candidate)?;
        self.backend.await_indexes()?;
        self.phase = EpisodePhase::IndexApplied;

        let indexed = self.probe.measure(&mut self.backend, query)?;
        episode.indexed_latency = Some(indexed);
        self.phase = EpisodePhase::IndexedMeasured;

        Ok(latency_reward(self.settings.reward_scale, baseline, indexed))
    }

    /// Same as [`Environment::step`] for learners that hand out signed ids.
    pub fn step_signed(&mut self, action: i64) -> Result<StepResult<Vec<f32>>, TunerError> {
        let action = self.action_space().check(action)?;
        self.step(action)
    }
}

impl<B, E, R, P> Environment for TuningEnvironment<B, E, R, P>
where
    B: GraphBackend,
    E: Embedder,
    R: Rng,
    P: LatencyProbe,
{
    type Action = usize;
    type Observation = Vec<f32>;

    fn reset(&mut self) -> Result<Vec<f32>, TunerError> {
        self.current = None;
        self.phase = EpisodePhase::Idle;

        self.drop_all_indexes()?;
        let sample = self.workload.next_sample();
        let observation = self.observe(sample.as_str())?;
        debug!("Episode query: {}", sample);

        let episode = Episode::start(&sample);
        self.current = Some((sample, episode));
        Ok(observation)
    }

    fn step(&mut self, action: usize) -> Result<StepResult<Vec<f32>>, TunerError> {
        let count = self.catalog.len();
        let candidate = match self.catalog.get(action) {
            Some(candidate) => candidate.clone(),
            None => {
                return Err(TunerError::ActionOutOfRange {
                    action: i64::try_from(action).unwrap_or(i64::MAX),
                    count,
                })
            }
        };
        let (sample, mut episode) = self.current.take().ok_or(TunerError::NoActiveEpisode)?;
        episode.action = Some(action);
        episode.candidate = Some(candidate.clone());
        self.phase = EpisodePhase::Idle;

        let reward = match self.measure_episode(sample.as_str(), &candidate, &mut episode) {
            Ok(reward) => reward,
            Err(e) if !e.is_fatal() => {
                if self.phase == EpisodePhase::BaselineMeasured {
                    warn!("Index {} could not be applied: {}", candidate, e);
                    episode.index_failed = true;
                } else {
                    warn!("Measurement failed in phase {:?}: {}", self.phase, e);
                    episode.measurement_failed = true;
                }
                self.settings.failed_index_reward
            }
            Err(e) => {
                self.phase = EpisodePhase::Idle;
                return Err(e.into());
            }
        };

        episode.reward = Some(reward);
        self.phase = EpisodePhase::RewardComputed;
        info!(
            "Action {} {} baseline={:?} indexed={:?} reward={:.4}",
            action, candidate, episode.baseline_latency, episode.indexed_latency, reward
        );

        self.last = Some(episode);
        let observation = self.observe(sample.as_str())?;

        Ok(StepResult {
            observation,
            reward,
            done: true,
            info: Map::new(),
        })
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.catalog.len())
    }

    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_space_check() {
        let space = ActionSpace::Discrete(9);
        assert_eq!(space.check(0).unwrap(), 0);
        assert_eq!(space.check(8).unwrap(), 8);
        assert!(matches!(
            space.check(9),
            Err(TunerError::ActionOutOfRange { action: 9, count: 9 })
        ));
        assert!(matches!(
            space.check(-1),
            Err(TunerError::ActionOutOfRange { action: -1, count: 9 })
        ));
    }

    #[test]
    fn test_observation_space_bounds() {
        let space = ObservationSpace::default();
        assert!(space.contains(&vec![0.5; OBSERVATION_DIM]));
        assert!(!space.contains(&vec![1.5; OBSERVATION_DIM]));
        assert!(!space.contains(&[0.0; 3]));
    }
}

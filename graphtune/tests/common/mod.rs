/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use graphtune::backend::{BackendError, GraphBackend, NodeShape};
use graphtune::timing::LatencyProbe;
use graphtune::workload::{ACTOR_QUERY, TITLE_QUERY, YEAR_QUERY};
use serde_json::{json, Value};
use shared::candidate::IndexCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Statement rejected, connection still usable
    Database,
    /// Connection lost
    Fatal,
}

impl Failure {
    fn error(self, what: &str) -> BackendError {
        match self {
            Failure::Database => BackendError::Database {
                code: "Neo.ClientError.Schema.IndexCreationFailed".to_string(),
                message: format!("{} rejected", what),
            },
            Failure::Fatal => BackendError::Protocol(format!("connection lost during {}", what)),
        }
    }
}

pub fn shape(labels: &[&str], properties: &[&str]) -> NodeShape {
    NodeShape {
        labels: labels.iter().map(|s| s.to_string()).collect(),
        properties: properties.iter().map(|s| s.to_string()).collect(),
    }
}

/// In-memory stand-in for a graph database that only tracks index names.
#[derive(Debug, Default)]
pub struct MockGraph {
    pub indexes: Vec<String>,
    pub shapes: Vec<NodeShape>,
    pub schema_failure: Option<Failure>,
    pub failing_candidates: Vec<IndexCandidate>,
    pub undroppable: Vec<String>,
    pub await_failure: Option<Failure>,
    /// Every call fails fatally while set
    pub offline: bool,
    pub actors: Vec<Value>,
    pub years: Vec<Value>,
    pub titles: Vec<Value>,
    pub calls: Vec<String>,
    pub executed: Vec<String>,
    next_index: usize,
}

impl MockGraph {
    pub fn new() -> Self {
        MockGraph::default()
    }

    /// Small movie graph: pools populated, no schema information
    pub fn movies() -> Self {
        MockGraph {
            actors: vec![json!("Keanu Reeves"), json!("Carrie-Anne Moss"), Value::Null],
            years: vec![json!(1999), json!(2003), json!(2021.0)],
            titles: vec![json!("The Matrix"), json!("The Matrix Reloaded")],
            ..MockGraph::default()
        }
    }

    pub fn with_indexes(mut self, names: &[&str]) -> Self {
        self.indexes = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_shapes(mut self, shapes: Vec<NodeShape>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&mut self, call: String) -> Result<(), BackendError> {
        self.calls.push(call.clone());
        if self.offline {
            return Err(Failure::Fatal.error(&call));
        }
        Ok(())
    }
}

impl GraphBackend for MockGraph {
    fn node_shapes(&mut self) -> Result<Vec<NodeShape>, BackendError> {
        self.record("node_shapes".to_string())?;
        match self.schema_failure {
            Some(failure) => Err(failure.error("schema introspection")),
            None => Ok(self.shapes.clone()),
        }
    }

    fn list_indexes(&mut self) -> Result<Vec<String>, BackendError> {
        self.record("list_indexes".to_string())?;
        Ok(self.indexes.clone())
    }

    fn drop_index(&mut self, name: &str) -> Result<(), BackendError> {
        self.record(format!("drop_index {}", name))?;
        if self.undroppable.iter().any(|n| n == name) {
            return Err(Failure::Database.error(name));
        }
        self.indexes.retain(|n| n != name);
        Ok(())
    }

    fn create_index(&mut self, candidate: &IndexCandidate) -> Result<(), BackendError> {
        self.record(format!("create_index {}", candidate))?;
        if self.failing_candidates.contains(candidate) {
            return Err(Failure::Database.error(&candidate.create_statement()));
        }
        self.next_index += 1;
        self.indexes.push(format!("index_{}", self.next_index));
        Ok(())
    }

    fn await_indexes(&mut self) -> Result<(), BackendError> {
        self.record("await_indexes".to_string())?;
        match self.await_failure {
            Some(failure) => Err(failure.error("await indexes")),
            None => Ok(()),
        }
    }

    fn clear_query_caches(&mut self) -> Result<(), BackendError> {
        self.record("clear_query_caches".to_string())
    }

    fn execute(&mut self, query: &str) -> Result<(), BackendError> {
        self.record("execute".to_string())?;
        self.executed.push(query.to_string());
        Ok(())
    }

    fn query_column(&mut self, query: &str) -> Result<Vec<Value>, BackendError> {
        self.record("query_column".to_string())?;
        Ok(match query {
            ACTOR_QUERY => self.actors.clone(),
            YEAR_QUERY => self.years.clone(),
            TITLE_QUERY => self.titles.clone(),
            _ => Vec::new(),
        })
    }
}

/// Hands out pre-recorded latencies in order, zero once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    latencies: VecDeque<Duration>,
    /// 1-based measurement that fails, and how
    failing_call: Option<(usize, Failure)>,
    calls: usize,
    pub measured: Vec<String>,
}

impl ScriptedProbe {
    pub fn millis(latencies: &[u64]) -> Self {
        ScriptedProbe {
            latencies: latencies.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            ..ScriptedProbe::default()
        }
    }

    pub fn failing_on(mut self, call: usize, failure: Failure) -> Self {
        self.failing_call = Some((call, failure));
        self
    }
}

impl LatencyProbe for ScriptedProbe {
    fn measure(&mut self, backend: &mut dyn GraphBackend, query: &str) -> Result<Duration, BackendError> {
        self.calls += 1;
        if let Some((call, failure)) = self.failing_call {
            if call == self.calls {
                return Err(failure.error("timed query"));
            }
        }
        backend.clear_query_caches()?;
        backend.execute(query)?;
        self.measured.push(query.to_string());
        Ok(self.latencies.pop_front().unwrap_or(Duration::ZERO))
    }
}

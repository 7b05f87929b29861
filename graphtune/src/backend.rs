/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde_json::Value;
use shared::candidate::IndexCandidate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid database endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("malformed response: {0}")]
    Protocol(String),
    #[error("{code}: {message}")]
    Database { code: String, message: String },
}

impl BackendError {
    /// Statement errors reported by the database leave the connection usable;
    /// everything else means the database can no longer be reached reliably.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BackendError::Database { .. })
    }
}

/// Node shape reported by schema introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShape {
    pub labels: Vec<String>,
    pub properties: Vec<String>,
}

/// Every database round trip the tuner needs. All calls block.
pub trait GraphBackend {
    fn node_shapes(&mut self) -> Result<Vec<NodeShape>, BackendError>;

    /// Names of every index currently defined
    fn list_indexes(&mut self) -> Result<Vec<String>, BackendError>;

    fn drop_index(&mut self, name: &str) -> Result<(), BackendError>;

    fn create_index(&mut self, candidate: &IndexCandidate) -> Result<(), BackendError>;

    /// Returns once every index is online
    fn await_indexes(&mut self) -> Result<(), BackendError>;

    fn clear_query_caches(&mut self) -> Result<(), BackendError>;

    /// Runs a query and consumes its whole result
    fn execute(&mut self, query: &str) -> Result<(), BackendError>;

    /// First column of every row of a read query
    fn query_column(&mut self, query: &str) -> Result<Vec<Value>, BackendError>;
}

impl<B: GraphBackend + ?Sized> GraphBackend for &mut B {
    fn node_shapes(&mut self) -> Result<Vec<NodeShape>, BackendError> {
        (**self).node_shapes()
    }

    fn list_indexes(&mut self) -> Result<Vec<String>, BackendError> {
        (**self).list_indexes()
    }

    fn drop_index(&mut self, name: &str) -> Result<(), BackendError> {
        (**self).drop_index(name)
    }

    fn create_index(&mut self, candidate: &IndexCandidate) -> Result<(), BackendError> {
        (**self).create_index(candidate)
    }

    fn await_indexes(&mut self) -> Result<(), BackendError> {
        (**self).await_indexes()
    }

    fn clear_query_caches(&mut self) -> Result<(), BackendError> {
        (**self).clear_query_caches()
    }

    fn execute(&mut self, query: &str) -> Result<(), BackendError> {
        (**self).execute(query)
    }

    fn query_column(&mut self, query: &str) -> Result<Vec<Value>, BackendError> {
        (**self).query_column(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_database_errors_are_recoverable() {
        let db = BackendError::Database {
            code: "Neo.ClientError.Schema.IndexAlreadyExists".to_string(),
            message: "exists".to_string(),
        };
        assert!(!db.is_fatal());

        let http = BackendError::Http {
            endpoint: "http://localhost:7474/db/neo4j/tx/commit".to_string(),
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert!(http.is_fatal());
        assert!(BackendError::Protocol("eof".to_string()).is_fatal());
    }
}

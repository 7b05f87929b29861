/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Neo4j backend over the transactional HTTP endpoint.
//!
//! Every statement is sent as its own auto-committed transaction to
//! `POST /db/<database>/tx/commit`.

use std::time::Duration;

use log::debug;
use percent_encoding::percent_decode_str;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::candidate::{escape_identifier, IndexCandidate};
use url::Url;

use crate::backend::{BackendError, GraphBackend, NodeShape};

const SCHEMA_QUERY: &str = "CALL db.schema.nodeTypeProperties() YIELD nodeLabels, propertyName \
                            RETURN nodeLabels, collect(propertyName) AS properties";
const SHOW_INDEXES: &str = "SHOW INDEXES YIELD name RETURN name";
const AWAIT_INDEXES: &str = "CALL db.awaitIndexes()";
const CLEAR_QUERY_CACHES: &str = "CALL db.clearQueryCaches()";

/// Neo4j's default HTTP connector port
pub const DEFAULT_HTTP_PORT: u16 = 7474;
/// Neo4j's default HTTPS connector port
pub const DEFAULT_HTTPS_PORT: u16 = 7473;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 512;

/// Columns and rows of one statement, in the HTTP API's `row` format
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<RawResult>,
    #[serde(default)]
    errors: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    code: String,
    message: String,
}

pub struct Neo4jHttpBackend {
    client: Client,
    endpoint: Url,
    credentials: Option<(String, String)>,
}

impl Neo4jHttpBackend {
    /// Prepares a backend for `uri` (e.g. `http://localhost:7474`). A missing
    /// port means Neo4j's default connector port for the scheme. Credentials
    /// embedded in the URI are used for basic authentication. No connection
    /// is opened until the first statement runs.
    pub fn connect(uri: &str, database: &str) -> Result<Self, BackendError> {
        let mut endpoint = Url::parse(uri)
            .map_err(|e| BackendError::InvalidEndpoint(format!("{}: {}", uri, e)))?;
        let default_port = match endpoint.scheme() {
            "http" => DEFAULT_HTTP_PORT,
            "https" => DEFAULT_HTTPS_PORT,
            other => {
                return Err(BackendError::InvalidEndpoint(format!(
                    "unsupported scheme '{}' in {}, expected an http:// or https:// endpoint",
                    other, uri
                )))
            }
        };
        if endpoint.host_str().map_or(true, str::is_empty) {
            return Err(BackendError::InvalidEndpoint(format!("{} has no host", uri)));
        }
        if endpoint.port().is_none() {
            endpoint
                .set_port(Some(default_port))
                .map_err(|_| BackendError::InvalidEndpoint(format!("{} cannot carry a port", uri)))?;
        }

        let credentials = if endpoint.username().is_empty() {
            None
        } else {
            let user = percent_decode_str(endpoint.username())
                .decode_utf8_lossy()
                .into_owned();
            let password = endpoint
                .password()
                .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned())
                .unwrap_or_default();
            Some((user, password))
        };

        let _ = endpoint.set_username("");
        let _ = endpoint.set_password(None);
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        endpoint
            .path_segments_mut()
            .map_err(|_| BackendError::InvalidEndpoint(format!("{} cannot carry a path", uri)))?
            .pop_if_empty()
            .extend(&["db", database, "tx", "commit"]);

        // Index builds and cold queries can run for minutes; only connecting is bounded
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| BackendError::InvalidEndpoint(format!("cannot build HTTP client: {}", e)))?;

        Ok(Neo4jHttpBackend {
            client,
            endpoint,
            credentials,
        })
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.credentials = Some((user.to_string(), password.to_string()));
        self
    }

    /// Replaces the HTTP client, e.g. to configure proxies or TLS roots.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Round trip with a trivial statement; fails fast on a bad endpoint.
    pub fn ping(&mut self) -> Result<(), BackendError> {
        self.run("RETURN 1").map(|_| ())
    }

    pub fn run(&mut self, statement: &str) -> Result<StatementResult, BackendError> {
        let payload = json!({ "statements": [{ "statement": statement }] });
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json;charset=UTF-8")
            .json(&payload);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().map_err(|source| self.connection_error(source))?;
        let status = response.status();
        let body = response.bytes().map_err(|source| self.connection_error(source))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(BackendError::Http {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let mut results = parse_commit_response(&body)?;
        debug!("Statement returned {} result set(s)", results.len());
        Ok(if results.is_empty() {
            StatementResult::default()
        } else {
            results.swap_remove(0)
        })
    }

    fn connection_error(&self, source: reqwest::Error) -> BackendError {
        BackendError::Connection {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }
}

/// Maps the JSON envelope of a commit; the first reported error wins.
pub fn parse_commit_response(body: &[u8]) -> Result<Vec<StatementResult>, BackendError> {
    let response: CommitResponse = serde_json::from_slice(body)
        .map_err(|e| BackendError::Protocol(format!("invalid JSON body: {}", e)))?;
    if let Some(error) = response.errors.into_iter().next() {
        return Err(BackendError::Database {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response
        .results
        .into_iter()
        .map(|result| StatementResult {
            columns: result.columns,
            rows: result.data.into_iter().map(|d| d.row).collect(),
        })
        .collect())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl GraphBackend for Neo4jHttpBackend {
    fn node_shapes(&mut self) -> Result<Vec<NodeShape>, BackendError> {
        let result = self.run(SCHEMA_QUERY)?;
        Ok(result
            .rows
            .iter()
            .map(|row| NodeShape {
                labels: string_list(row.first()),
                properties: string_list(row.get(1)),
            })
            .collect())
    }

    fn list_indexes(&mut self) -> Result<Vec<String>, BackendError> {
        Ok(self
            .query_column(SHOW_INDEXES)?
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    fn drop_index(&mut self, name: &str) -> Result<(), BackendError> {
        self.run(&format!("DROP INDEX {}", escape_identifier(name)))
            .map(|_| ())
    }

    fn create_index(&mut self, candidate: &IndexCandidate) -> Result<(), BackendError> {
        self.run(&candidate.create_statement()).map(|_| ())
    }

    fn await_indexes(&mut self) -> Result<(), BackendError> {
        self.run(AWAIT_INDEXES).map(|_| ())
    }

    fn clear_query_caches(&mut self) -> Result<(), BackendError> {
        self.run(CLEAR_QUERY_CACHES).map(|_| ())
    }

    fn execute(&mut self, query: &str) -> Result<(), BackendError> {
        self.run(query).map(|_| ())
    }

    fn query_column(&mut self, query: &str) -> Result<Vec<Value>, BackendError> {
        Ok(self
            .run(query)?
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }
}

/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared::templates::TemplateLibrary;
use thiserror::Error;
use url::Url;

use crate::environment::EnvironmentSettings;
use crate::error::TunerError;
use crate::neo4j_http::Neo4jHttpBackend;
use crate::workload::DEFAULT_FILTER_PROBABILITY;

pub const DEFAULT_URI: &str = "http://localhost:7474";
pub const DEFAULT_DATABASE: &str = "neo4j";
pub const DEFAULT_REWARD_SCALE: f64 = 100.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tuner settings. Every field has a default, so a JSON file only needs the
/// keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// HTTP endpoint of the Neo4j server
    pub uri: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub reward_scale: f64,
    pub filter_probability: f64,
    /// Reward of an episode whose index could not be created
    pub failed_index_reward: f64,
    /// Seed for the workload generator; entropy when absent
    pub seed: Option<u64>,
    /// JSON array of templates replacing the built-in library
    pub templates_file: Option<PathBuf>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        TunerConfig {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            user: None,
            password: None,
            reward_scale: DEFAULT_REWARD_SCALE,
            filter_probability: DEFAULT_FILTER_PROBABILITY,
            failed_index_reward: 0.0,
            seed: None,
            templates_file: None,
        }
    }
}

impl TunerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: TunerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match Url::parse(&self.uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            Ok(_) => {
                return Err(ConfigError::Invalid(format!(
                    "uri '{}' must be an http:// or https:// endpoint",
                    self.uri
                )))
            }
            Err(e) => return Err(ConfigError::Invalid(format!("uri '{}': {}", self.uri, e))),
        }
        if self.database.is_empty() {
            return Err(ConfigError::Invalid("database name is empty".to_string()));
        }
        if !(self.reward_scale.is_finite() && self.reward_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reward_scale must be positive, got {}",
                self.reward_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.filter_probability) {
            return Err(ConfigError::Invalid(format!(
                "filter_probability must lie in [0, 1], got {}",
                self.filter_probability
            )));
        }
        if !self.failed_index_reward.is_finite() {
            return Err(ConfigError::Invalid("failed_index_reward must be finite".to_string()));
        }
        Ok(())
    }

    pub fn settings(&self) -> EnvironmentSettings {
        EnvironmentSettings {
            reward_scale: self.reward_scale,
            failed_index_reward: self.failed_index_reward,
        }
    }

    pub fn template_library(&self) -> Result<TemplateLibrary, TunerError> {
        match &self.templates_file {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(TemplateLibrary::from_json_str(&text)?)
            }
            None => Ok(TemplateLibrary::builtin()),
        }
    }

    pub fn backend(&self) -> Result<Neo4jHttpBackend, TunerError> {
        let backend = Neo4jHttpBackend::connect(&self.uri, &self.database)?;
        Ok(match &self.user {
            Some(user) => backend.with_credentials(user, self.password.as_deref().unwrap_or_default()),
            None => backend,
        })
    }
}

/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CandidateError {
    #[error("index candidate on label '{0}' has no properties")]
    NoProperties(String),
    #[error("index candidate has an empty label")]
    EmptyLabel,
}

/// Backtick-quotes an identifier unless it is a plain Cypher name.
pub fn escape_identifier(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "``")))
    }
}

#[derive(Deserialize)]
struct RawCandidate {
    label: String,
    properties: Vec<String>,
}

/// One index creation action: a label plus an ordered, non-empty property list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCandidate")]
pub struct IndexCandidate {
    label: String,
    properties: Vec<String>,
}

impl TryFrom<RawCandidate> for IndexCandidate {
    type Error = CandidateError;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        IndexCandidate::new(raw.label, raw.properties)
    }
}

impl IndexCandidate {
    pub fn new<L, I, P>(label: L, properties: I) -> Result<Self, CandidateError>
    where
        L: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let label = label.into();
        if label.is_empty() {
            return Err(CandidateError::EmptyLabel);
        }
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        if properties.is_empty() {
            return Err(CandidateError::NoProperties(label));
        }
        Ok(IndexCandidate { label, properties })
    }

    pub fn single(label: impl Into<String>, property: impl Into<String>) -> Self {
        IndexCandidate {
            label: label.into(),
            properties: vec![property.into()],
        }
    }

    /// Appends a property, turning the candidate into (or extending) a composite.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.properties.push(property.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn is_composite(&self) -> bool {
        self.properties.len() > 1
    }

    /// `CREATE INDEX FOR (n:Label) ON (n.p1, n.p2)`
    pub fn create_statement(&self) -> String {
        let props = self
            .properties
            .iter()
            .map(|p| format!("n.{}", escape_identifier(p)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE INDEX FOR (n:{}) ON ({})", escape_identifier(&self.label), props)
    }
}

impl fmt::Display for IndexCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label, self.properties.join(", "))
    }
}

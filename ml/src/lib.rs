/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Text embedding providers.
//!
//! An [`Embedder`] maps a query string to a fixed-length float vector. The
//! same input always yields the same vector. Two providers ship here:
//!
//! - [`HashingEmbedder`]: pure Rust feature hashing, no model download
//! - `SentenceTransformerEmbedder` (feature `python`): the MiniLM sentence
//!   transformer through pyo3

use thiserror::Error;

pub mod hashing;
#[cfg(feature = "python")]
pub mod sentence_transformer;

pub use hashing::HashingEmbedder;
#[cfg(feature = "python")]
pub use sentence_transformer::SentenceTransformerEmbedder;

/// Output width of all-MiniLM-L6-v2
pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("python embedding call failed: {0}")]
    Python(String),
    #[error("embedding has {actual} components, expected {expected}")]
    Dimension { expected: usize, actual: usize },
    #[error("embedding contains a non-finite component at position {0}")]
    NonFinite(usize),
}

pub trait Embedder {
    /// Length of every vector returned by [`Embedder::embed`]
    fn dimension(&self) -> usize;

    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(text)
    }
}

/// Checks length and finiteness of a vector produced by an external model.
pub fn check_embedding(vector: &[f32], expected: usize) -> Result<(), EmbedError> {
    if vector.len() != expected {
        return Err(EmbedError::Dimension {
            expected,
            actual: vector.len(),
        });
    }
    match vector.iter().position(|v| !v.is_finite()) {
        Some(pos) => Err(EmbedError::NonFinite(pos)),
        None => Ok(()),
    }
}

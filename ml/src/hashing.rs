/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::{EmbedError, Embedder, DEFAULT_DIMENSION};

const BIGRAM_WEIGHT: f32 = 0.5;

/// Signed feature hashing over word unigrams and bigrams, L2-normalised.
///
/// Every component lies in [-1, 1]. Empty or token-free text maps to the
/// zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        HashingEmbedder {
            dimension: dimension.max(1),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .map(|t| t.trim_matches('.'))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = FxHasher::default();
        hasher.write(feature.as_bytes());
        let hash = hasher.finish();
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        ((hash % self.dimension as u64) as usize, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = Self::tokens(text);

        for token in &tokens {
            let (idx, sign) = self.bucket(token);
            vector[idx] += sign;
        }
        for pair in tokens.windows(2) {
            let (idx, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
            vector[idx] += sign * BIGRAM_WEIGHT;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY: &str = "MATCH (a:Person) WHERE a.name = 'Keanu Reeves' RETURN a.name, a.born";

    #[test]
    fn test_embedding_is_deterministic() {
        let mut embedder = HashingEmbedder::default();
        let first = embedder.embed(QUERY).unwrap();
        let second = HashingEmbedder::default().embed(QUERY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_embedding_is_bounded_and_normalised() {
        let vector = HashingEmbedder::default().embed(QUERY).unwrap();
        assert_eq!(vector.len(), DEFAULT_DIMENSION);
        assert!(vector.iter().all(|v| (-1.0..=1.0).contains(v)));
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_different_queries_differ() {
        let mut embedder = HashingEmbedder::default();
        let a = embedder.embed(QUERY).unwrap();
        let b = embedder.embed("MATCH (m:Movie) RETURN m.title").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let vector = HashingEmbedder::new(8).embed("  ( ) ").unwrap();
        assert_eq!(vector, vec![0.0; 8]);
    }
}

/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use pyo3::prelude::*;

use crate::{check_embedding, EmbedError, Embedder};

pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Wraps a Python `sentence_transformers.SentenceTransformer` instance.
pub struct SentenceTransformerEmbedder {
    model: PyObject,
    model_name: String,
    dimension: usize,
}

impl SentenceTransformerEmbedder {
    pub fn load(model_name: &str) -> Result<Self, EmbedError> {
        let (model, dimension) = Python::with_gil(|py| -> PyResult<(PyObject, usize)> {
            let module = py.import("sentence_transformers")?;
            let model = module.getattr("SentenceTransformer")?.call1((model_name,))?;
            let dimension: usize = model
                .call_method0("get_sentence_embedding_dimension")?
                .extract()?;
            Ok((model.unbind(), dimension))
        })
        .map_err(|e| EmbedError::Python(e.to_string()))?;

        log::info!("Loaded sentence transformer '{}' ({} dims)", model_name, dimension);
        Ok(SentenceTransformerEmbedder {
            model,
            model_name: model_name.to_string(),
            dimension,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl Embedder for SentenceTransformerEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let vector = Python::with_gil(|py| -> PyResult<Vec<f32>> {
            // encode() hands back a numpy array; tolist() keeps extraction numpy-free
            self.model
                .bind(py)
                .call_method1("encode", (text,))?
                .call_method0("tolist")?
                .extract()
        })
        .map_err(|e| EmbedError::Python(e.to_string()))?;

        check_embedding(&vector, self.dimension)?;
        Ok(vector)
    }
}

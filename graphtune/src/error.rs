/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use ml::EmbedError;
use shared::templates::TemplateError;
use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum TunerError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("value pool '{0}' is empty")]
    EmptyPool(&'static str),

    #[error("index candidate catalog is empty")]
    EmptyCatalog,

    /// The learner asked for an action outside `[0, count)`
    #[error("action {action} is outside the action space [0, {count})")]
    ActionOutOfRange { action: i64, count: usize },

    #[error("step called without an active episode; call reset first")]
    NoActiveEpisode,

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error("embedder produces {actual}-dimensional vectors, observations need {expected}")]
    ObservationDimension { expected: usize, actual: usize },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::{Duration, Instant};

use log::debug;

use crate::backend::{BackendError, GraphBackend};

/// Measures one execution of a query on a cold plan cache.
pub trait LatencyProbe {
    fn measure(&mut self, backend: &mut dyn GraphBackend, query: &str) -> Result<Duration, BackendError>;
}

/// Clears the query caches, then times a single fully consumed execution
/// with the wall clock. One sample, no averaging.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClockProbe;

impl LatencyProbe for WallClockProbe {
    fn measure(&mut self, backend: &mut dyn GraphBackend, query: &str) -> Result<Duration, BackendError> {
        backend.clear_query_caches()?;
        let start = Instant::now();
        backend.execute(query)?;
        let elapsed = start.elapsed();
        debug!("Query executed in {:?}", elapsed);
        Ok(elapsed)
    }
}

impl<P: LatencyProbe + ?Sized> LatencyProbe for Box<P> {
    fn measure(&mut self, backend: &mut dyn GraphBackend, query: &str) -> Result<Duration, BackendError> {
        (**self).measure(backend, query)
    }
}

/// `scale * (baseline - indexed)` in seconds; positive when the index helped.
pub fn latency_reward(scale: f64, baseline: Duration, indexed: Duration) -> f64 {
    scale * (baseline.as_secs_f64() - indexed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_for_speedup() {
        let reward = latency_reward(100.0, Duration::from_millis(100), Duration::from_millis(40));
        assert!((reward - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_reward_for_regression() {
        let reward = latency_reward(100.0, Duration::from_millis(100), Duration::from_millis(150));
        assert!((reward + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_reward_is_zero_without_change() {
        let d = Duration::from_micros(1234);
        assert_eq!(latency_reward(100.0, d, d), 0.0);
    }
}

//! Turns crack geometry into a score in `[0, 100]`.
//!
//! With cracks the score is the cracked share of the image scaled by `K` and
//! capped. Without cracks there is nothing to measure: the score comes from a
//! pluggable [`HealthyScore`], a heuristic stand-in rather than a calibrated
//! probability.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;

use crate::config::ConfidenceConfig;

/// Score reported for an image with no accepted crack contours.
pub trait HealthyScore: Send + Sync {
    fn score(&self) -> f32;
}

/// Draws from `[low, high)` with an RNG reseeded on every call: the same
/// seed always gives the same score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeededBand {
    pub low: f32,
    pub high: f32,
    pub seed: u64,
}

impl SeededBand {
    pub fn new(low: f32, high: f32, seed: u64) -> Self {
        Self { low, high, seed }
    }
}

impl HealthyScore for SeededBand {
    fn score(&self) -> f32 {
        if !(self.low < self.high) {
            return self.low;
        }
        StdRng::seed_from_u64(self.seed).gen_range(self.low..self.high)
    }
}

/// Fresh thread-local randomness per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyBand {
    pub low: f32,
    pub high: f32,
}

impl EntropyBand {
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }
}

impl HealthyScore for EntropyBand {
    fn score(&self) -> f32 {
        if !(self.low < self.high) {
            return self.low;
        }
        rand::thread_rng().gen_range(self.low..self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScore(pub f32);

impl HealthyScore for FixedScore {
    fn score(&self) -> f32 {
        self.0
    }
}

/// `min(cap, total_area / image_area * scale)`, clamped to `[0, 100]`
pub fn crack_confidence(total_area: f64, image_area: f64, scale: f64, cap: f64) -> f32 {
    if image_area <= 0.0 {
        return 0.0;
    }
    to_percent(((total_area / image_area) * scale).min(cap) as f32)
}

/// Clamp into `[0, 100]`. NaN maps to 0, which `f32::clamp` would pass through.
fn to_percent(score: f32) -> f32 {
    score.max(0.0).min(100.0)
}

#[derive(Clone)]
pub struct ConfidenceEstimator {
    scale: f64,
    cap: f64,
    healthy: Arc<dyn HealthyScore>,
}

impl fmt::Debug for ConfidenceEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfidenceEstimator")
            .field("scale", &self.scale)
            .field("cap", &self.cap)
            .finish_non_exhaustive()
    }
}

impl ConfidenceEstimator {
    /// Seeded band when `config.seed` is set, entropy band otherwise.
    pub fn from_config(config: &ConfidenceConfig) -> Self {
        let healthy: Arc<dyn HealthyScore> = match config.seed {
            Some(seed) => Arc::new(SeededBand::new(config.healthy_low, config.healthy_high, seed)),
            None => Arc::new(EntropyBand::new(config.healthy_low, config.healthy_high)),
        };
        Self {
            scale: config.scale,
            cap: config.cap,
            healthy,
        }
    }

    pub fn with_healthy_score(mut self, healthy: impl HealthyScore + 'static) -> Self {
        self.healthy = Arc::new(healthy);
        self
    }

    pub fn estimate(&self, crack_count: usize, total_area: f64, image_area: f64) -> f32 {
        if crack_count == 0 {
            to_percent(self.healthy.score())
        } else {
            crack_confidence(total_area, image_area, self.scale, self.cap)
        }
    }
}

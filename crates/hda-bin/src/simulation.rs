// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Simulated value source.
//!
//! Each sample is `offset + amplitude * sin(2π t / period + phase)`, plus
//! uniform noise in `[-noise, noise]` when noise is configured.

use std::f64::consts::TAU;
use std::time::Duration;

use hda_config::SimulationSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sine-wave generator with optional noise.
#[derive(Debug)]
pub struct SignalGenerator {
    amplitude: f64,
    period: Duration,
    noise: f64,
    rng: StdRng,
}

impl SignalGenerator {
    /// Creates a generator seeded from the OS.
    pub fn new(settings: &SimulationSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Creates a reproducible generator.
    pub fn with_seed(settings: &SimulationSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: &SimulationSettings, rng: StdRng) -> Self {
        Self {
            amplitude: settings.amplitude,
            period: settings.period,
            noise: settings.noise,
            rng,
        }
    }

    /// Produces the sample for `elapsed` time since start.
    pub fn sample(&mut self, offset: f64, phase: f64, elapsed: Duration) -> f64 {
        let angle = TAU * elapsed.as_secs_f64() / self.period.as_secs_f64() + phase;
        let mut value = offset + self.amplitude * angle.sin();
        if self.noise > 0.0 {
            value += self.rng.gen_range(-self.noise..=self.noise);
        }
        value
    }
}

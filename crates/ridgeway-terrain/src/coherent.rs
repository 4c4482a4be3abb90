//! Seeded coherent noise for height synthesis

use noise::{NoiseFn, Perlin};
use ridgeway_core::Seed;

/// Deterministic, continuous 2D gradient noise.
///
/// Same seed, same coordinates, same value, on every run.
#[derive(Clone)]
pub struct CoherentNoise {
    perlin: Perlin,
    seed: u32,
}

impl CoherentNoise {
    pub fn new(seed: &Seed) -> Self {
        Self::from_raw_seed(seed.noise_seed())
    }

    pub fn from_raw_seed(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Single-layer noise in [-1, 1]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        self.perlin.get([x, z]).clamp(-1.0, 1.0)
    }

    /// Fractional Brownian motion: `octaves` layers of [`sample`](Self::sample),
    /// amplitude scaled by `persistence` and frequency by `lacunarity` per
    /// layer, normalized by the total amplitude so the result stays in [-1, 1].
    pub fn octave_sample(
        &self,
        x: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude > 0.0 {
            (total / max_amplitude).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

impl std::fmt::Debug for CoherentNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoherentNoise").field("seed", &self.seed).finish()
    }
}

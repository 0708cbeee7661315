//! The run's single pseudo-random stream.
//!
//! Every sampler draws from one `RandomSource` seeded once at pipeline
//! start. Draw order is the resolver's depth-first, key-ordered walk, so
//! the same document and seed always produce the same samples.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: StdRng,
    draws: u64,
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self {
        Self { seed, rng: StdRng::seed_from_u64(seed), draws: 0 }
    }

    /// A fresh, unpredictable seed. The seed is kept so the run can be replayed.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::rng().random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of primitive draws taken so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        self.rng.random()
    }

    /// Uniform in `[min, max]`; `min == max` yields `min`. Caller ensures `min <= max`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Uniform integer in `[min, max]` (inclusive). Caller ensures `min <= max`.
    pub fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        self.draws += 1;
        self.rng.random_range(min..=max)
    }

    pub fn coin(&mut self) -> bool {
        self.draws += 1;
        self.rng.random()
    }

    /// Uniform index in `0..len`. Caller ensures `len > 0`.
    pub fn index(&mut self, len: usize) -> usize {
        self.draws += 1;
        self.rng.random_range(0..len)
    }

    /// `amount` distinct indices from `0..len`, in draw order.
    pub fn distinct_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        self.draws += amount as u64;
        rand::seq::index::sample(&mut self.rng, len, amount).into_vec()
    }

    /// Uniform direction on the unit sphere, by rejection from the cube.
    pub fn unit_vector(&mut self) -> [f64; 3] {
        loop {
            let v = [
                self.uniform(-1.0, 1.0),
                self.uniform(-1.0, 1.0),
                self.uniform(-1.0, 1.0),
            ];
            let norm_sq = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
            if norm_sq > 1e-12 && norm_sq <= 1.0 {
                let norm = norm_sq.sqrt();
                return [v[0] / norm, v[1] / norm, v[2] / norm];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomSource::seeded(7);
        let mut b = RandomSource::seeded(7);
        let xs: Vec<f64> = (0..16).map(|_| a.next_f64()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.next_f64()).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.draws(), 16);
    }

    #[test]
    fn test_uniform_bounds() {
        let mut rng = RandomSource::seeded(1);
        for _ in 0..1000 {
            let x = rng.uniform(2.0, 3.0);
            assert!((2.0..=3.0).contains(&x));
        }
        assert_eq!(rng.uniform(5.0, 5.0), 5.0);
    }

    #[test]
    fn test_distinct_indices() {
        let mut rng = RandomSource::seeded(3);
        let mut picked = rng.distinct_indices(10, 4);
        assert_eq!(picked.len(), 4);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 4);
        assert_eq!(rng.distinct_indices(2, 5).len(), 2);
    }

    #[test]
    fn test_unit_vector_is_normalized() {
        let mut rng = RandomSource::seeded(11);
        for _ in 0..100 {
            let [x, y, z] = rng.unit_vector();
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-9);
        }
    }
}

// Copyright (C) 2024 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Random state helpers. Every transform draws from a generator handed to it
//! by the caller, so one sample's augmentation is reproducible from its seed
//! and parallel workers never share a stream.

use rand::prelude::*;
use rand_distr::Uniform;

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}

/// Derives the seed of the `index`-th sample from a base seed (splitmix64 finalizer).
pub fn sample_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn sample_rng(base: u64, index: u64) -> StdRng {
    seeded(sample_seed(base, index))
}

/// Fair coin flip.
pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_bool(0.5)
}

/// Uniform draw from `[low, high)`. A degenerate range yields `low` instead of panicking.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high <= low {
        return low;
    }
    rng.gen_range(low..high)
}

/// `size` independent draws from `[0, 1)`.
pub fn unit_vector<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<f32> {
    let unit = Uniform::new(0.0f32, 1.0f32);
    (0..size).map(|_| unit.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_uniform_returns_low() {
        let mut rng = seeded(1);
        assert_eq!(uniform(&mut rng, 3.0, 3.0), 3.0);
    }

    #[test]
    fn sample_seeds_differ_per_index() {
        let seeds: Vec<u64> = (0..16).map(|index| sample_seed(42, index)).collect();
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(sample_seed(42, 3), sample_seed(42, 3));
    }

    #[test]
    fn unit_vector_stays_in_range() {
        let mut rng = seeded(7);
        let values = unit_vector(&mut rng, 256);
        assert_eq!(values.len(), 256);
        assert!(values.iter().all(|&v| (0.0..1.0).contains(&v)));
    }
}

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

use crate::core::random;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Hands out dataset indices one epoch at a time.
pub trait Sampler: Send + Sync {
    /// Next `n` indices of the current epoch; fewer at the end of the epoch
    /// and none once it is exhausted.
    fn sample(&mut self, n: usize) -> Vec<usize>;
    /// Starts a new epoch.
    fn reset(&mut self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct RandomSampler {
    data_len: usize,
    current_index: usize,
    indices: Vec<usize>,
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(data_len: usize, seed: u64) -> Self {
        let mut sampler = RandomSampler {
            data_len,
            current_index: 0,
            indices: (0..data_len).collect(),
            rng: random::seeded(seed),
        };
        sampler.reset();
        sampler
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, n: usize) -> Vec<usize> {
        let start = self.current_index.min(self.data_len);
        let end = (start + n).min(self.data_len);
        self.current_index = end;
        self.indices[start..end].to_vec()
    }

    fn reset(&mut self) {
        self.indices.shuffle(&mut self.rng);
        self.current_index = 0;
    }

    fn len(&self) -> usize {
        self.data_len
    }
}

pub struct SequentialSampler {
    data_len: usize,
    current_index: usize,
}

impl SequentialSampler {
    pub fn new(data_len: usize) -> Self {
        SequentialSampler {
            data_len,
            current_index: 0,
        }
    }
}

impl Sampler for SequentialSampler {
    fn sample(&mut self, n: usize) -> Vec<usize> {
        let start = self.current_index.min(self.data_len);
        let end = (start + n).min(self.data_len);
        self.current_index = end;
        (start..end).collect()
    }

    fn reset(&mut self) {
        self.current_index = 0;
    }

    fn len(&self) -> usize {
        self.data_len
    }
}

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

use crate::core::error::BellandeError;
use crate::core::random;
use crate::core::tensor::Tensor;
use crate::data::augmentation::DanAugmentation;
use crate::data::sample::{Sample, TensorSample};
use crate::data::sampler::{RandomSampler, Sampler, SequentialSampler};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Source of raw samples. Reading frames and annotations from disk is the
/// implementor's business; the loader only asks for samples by index.
pub trait PairDataset: Send + Sync {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Result<Sample, BellandeError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A collated batch. Masks carry a singleton axis: `[B, 1, M+1]`.
#[derive(Clone, Debug)]
pub enum Batch {
    Single {
        frames: Tensor,
        boxes: Tensor,
        masks: Tensor,
    },
    Paired {
        frames_a: Tensor,
        frames_b: Tensor,
        boxes_a: Tensor,
        boxes_b: Tensor,
        labels: Tensor,
        masks_a: Tensor,
        masks_b: Tensor,
    },
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Batch::Single { frames, .. } => frames.shape()[0],
            Batch::Paired { frames_a, .. } => frames_a.shape()[0],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, Batch::Paired { .. })
    }
}

fn stack_masks(masks: &[Tensor]) -> Result<Tensor, BellandeError> {
    Tensor::stack(masks)?.unsqueeze(1)
}

/// Stacks augmented samples along a new leading batch axis. Every sample
/// must be of the same kind.
pub fn collate(batch: Vec<TensorSample>) -> Result<Batch, BellandeError> {
    if batch.is_empty() {
        return Err(BellandeError::InvalidInputs(
            "Empty batch provided".to_string(),
        ));
    }

    let paired = batch.iter().filter(|s| s.is_paired()).count();
    let single = batch.len() - paired;
    if paired > 0 && single > 0 {
        return Err(BellandeError::MixedBatch { paired, single });
    }

    if single > 0 {
        let mut frames = Vec::with_capacity(single);
        let mut boxes = Vec::with_capacity(single);
        let mut masks = Vec::with_capacity(single);
        for sample in batch {
            if let TensorSample::Single {
                frame,
                boxes: b,
                mask,
            } = sample
            {
                frames.push(frame);
                boxes.push(b);
                masks.push(mask);
            }
        }
        return Ok(Batch::Single {
            frames: Tensor::stack(&frames)?,
            boxes: Tensor::stack(&boxes)?,
            masks: stack_masks(&masks)?,
        });
    }

    let mut frames_a = Vec::with_capacity(paired);
    let mut frames_b = Vec::with_capacity(paired);
    let mut boxes_a = Vec::with_capacity(paired);
    let mut boxes_b = Vec::with_capacity(paired);
    let mut labels = Vec::with_capacity(paired);
    let mut masks_a = Vec::with_capacity(paired);
    let mut masks_b = Vec::with_capacity(paired);
    for sample in batch {
        if let TensorSample::Paired {
            frame_a,
            frame_b,
            boxes_a: ba,
            boxes_b: bb,
            labels: l,
            mask_a,
            mask_b,
        } = sample
        {
            frames_a.push(frame_a);
            frames_b.push(frame_b);
            boxes_a.push(ba);
            boxes_b.push(bb);
            labels.push(l);
            masks_a.push(mask_a);
            masks_b.push(mask_b);
        }
    }

    Ok(Batch::Paired {
        frames_a: Tensor::stack(&frames_a)?,
        frames_b: Tensor::stack(&frames_b)?,
        boxes_a: Tensor::stack(&boxes_a)?,
        boxes_b: Tensor::stack(&boxes_b)?,
        labels: Tensor::stack(&labels)?,
        masks_a: stack_masks(&masks_a)?,
        masks_b: stack_masks(&masks_b)?,
    })
}

pub struct DataLoader {
    dataset: Arc<dyn PairDataset>,
    augmentation: Arc<DanAugmentation>,
    batch_size: usize,
    num_workers: usize,
    pool: Option<rayon::ThreadPool>,
    sampler: Arc<Mutex<Box<dyn Sampler>>>,
    drop_last: bool,
    seed: u64,
    epoch: AtomicU64,
}

impl DataLoader {
    pub fn new(
        dataset: Arc<dyn PairDataset>,
        augmentation: Arc<DanAugmentation>,
        batch_size: usize,
        shuffle: bool,
        num_workers: usize,
        seed: u64,
    ) -> Result<Self, BellandeError> {
        if batch_size == 0 {
            return Err(BellandeError::InvalidParameter(
                "batch size must be positive".into(),
            ));
        }

        let sampler: Box<dyn Sampler> = if shuffle {
            Box::new(RandomSampler::new(dataset.len(), seed))
        } else {
            Box::new(SequentialSampler::new(dataset.len()))
        };

        let pool = if num_workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_workers)
                    .build()
                    .map_err(|e| BellandeError::InvalidConfiguration(e.to_string()))?,
            )
        } else {
            None
        };

        log::info!(
            "data loader over {} samples: batch size {}, {} workers, {} pipeline",
            dataset.len(),
            batch_size,
            num_workers.max(1),
            augmentation.mode()
        );

        Ok(DataLoader {
            dataset,
            augmentation,
            batch_size,
            num_workers,
            pool,
            sampler: Arc::new(Mutex::new(sampler)),
            drop_last: false,
            seed,
            epoch: AtomicU64::new(0),
        })
    }

    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Arc::new(Mutex::new(sampler));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of batches in one epoch.
    pub fn len(&self) -> usize {
        let samples = self.dataset.len();
        if self.drop_last {
            samples / self.batch_size
        } else {
            (samples + self.batch_size - 1) / self.batch_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Augments one dataset entry with a generator derived from the loader
    /// seed, the epoch and the dataset index, so results do not depend on
    /// which worker picks the sample up.
    pub fn load(&self, epoch: u64, index: usize) -> Result<TensorSample, BellandeError> {
        let mut rng = random::sample_rng(random::sample_seed(self.seed, epoch), index as u64);
        let sample = self.dataset.get(index)?;
        self.augmentation.augment(sample, &mut rng)
    }

    fn load_batch(&self, epoch: u64, indices: &[usize]) -> Result<Vec<TensorSample>, BellandeError> {
        match &self.pool {
            Some(pool) => pool.install(|| {
                indices
                    .par_iter()
                    .map(|&idx| self.load(epoch, idx))
                    .collect()
            }),
            None => indices.iter().map(|&idx| self.load(epoch, idx)).collect(),
        }
    }

    /// Starts a new epoch. The epoch's index order is drawn from the sampler
    /// up front, so every iterator owns its order and a later `iter()` call
    /// does not disturb one still in progress.
    pub fn iter(&self) -> Result<DataLoaderIterator<'_>, BellandeError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut sampler = self.sampler.lock().map_err(|_| BellandeError::LockError)?;
        sampler.reset();

        let mut indices = Vec::with_capacity(sampler.len());
        loop {
            let chunk = sampler.sample(self.batch_size);
            if chunk.is_empty() {
                break;
            }
            indices.extend(chunk);
        }

        Ok(DataLoaderIterator {
            dataloader: self,
            epoch,
            indices,
            cursor: 0,
        })
    }
}

pub struct DataLoaderIterator<'a> {
    dataloader: &'a DataLoader,
    epoch: u64,
    indices: Vec<usize>,
    cursor: usize,
}

impl<'a> Iterator for DataLoaderIterator<'a> {
    type Item = Result<Batch, BellandeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let loader = self.dataloader;
        let end = (self.cursor + loader.batch_size).min(self.indices.len());
        let batch_indices = &self.indices[self.cursor..end];
        if batch_indices.is_empty()
            || (loader.drop_last && batch_indices.len() < loader.batch_size)
        {
            return None;
        }
        self.cursor = end;

        Some(
            loader
                .load_batch(self.epoch, batch_indices)
                .and_then(collate),
        )
    }
}

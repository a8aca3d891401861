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
use crate::data::crop::RandomSampleCrop;
use crate::data::formatting::{to_tensor, FormatBoxes, ResizeShuffleBoxes};
use crate::data::geometric_augmentation::{Expand, MoveBoxes, RandomMirror, Resize, ToPercentCoords};
use crate::data::image_transformation_augmentation::PhotometricDistort;
use crate::data::preprocessing::{ConvertFromInts, SubtractMeans};
use crate::data::sample::{Sample, TensorSample};
use crate::utilities::config::Configuration;
use rand::rngs::StdRng;
use std::fmt;
use std::str::FromStr;

/// One stage of the augmentation chain. A stage consumes a sample and
/// returns a sample of the same kind, drawing randomness only from `rng`.
pub trait Transform: Send + Sync {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError>;
    fn name(&self) -> &str;
}

pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Compose { transforms }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Transform for Compose {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        let mut current = sample;
        for transform in &self.transforms {
            current = transform.apply(current, rng)?;
        }
        Ok(current)
    }

    fn name(&self) -> &str {
        "Compose"
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineMode {
    /// Full augmentation chain.
    Train,
    /// Resize and normalize, then shuffle/pad.
    Val,
    /// Resize and normalize only, no shuffle or padding.
    Test,
}

impl FromStr for PipelineMode {
    type Err = BellandeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "train" => PipelineMode::Train,
            "val" | "valid" => PipelineMode::Val,
            _ => PipelineMode::Test,
        })
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineMode::Train => write!(f, "train"),
            PipelineMode::Val => write!(f, "val"),
            PipelineMode::Test => write!(f, "test"),
        }
    }
}

/// The tracking-pair augmentation pipeline for one mode.
pub struct DanAugmentation {
    mode: PipelineMode,
    capacity: usize,
    augment: Compose,
}

impl DanAugmentation {
    pub fn new(config: &Configuration, mode: PipelineMode) -> Result<Self, BellandeError> {
        config.validate()?;
        let aug = &config.augmentation;
        let size = config.datasets.image_size;
        let capacity = config.datasets.max_object;

        let mut transforms: Vec<Box<dyn Transform>> = vec![Box::new(ConvertFromInts)];

        if mode == PipelineMode::Train {
            transforms.push(Box::new(MoveBoxes::new(aug.lower_offset, aug.upper_offset)?));
            transforms.push(Box::new(PhotometricDistort::with_deltas(
                aug.lower_contrast,
                aug.upper_contrast,
                aug.lower_saturation,
                aug.upper_saturation,
                aug.brightness_delta,
                aug.hue_delta,
            )?));
            transforms.push(Box::new(Expand::with_probability(
                aug.mean_pixel.clone(),
                aug.max_expand,
                aug.expand_probability,
            )?));
            transforms.push(Box::new(
                RandomSampleCrop::new().with_strict_overlap(aug.strict_overlap),
            ));
            transforms.push(Box::new(RandomMirror));
        }

        transforms.push(Box::new(ToPercentCoords));
        transforms.push(Box::new(Resize::new(size)?));
        transforms.push(Box::new(SubtractMeans::new(aug.mean_pixel.clone())?));

        if mode != PipelineMode::Test {
            transforms.push(Box::new(ResizeShuffleBoxes::new(capacity)?));
        }
        transforms.push(Box::new(FormatBoxes));

        let augment = Compose::new(transforms);
        log::info!(
            "built {} augmentation pipeline: {}",
            mode,
            augment.names().join(" -> ")
        );

        Ok(DanAugmentation {
            mode,
            capacity,
            augment,
        })
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stages(&self) -> Vec<&str> {
        self.augment.names()
    }

    /// Runs the chain and converts the result into model-ready tensors.
    pub fn augment(&self, sample: Sample, rng: &mut StdRng) -> Result<TensorSample, BellandeError> {
        to_tensor(self.apply(sample, rng)?)
    }
}

impl Transform for DanAugmentation {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        self.augment.apply(sample, rng)
    }

    fn name(&self) -> &str {
        "DanAugmentation"
    }
}

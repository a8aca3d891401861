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

use crate::core::{dtype::DataType, error::BellandeError, tensor::Tensor};
use crate::data::augmentation::Transform;
use crate::data::sample::Sample;
use rand::rngs::StdRng;

/// Retypes 8-bit frames to float so the photometric stages can leave [0, 255].
pub struct ConvertFromInts;

impl Transform for ConvertFromInts {
    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames(|frame| match frame.dtype {
            DataType::UInt8 | DataType::Float32 => Ok(frame.with_dtype(DataType::Float32)),
            DataType::Bool => Err(BellandeError::InvalidDataType),
        })
    }

    fn name(&self) -> &str {
        "ConvertFromInts"
    }
}

/// Per-channel mean subtraction.
pub struct SubtractMeans {
    mean: Vec<f32>,
}

impl SubtractMeans {
    pub fn new(mean: Vec<f32>) -> Result<Self, BellandeError> {
        if mean.is_empty() || mean.iter().any(|m| !m.is_finite()) {
            return Err(BellandeError::InvalidParameter(format!(
                "mean pixel must be a non-empty list of finite values, got {:?}",
                mean
            )));
        }
        Ok(SubtractMeans { mean })
    }

    fn subtract(&self, frame: Tensor) -> Result<Tensor, BellandeError> {
        let (_, _, channels) = frame.frame_dims()?;
        if channels != self.mean.len() {
            return Err(BellandeError::ShapeMismatch(format!(
                "frame has {} channels but {} means were configured",
                channels,
                self.mean.len()
            )));
        }

        let mut normalized = frame.data;
        for pixel in normalized.chunks_mut(channels) {
            for (value, mean) in pixel.iter_mut().zip(self.mean.iter()) {
                *value -= mean;
            }
        }

        Ok(Tensor::new(normalized, frame.shape, DataType::Float32))
    }
}

impl Transform for SubtractMeans {
    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames(|frame| self.subtract(frame))
    }

    fn name(&self) -> &str {
        "SubtractMeans"
    }
}

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
use crate::data::correspondence;
use crate::data::sample::{BoxCoords, BoxSet, Sample, TensorSample};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Coordinate stored in padding slots until `FormatBoxes` remaps it.
pub const PADDING_SENTINEL: f32 = f32::INFINITY;

/// Encoded value of a padding slot after formatting, outside the [-1, 1] range of real centers.
pub const FORMATTED_PADDING: f32 = 1.5;

/// Pads `boxes` with sentinel rows up to `capacity`. The returned mask marks
/// the real boxes, which keep their original order.
pub fn pad_boxes(
    boxes: &[[f32; 4]],
    capacity: usize,
) -> Result<(Vec<[f32; 4]>, Vec<bool>), BellandeError> {
    if boxes.len() > capacity {
        return Err(BellandeError::CapacityExceeded {
            boxes: boxes.len(),
            capacity,
        });
    }

    let mut padded = boxes.to_vec();
    padded.resize(capacity, [PADDING_SENTINEL; 4]);
    let mask = (0..capacity).map(|k| k < boxes.len()).collect();
    Ok((padded, mask))
}

/// Fixes every box set to `capacity` entries in random order and grows the
/// correspondence matrix to `(capacity + 1) x (capacity + 1)`.
pub struct ResizeShuffleBoxes {
    capacity: usize,
}

impl ResizeShuffleBoxes {
    pub fn new(capacity: usize) -> Result<Self, BellandeError> {
        if capacity == 0 {
            return Err(BellandeError::InvalidParameter(
                "box capacity must be positive".into(),
            ));
        }
        Ok(ResizeShuffleBoxes { capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the shuffled boxes, their validity mask and the permutation
    /// used, where slot `k` now holds former slot `order[k]`.
    fn shuffle(
        &self,
        boxes: &BoxSet,
        rng: &mut StdRng,
    ) -> Result<(Vec<[f32; 4]>, Vec<bool>, Vec<usize>), BellandeError> {
        let corners = boxes.corners()?;
        let (padded, _) = pad_boxes(corners, self.capacity)?;

        let mut order: Vec<usize> = (0..self.capacity).collect();
        order.shuffle(rng);

        let shuffled = order.iter().map(|&k| padded[k]).collect();
        let mask = order.iter().map(|&k| k < corners.len()).collect();
        Ok((shuffled, mask, order))
    }
}

fn with_bucket(boxes: Vec<[f32; 4]>, mut mask: Vec<bool>) -> BoxSet {
    mask.push(true);
    BoxSet::with_mask(BoxCoords::Corners(boxes), mask)
}

impl Transform for ResizeShuffleBoxes {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        match sample {
            Sample::Single { frame, boxes } => {
                let (shuffled, mask, _) = self.shuffle(&boxes, rng)?;
                Ok(Sample::Single {
                    frame,
                    boxes: with_bucket(shuffled, mask),
                })
            }
            Sample::Paired {
                frame_a,
                frame_b,
                boxes_a,
                boxes_b,
                labels,
            } => {
                let (shuffled_a, mask_a, order_a) = self.shuffle(&boxes_a, rng)?;
                let (shuffled_b, mask_b, order_b) = self.shuffle(&boxes_b, rng)?;

                let labels = correspondence::pad_to(&labels, self.capacity, self.capacity)?;
                let labels = correspondence::reorder(&labels, &order_a, &order_b)?;
                let labels = correspondence::append_no_match(&labels, &mask_a, &mask_b)?;

                Ok(Sample::Paired {
                    frame_a,
                    frame_b,
                    boxes_a: with_bucket(shuffled_a, mask_a),
                    boxes_b: with_bucket(shuffled_b, mask_b),
                    labels,
                })
            }
        }
    }

    fn name(&self) -> &str {
        "ResizeShuffleBoxes"
    }
}

/// Collapses each percent box to its center mapped onto [-1, 1].
pub struct FormatBoxes;

pub fn format_point(corners: &[f32; 4]) -> [f32; 2] {
    let encode = |v: f32| if v.is_finite() { v } else { FORMATTED_PADDING };
    [
        encode(corners[0] + corners[2] - 1.0),
        encode(corners[1] + corners[3] - 1.0),
    ]
}

impl Transform for FormatBoxes {
    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames_and_boxes(|frame, boxes| {
            let (coords, mask) = boxes.into_parts();
            let points = match coords {
                BoxCoords::Corners(corners) => corners.iter().map(format_point).collect(),
                BoxCoords::Centers(_) => {
                    return Err(BellandeError::InvalidOperation(
                        "boxes were already formatted".into(),
                    ))
                }
            };
            Ok((frame, BoxSet::from_parts(BoxCoords::Centers(points), mask)))
        })
    }

    fn name(&self) -> &str {
        "FormatBoxes"
    }
}

fn frame_tensor(frame: Tensor) -> Result<Tensor, BellandeError> {
    frame.frame_dims()?;
    Ok(frame.permute(&[2, 0, 1])?.with_dtype(DataType::Float32))
}

fn box_tensor(boxes: &BoxSet) -> Result<Tensor, BellandeError> {
    match boxes.coords() {
        BoxCoords::Centers(points) => Tensor::from_vec(
            points.iter().flatten().copied().collect(),
            vec![points.len(), 1, 1, 2],
            DataType::Float32,
        ),
        BoxCoords::Corners(corners) => Tensor::from_vec(
            corners.iter().flatten().copied().collect(),
            vec![corners.len(), 4],
            DataType::Float32,
        ),
    }
}

fn mask_tensor(boxes: &BoxSet) -> Option<Tensor> {
    boxes.mask().map(Tensor::from_mask)
}

/// Converts an augmented sample into model-ready tensors: frames become
/// `[C, H, W]`, formatted boxes `[N, 1, 1, 2]` and labels `[1, M+1, M+1]`.
///
/// A single frame without a validity mask (test pipelines skip the shuffle)
/// gets an all-valid mask including the no-match slot. Paired samples must
/// have been through [`ResizeShuffleBoxes`].
pub fn to_tensor(sample: Sample) -> Result<TensorSample, BellandeError> {
    match sample {
        Sample::Single { frame, boxes } => {
            let mask = mask_tensor(&boxes)
                .unwrap_or_else(|| Tensor::from_mask(&vec![true; boxes.len() + 1]));
            Ok(TensorSample::Single {
                frame: frame_tensor(frame)?,
                boxes: box_tensor(&boxes)?,
                mask,
            })
        }
        Sample::Paired {
            frame_a,
            frame_b,
            boxes_a,
            boxes_b,
            labels,
        } => {
            let (mask_a, mask_b) = match (mask_tensor(&boxes_a), mask_tensor(&boxes_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(BellandeError::InvalidOperation(
                        "paired samples need validity masks; run ResizeShuffleBoxes first".into(),
                    ))
                }
            };
            Ok(TensorSample::Paired {
                frame_a: frame_tensor(frame_a)?,
                frame_b: frame_tensor(frame_b)?,
                boxes_a: box_tensor(&boxes_a)?,
                boxes_b: box_tensor(&boxes_b)?,
                labels: labels.with_dtype(DataType::Float32).unsqueeze(0)?,
                mask_a,
                mask_b,
            })
        }
    }
}

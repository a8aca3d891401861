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

use crate::core::{error::BellandeError, tensor::Tensor};
use crate::data::correspondence;

/// Box coordinates of one frame. Corner boxes are `[x1, y1, x2, y2]`; once
/// `FormatBoxes` has run each box collapses to a centered `[x, y]` point.
#[derive(Clone, Debug, PartialEq)]
pub enum BoxCoords {
    Corners(Vec<[f32; 4]>),
    Centers(Vec<[f32; 2]>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxSet {
    coords: BoxCoords,
    mask: Option<Vec<bool>>,
}

impl BoxSet {
    pub fn new(boxes: Vec<[f32; 4]>) -> Self {
        BoxSet {
            coords: BoxCoords::Corners(boxes),
            mask: None,
        }
    }

    pub fn with_mask(coords: BoxCoords, mask: Vec<bool>) -> Self {
        BoxSet {
            coords,
            mask: Some(mask),
        }
    }

    pub fn from_parts(coords: BoxCoords, mask: Option<Vec<bool>>) -> Self {
        BoxSet { coords, mask }
    }

    pub fn coords(&self) -> &BoxCoords {
        &self.coords
    }

    pub fn len(&self) -> usize {
        match &self.coords {
            BoxCoords::Corners(boxes) => boxes.len(),
            BoxCoords::Centers(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validity mask; real boxes are `true`, padding slots `false`. The mask
    /// is one entry longer than the box list because of the no-match bucket.
    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    pub fn corners(&self) -> Result<&[[f32; 4]], BellandeError> {
        match &self.coords {
            BoxCoords::Corners(boxes) => Ok(boxes),
            BoxCoords::Centers(_) => Err(BellandeError::InvalidOperation(
                "boxes were already formatted to center points".into(),
            )),
        }
    }

    pub fn corners_mut(&mut self) -> Result<&mut Vec<[f32; 4]>, BellandeError> {
        match &mut self.coords {
            BoxCoords::Corners(boxes) => Ok(boxes),
            BoxCoords::Centers(_) => Err(BellandeError::InvalidOperation(
                "boxes were already formatted to center points".into(),
            )),
        }
    }

    pub fn centers(&self) -> Result<&[[f32; 2]], BellandeError> {
        match &self.coords {
            BoxCoords::Centers(points) => Ok(points),
            BoxCoords::Corners(_) => Err(BellandeError::InvalidOperation(
                "boxes have not been formatted to center points".into(),
            )),
        }
    }

    pub fn into_parts(self) -> (BoxCoords, Option<Vec<bool>>) {
        (self.coords, self.mask)
    }

    fn validate(&self, height: usize, width: usize) -> Result<(), BellandeError> {
        for (i, b) in self.corners()?.iter().enumerate() {
            if b.iter().any(|v| !v.is_finite()) {
                return Err(BellandeError::InvalidInputs(format!(
                    "box {} has non-finite coordinates {:?}",
                    i, b
                )));
            }
            if b[0] > b[2] || b[1] > b[3] {
                return Err(BellandeError::InvalidInputs(format!(
                    "box {} is not ordered as x1 <= x2, y1 <= y2: {:?}",
                    i, b
                )));
            }
            if b[0] < 0.0 || b[1] < 0.0 || b[2] > width as f32 || b[3] > height as f32 {
                return Err(BellandeError::InvalidInputs(format!(
                    "box {} {:?} lies outside the {}x{} frame",
                    i, b, width, height
                )));
            }
        }
        Ok(())
    }
}

/// One training/inference sample flowing through the augmentation chain.
#[derive(Clone, Debug)]
pub enum Sample {
    Single {
        frame: Tensor,
        boxes: BoxSet,
    },
    Paired {
        frame_a: Tensor,
        frame_b: Tensor,
        boxes_a: BoxSet,
        boxes_b: BoxSet,
        labels: Tensor,
    },
}

impl Sample {
    pub fn single(frame: Tensor, boxes: Vec<[f32; 4]>) -> Result<Self, BellandeError> {
        let (height, width, _) = frame.frame_dims()?;
        let boxes = BoxSet::new(boxes);
        boxes.validate(height, width)?;
        Ok(Sample::Single { frame, boxes })
    }

    /// `labels` is the `N_A x N_B` correspondence matrix (or a zero-padded
    /// superset of it) linking `boxes_a` to `boxes_b`.
    pub fn paired(
        frame_a: Tensor,
        frame_b: Tensor,
        boxes_a: Vec<[f32; 4]>,
        boxes_b: Vec<[f32; 4]>,
        labels: Tensor,
    ) -> Result<Self, BellandeError> {
        let (height, width, channels) = frame_a.frame_dims()?;
        if frame_b.frame_dims()? != (height, width, channels) {
            return Err(BellandeError::ShapeMismatch(format!(
                "paired frames differ: {:?} vs {:?}",
                frame_a.shape(),
                frame_b.shape()
            )));
        }

        let boxes_a = BoxSet::new(boxes_a);
        let boxes_b = BoxSet::new(boxes_b);
        boxes_a.validate(height, width)?;
        boxes_b.validate(height, width)?;
        correspondence::validate(&labels, boxes_a.len(), boxes_b.len())?;

        Ok(Sample::Paired {
            frame_a,
            frame_b,
            boxes_a,
            boxes_b,
            labels,
        })
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, Sample::Paired { .. })
    }

    pub fn frame_a(&self) -> &Tensor {
        match self {
            Sample::Single { frame, .. } => frame,
            Sample::Paired { frame_a, .. } => frame_a,
        }
    }

    pub fn frame_b(&self) -> Option<&Tensor> {
        match self {
            Sample::Single { .. } => None,
            Sample::Paired { frame_b, .. } => Some(frame_b),
        }
    }

    pub fn boxes_a(&self) -> &BoxSet {
        match self {
            Sample::Single { boxes, .. } => boxes,
            Sample::Paired { boxes_a, .. } => boxes_a,
        }
    }

    pub fn boxes_b(&self) -> Option<&BoxSet> {
        match self {
            Sample::Single { .. } => None,
            Sample::Paired { boxes_b, .. } => Some(boxes_b),
        }
    }

    pub fn labels(&self) -> Option<&Tensor> {
        match self {
            Sample::Single { .. } => None,
            Sample::Paired { labels, .. } => Some(labels),
        }
    }

    /// Applies `f` to every present frame. Any random parameter captured by
    /// `f` is therefore shared by both frames of a pair.
    pub fn map_frames<F>(self, mut f: F) -> Result<Self, BellandeError>
    where
        F: FnMut(Tensor) -> Result<Tensor, BellandeError>,
    {
        Ok(match self {
            Sample::Single { frame, boxes } => Sample::Single {
                frame: f(frame)?,
                boxes,
            },
            Sample::Paired {
                frame_a,
                frame_b,
                boxes_a,
                boxes_b,
                labels,
            } => Sample::Paired {
                frame_a: f(frame_a)?,
                frame_b: f(frame_b)?,
                boxes_a,
                boxes_b,
                labels,
            },
        })
    }

    /// Applies `f` to every frame together with its box set.
    pub fn map_frames_and_boxes<F>(self, mut f: F) -> Result<Self, BellandeError>
    where
        F: FnMut(Tensor, BoxSet) -> Result<(Tensor, BoxSet), BellandeError>,
    {
        Ok(match self {
            Sample::Single { frame, boxes } => {
                let (frame, boxes) = f(frame, boxes)?;
                Sample::Single { frame, boxes }
            }
            Sample::Paired {
                frame_a,
                frame_b,
                boxes_a,
                boxes_b,
                labels,
            } => {
                let (frame_a, boxes_a) = f(frame_a, boxes_a)?;
                let (frame_b, boxes_b) = f(frame_b, boxes_b)?;
                Sample::Paired {
                    frame_a,
                    frame_b,
                    boxes_a,
                    boxes_b,
                    labels,
                }
            }
        })
    }
}

/// A fully augmented sample converted into model-ready tensors.
#[derive(Clone, Debug)]
pub enum TensorSample {
    Single {
        frame: Tensor,
        boxes: Tensor,
        mask: Tensor,
    },
    Paired {
        frame_a: Tensor,
        frame_b: Tensor,
        boxes_a: Tensor,
        boxes_b: Tensor,
        labels: Tensor,
        mask_a: Tensor,
        mask_b: Tensor,
    },
}

impl TensorSample {
    pub fn is_paired(&self) -> bool {
        matches!(self, TensorSample::Paired { .. })
    }
}

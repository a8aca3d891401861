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

use crate::core::{error::BellandeError, random, tensor::Tensor};
use crate::data::augmentation::Transform;
use crate::data::geometry::clamp_box;
use crate::data::sample::{BoxSet, Sample};
use rand::rngs::StdRng;
use rand::Rng;

fn signed<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if random::coin(rng) {
        1.0
    } else {
        -1.0
    }
}

/// Jitters every box by a fraction of its own extent to simulate motion
/// between frames. Each frame draws its own offsets.
pub struct MoveBoxes {
    low: f32,
    high: f32,
}

impl MoveBoxes {
    pub fn new(low: f32, high: f32) -> Result<Self, BellandeError> {
        if !(low >= 0.0) || !(high >= low) {
            return Err(BellandeError::InvalidParameter(format!(
                "box offset range must satisfy 0 <= low <= high, got [{}, {}]",
                low, high
            )));
        }
        Ok(MoveBoxes { low, high })
    }

    fn jitter(
        &self,
        frame: Tensor,
        mut boxes: BoxSet,
        rng: &mut StdRng,
    ) -> Result<(Tensor, BoxSet), BellandeError> {
        let (height, width, _) = frame.frame_dims()?;
        let corners = boxes.corners_mut()?;
        let range = self.high - self.low;

        let fx = random::unit_vector(rng, corners.len());
        let fy = random::unit_vector(rng, corners.len());
        let sign_x = signed(rng);
        let sign_y = signed(rng);

        for (i, b) in corners.iter_mut().enumerate() {
            let dx = (b[2] - b[0]) * (range * fx[i] + self.low) * sign_x;
            let dy = (b[3] - b[1]) * (range * fy[i] + self.low) * sign_y;
            b[0] += dx;
            b[2] += dx;
            b[1] += dy;
            b[3] += dy;
            clamp_box(b, width as f32 - 1.0, height as f32 - 1.0);
        }

        Ok((frame, boxes))
    }
}

impl Default for MoveBoxes {
    fn default() -> Self {
        MoveBoxes {
            low: 0.0,
            high: 0.2,
        }
    }
}

impl Transform for MoveBoxes {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames_and_boxes(|frame, boxes| self.jitter(frame, boxes, rng))
    }

    fn name(&self) -> &str {
        "MoveBoxes"
    }
}

/// Places the frame on a larger canvas filled with the mean pixel, the
/// inverse of cropping. Both frames of a pair share ratio and offset.
pub struct Expand {
    mean: Vec<f32>,
    max_expand: f32,
    probability: f64,
}

impl Expand {
    pub fn new(mean: Vec<f32>, max_expand: f32) -> Result<Self, BellandeError> {
        Expand::with_probability(mean, max_expand, 0.5)
    }

    /// `probability` is the chance that a sample gets expanded at all.
    pub fn with_probability(
        mean: Vec<f32>,
        max_expand: f32,
        probability: f32,
    ) -> Result<Self, BellandeError> {
        if !(max_expand >= 1.0) || !max_expand.is_finite() {
            return Err(BellandeError::InvalidParameter(format!(
                "max_expand must be a finite ratio >= 1, got {}",
                max_expand
            )));
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(BellandeError::InvalidParameter(format!(
                "expand probability must lie in [0, 1], got {}",
                probability
            )));
        }
        if mean.is_empty() {
            return Err(BellandeError::InvalidParameter(
                "expand needs a fill value per channel".into(),
            ));
        }
        Ok(Expand {
            mean,
            max_expand,
            probability: probability as f64,
        })
    }

    fn place(
        &self,
        frame: &Tensor,
        canvas_h: usize,
        canvas_w: usize,
        left: usize,
        top: usize,
    ) -> Result<Tensor, BellandeError> {
        let (height, width, channels) = frame.frame_dims()?;
        if channels != self.mean.len() {
            return Err(BellandeError::ShapeMismatch(format!(
                "frame has {} channels but the fill value has {}",
                channels,
                self.mean.len()
            )));
        }

        let mut canvas = Vec::with_capacity(canvas_h * canvas_w * channels);
        for _ in 0..canvas_h * canvas_w {
            canvas.extend_from_slice(&self.mean);
        }

        let row_len = width * channels;
        for y in 0..height {
            let src = y * row_len;
            let dst = ((top + y) * canvas_w + left) * channels;
            canvas[dst..dst + row_len].copy_from_slice(&frame.data()[src..src + row_len]);
        }

        Ok(Tensor::new(
            canvas,
            vec![canvas_h, canvas_w, channels],
            frame.dtype,
        ))
    }
}

impl Transform for Expand {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !rng.gen_bool(self.probability) {
            return Ok(sample);
        }

        let (height, width, _) = sample.frame_a().frame_dims()?;
        let ratio = random::uniform(rng, 1.0, self.max_expand);
        let left = random::uniform(rng, 0.0, width as f32 * ratio - width as f32);
        let top = random::uniform(rng, 0.0, height as f32 * ratio - height as f32);

        // The canvas must hold the frame at the truncated offset even when
        // float rounding shaves a pixel off the scaled size.
        let (left, top) = (left as usize, top as usize);
        let canvas_w = ((width as f32 * ratio) as usize).max(left + width);
        let canvas_h = ((height as f32 * ratio) as usize).max(top + height);
        log::debug!(
            "expanding {}x{} frame to {}x{} at ({}, {})",
            width,
            height,
            canvas_w,
            canvas_h,
            left,
            top
        );

        sample.map_frames_and_boxes(|frame, mut boxes| {
            let frame = self.place(&frame, canvas_h, canvas_w, left, top)?;
            for b in boxes.corners_mut()?.iter_mut() {
                b[0] += left as f32;
                b[2] += left as f32;
                b[1] += top as f32;
                b[3] += top as f32;
                clamp_box(b, canvas_w as f32 - 1.0, canvas_h as f32 - 1.0);
            }
            Ok((frame, boxes))
        })
    }

    fn name(&self) -> &str {
        "Expand"
    }
}

/// Horizontal flip of both frames with probability one half.
pub struct RandomMirror;

fn mirror_frame(frame: &Tensor) -> Result<Tensor, BellandeError> {
    let (height, width, channels) = frame.frame_dims()?;
    let mut flipped = vec![0.0; frame.numel()];
    for y in 0..height {
        for x in 0..width {
            let src = (y * width + x) * channels;
            let dst = (y * width + (width - 1 - x)) * channels;
            flipped[dst..dst + channels].copy_from_slice(&frame.data()[src..src + channels]);
        }
    }
    Ok(Tensor::new(flipped, frame.shape.clone(), frame.dtype))
}

impl Transform for RandomMirror {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !random::coin(rng) {
            return Ok(sample);
        }

        sample.map_frames_and_boxes(|frame, mut boxes| {
            let (height, width, _) = frame.frame_dims()?;
            let last_x = width as f32 - 1.0;
            for b in boxes.corners_mut()?.iter_mut() {
                let (x1, x2) = (b[0], b[2]);
                b[0] = last_x - x2;
                b[2] = last_x - x1;
                clamp_box(b, last_x, height as f32 - 1.0);
            }
            Ok((mirror_frame(&frame)?, boxes))
        })
    }

    fn name(&self) -> &str {
        "RandomMirror"
    }
}

/// Divides box coordinates by the dimensions of the frame they belong to.
pub struct ToPercentCoords;

impl Transform for ToPercentCoords {
    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames_and_boxes(|frame, mut boxes| {
            let (height, width, _) = frame.frame_dims()?;
            if height == 0 || width == 0 {
                return Err(BellandeError::InvalidShape(
                    "cannot normalize boxes against an empty frame".into(),
                ));
            }
            for b in boxes.corners_mut()?.iter_mut() {
                b[0] /= width as f32;
                b[2] /= width as f32;
                b[1] /= height as f32;
                b[3] /= height as f32;
            }
            Ok((frame, boxes))
        })
    }

    fn name(&self) -> &str {
        "ToPercentCoords"
    }
}

/// Bilinear resize to a square `size x size` frame. Boxes are untouched,
/// so this stage runs after [`ToPercentCoords`].
pub struct Resize {
    size: usize,
}

impl Resize {
    pub fn new(size: usize) -> Result<Self, BellandeError> {
        if size == 0 {
            return Err(BellandeError::InvalidParameter(
                "resize target must be at least one pixel".into(),
            ));
        }
        Ok(Resize { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

pub fn resize_bilinear(
    frame: &Tensor,
    out_h: usize,
    out_w: usize,
) -> Result<Tensor, BellandeError> {
    let (height, width, channels) = frame.frame_dims()?;
    if height == 0 || width == 0 {
        return Err(BellandeError::InvalidShape(
            "cannot resize an empty frame".into(),
        ));
    }

    let scale_y = height as f32 / out_h as f32;
    let scale_x = width as f32 / out_w as f32;
    let src = frame.data();
    let mut out = Vec::with_capacity(out_h * out_w * channels);

    for y in 0..out_h {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (height - 1) as f32);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let wy = sy - y0 as f32;

        for x in 0..out_w {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (width - 1) as f32);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(width - 1);
            let wx = sx - x0 as f32;

            for c in 0..channels {
                let at = |yy: usize, xx: usize| src[(yy * width + xx) * channels + c];
                let top = at(y0, x0) * (1.0 - wx) + at(y0, x1) * wx;
                let bottom = at(y1, x0) * (1.0 - wx) + at(y1, x1) * wx;
                out.push(top * (1.0 - wy) + bottom * wy);
            }
        }
    }

    Ok(Tensor::new(out, vec![out_h, out_w, channels], frame.dtype))
}

impl Transform for Resize {
    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames(|frame| resize_bilinear(&frame, self.size, self.size))
    }

    fn name(&self) -> &str {
        "Resize"
    }
}

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

//! Synchronized random cropping of a frame pair.
//!
//! Frame A is cropped first. Its surviving boxes decide which rows of the
//! correspondence matrix stay, and frame B then decides the columns inside
//! the very same rectangle. A rejection on either frame discards the whole
//! attempt, so the matrix never describes boxes that were cut away.

use crate::core::{error::BellandeError, random, tensor::Tensor};
use crate::data::augmentation::Transform;
use crate::data::correspondence;
use crate::data::geometry::{center, clamp_box, iou, to_xywh};
use crate::data::sample::{BoxSet, Sample};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Trials drawn per sampled mode before another mode is picked.
pub const MAX_TRIALS: usize = 50;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CropMode {
    /// Keep the whole frame.
    Whole,
    /// Crop with an IoU window; unbounded sides are infinite.
    Overlap { min_iou: f32, max_iou: f32 },
}

impl CropMode {
    pub fn min_overlap(min_iou: f32) -> Self {
        CropMode::Overlap {
            min_iou,
            max_iou: f32::INFINITY,
        }
    }

    pub fn unconstrained() -> Self {
        CropMode::Overlap {
            min_iou: f32::NEG_INFINITY,
            max_iou: f32::INFINITY,
        }
    }
}

pub fn default_modes() -> Vec<CropMode> {
    vec![
        CropMode::Whole,
        CropMode::min_overlap(0.7),
        CropMode::min_overlap(0.8),
        CropMode::min_overlap(0.85),
        CropMode::min_overlap(0.9),
        CropMode::unconstrained(),
    ]
}

/// What a crop call ended up doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CropOutcome {
    pub trials: usize,
    pub cropped: bool,
}

/// A candidate crop. `left/top/width/height` feed the overlap test, `rect`
/// is the integer pixel rectangle `[x1, y1, x2, y2]` actually cut.
#[derive(Copy, Clone, Debug)]
struct Window {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    rect: [usize; 4],
}

impl Window {
    fn crop_width(&self) -> usize {
        self.rect[2] - self.rect[0]
    }

    fn crop_height(&self) -> usize {
        self.rect[3] - self.rect[1]
    }

    fn contains(&self, point: [f32; 2]) -> bool {
        let [x1, y1, x2, y2] = self.rect.map(|v| v as f32);
        x1 < point[0] && y1 < point[1] && x2 > point[0] && y2 > point[1]
    }
}

struct FrameCrop {
    frame: Tensor,
    boxes: Vec<[f32; 4]>,
    keep: Vec<bool>,
}

pub struct RandomSampleCrop {
    modes: Vec<CropMode>,
    strict_overlap: bool,
}

impl Default for RandomSampleCrop {
    fn default() -> Self {
        RandomSampleCrop::new()
    }
}

impl RandomSampleCrop {
    pub fn new() -> Self {
        RandomSampleCrop {
            modes: default_modes(),
            strict_overlap: false,
        }
    }

    pub fn with_modes(modes: Vec<CropMode>) -> Result<Self, BellandeError> {
        if modes.is_empty() {
            return Err(BellandeError::InvalidParameter(
                "random crop needs at least one sampling mode".into(),
            ));
        }
        Ok(RandomSampleCrop {
            modes,
            strict_overlap: false,
        })
    }

    /// When set, a trial is rejected unless every overlap lies inside
    /// `[min_iou, max_iou]`. Otherwise the historical test is kept: reject
    /// only when the smallest overlap is below `min_iou` and the largest is
    /// above `max_iou` at the same time.
    pub fn with_strict_overlap(mut self, strict: bool) -> Self {
        self.strict_overlap = strict;
        self
    }

    pub fn modes(&self) -> &[CropMode] {
        &self.modes
    }

    /// Upper bound on the number of crop trials a single call may draw.
    pub fn max_trials(&self) -> usize {
        MAX_TRIALS * self.modes.len()
    }

    fn rejects(&self, overlap: &[f32], min_iou: f32, max_iou: f32) -> bool {
        let lowest = overlap.iter().copied().fold(f32::INFINITY, f32::min);
        let highest = overlap.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if self.strict_overlap {
            lowest < min_iou || highest > max_iou
        } else {
            lowest < min_iou && max_iou < highest
        }
    }

    fn draw_window(&self, rng: &mut StdRng, height: usize, width: usize) -> Option<Window> {
        let (fw, fh) = (width as f32, height as f32);
        let w = random::uniform(rng, 0.8 * fw, fw);
        let h = random::uniform(rng, 0.8 * fh, fh);

        let aspect = h / w;
        if !(0.5..=2.0).contains(&aspect) {
            return None;
        }

        let left = random::uniform(rng, 0.0, fw - w);
        let top = random::uniform(rng, 0.0, fh - h);
        let rect = [
            left as usize,
            top as usize,
            ((left + w) as usize).min(width),
            ((top + h) as usize).min(height),
        ];
        Some(Window {
            left,
            top,
            width: w,
            height: h,
            rect,
        })
    }

    fn crop_frame(
        &self,
        frame: &Tensor,
        boxes: &[[f32; 4]],
        window: &Window,
        min_iou: f32,
        max_iou: f32,
    ) -> Result<Option<FrameCrop>, BellandeError> {
        let xywh: Vec<[f32; 4]> = boxes.iter().map(to_xywh).collect();
        let overlap = iou(
            &xywh,
            [window.left, window.top, window.width, window.height],
        );
        if self.rejects(&overlap, min_iou, max_iou) {
            return Ok(None);
        }

        let keep: Vec<bool> = boxes.iter().map(|b| window.contains(center(b))).collect();
        if !keep.iter().any(|&k| k) {
            return Ok(None);
        }

        let [x1, y1, x2, y2] = window.rect.map(|v| v as f32);
        let max_x = window.crop_width() as f32 - 1.0;
        let max_y = window.crop_height() as f32 - 1.0;
        let cropped_boxes = boxes
            .iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(b, _)| {
                let mut local = [
                    b[0].max(x1) - x1,
                    b[1].max(y1) - y1,
                    b[2].min(x2) - x1,
                    b[3].min(y2) - y1,
                ];
                clamp_box(&mut local, max_x, max_y);
                local
            })
            .collect();

        let frame = frame
            .narrow(0, window.rect[1], window.crop_height())?
            .narrow(1, window.rect[0], window.crop_width())?;

        Ok(Some(FrameCrop {
            frame,
            boxes: cropped_boxes,
            keep,
        }))
    }

    /// Crops `sample` and reports how many trials were spent. Exhausting
    /// every trial returns the input untouched.
    pub fn crop(
        &self,
        sample: Sample,
        rng: &mut StdRng,
    ) -> Result<(Sample, CropOutcome), BellandeError> {
        let (height, width, _) = sample.frame_a().frame_dims()?;
        let mut trials = 0;
        let unchanged = |trials| CropOutcome {
            trials,
            cropped: false,
        };

        if sample.boxes_a().is_empty() {
            log::warn!("no boxes reached the crop stage, keeping the full frame");
            return Ok((sample, unchanged(trials)));
        }

        for _ in 0..self.modes.len() {
            let (min_iou, max_iou) = match self.modes.choose(rng) {
                Some(CropMode::Overlap { min_iou, max_iou }) => (*min_iou, *max_iou),
                Some(CropMode::Whole) | None => return Ok((sample, unchanged(trials))),
            };

            for _ in 0..MAX_TRIALS {
                trials += 1;
                let window = match self.draw_window(rng, height, width) {
                    Some(window) => window,
                    None => continue,
                };

                let crop_a = match self.crop_frame(
                    sample.frame_a(),
                    sample.boxes_a().corners()?,
                    &window,
                    min_iou,
                    max_iou,
                )? {
                    Some(crop) => crop,
                    None => {
                        log::trace!("crop trial {} rejected for frame A", trials);
                        continue;
                    }
                };

                let cropped = match &sample {
                    Sample::Single { .. } => Sample::Single {
                        frame: crop_a.frame,
                        boxes: BoxSet::new(crop_a.boxes),
                    },
                    Sample::Paired {
                        frame_b,
                        boxes_b,
                        labels,
                        ..
                    } => {
                        let crop_b = match self.crop_frame(
                            frame_b,
                            boxes_b.corners()?,
                            &window,
                            min_iou,
                            max_iou,
                        )? {
                            Some(crop) => crop,
                            None => {
                                // The rectangle is shared, so frame B's
                                // rejection sends the attempt back to mode
                                // sampling.
                                log::trace!("crop trial {} rejected for frame B", trials);
                                break;
                            }
                        };

                        let labels = correspondence::select_rows(labels, &crop_a.keep)?;
                        let labels = correspondence::select_cols(&labels, &crop_b.keep)?;
                        Sample::Paired {
                            frame_a: crop_a.frame,
                            frame_b: crop_b.frame,
                            boxes_a: BoxSet::new(crop_a.boxes),
                            boxes_b: BoxSet::new(crop_b.boxes),
                            labels,
                        }
                    }
                };

                log::debug!(
                    "cropped {}x{} frame to {:?} after {} trials",
                    width,
                    height,
                    window.rect,
                    trials
                );
                return Ok((
                    cropped,
                    CropOutcome {
                        trials,
                        cropped: true,
                    },
                ));
            }
        }

        log::debug!(
            "no acceptable crop after {} trials, keeping the full frame",
            trials
        );
        Ok((sample, unchanged(trials)))
    }
}

impl Transform for RandomSampleCrop {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        self.crop(sample, rng).map(|(sample, _)| sample)
    }

    fn name(&self) -> &str {
        "RandomSampleCrop"
    }
}

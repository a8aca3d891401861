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

#![allow(dead_code)]

use bellande_tracking_augmentation::core::{dtype::DataType, error::BellandeError, tensor::Tensor};
use bellande_tracking_augmentation::data::dataloader::PairDataset;
use bellande_tracking_augmentation::data::sample::Sample;

pub fn frame(height: usize, width: usize, offset: usize) -> Result<Tensor, BellandeError> {
    let pixels: Vec<u8> = (0..height * width * 3)
        .map(|v| ((v * 7 + offset) % 256) as u8)
        .collect();
    Tensor::from_u8_frame(&pixels, height, width, 3)
}

pub fn labels(rows: usize, cols: usize, matches: &[(usize, usize)]) -> Tensor {
    let mut data = vec![0.0; rows * cols];
    for &(i, j) in matches {
        data[i * cols + j] = 1.0;
    }
    Tensor::new(data, vec![rows, cols], DataType::Float32)
}

/// 60x80 pair: three boxes in A, two in B, A0 <-> B0 and A2 <-> B1.
pub fn paired_sample() -> Result<Sample, BellandeError> {
    Sample::paired(
        frame(60, 80, 0)?,
        frame(60, 80, 13)?,
        vec![
            [5.0, 5.0, 20.0, 25.0],
            [30.0, 10.0, 50.0, 40.0],
            [55.0, 30.0, 75.0, 55.0],
        ],
        vec![[8.0, 6.0, 22.0, 27.0], [52.0, 28.0, 74.0, 56.0]],
        labels(3, 2, &[(0, 0), (2, 1)]),
    )
}

pub fn single_sample() -> Result<Sample, BellandeError> {
    Sample::single(
        frame(40, 40, 5)?,
        vec![[4.0, 4.0, 12.0, 20.0], [20.0, 18.0, 36.0, 30.0]],
    )
}

pub fn assert_boxes_inside(sample: &Sample) {
    let mut frames = vec![(sample.frame_a(), sample.boxes_a())];
    if let (Some(frame), Some(boxes)) = (sample.frame_b(), sample.boxes_b()) {
        frames.push((frame, boxes));
    }
    for (frame, boxes) in frames {
        let (height, width, _) = frame.frame_dims().unwrap();
        for b in boxes.corners().unwrap() {
            assert!(b[0] <= b[2] && b[1] <= b[3], "unordered box {:?}", b);
            assert!(b[0] >= 0.0 && b[1] >= 0.0, "negative box {:?}", b);
            assert!(
                b[2] < width as f32 && b[3] < height as f32,
                "box {:?} outside {}x{}",
                b,
                width,
                height
            );
        }
    }
}

/// In-memory pairs whose pixels vary with the index.
pub struct ToyDataset {
    pub len: usize,
}

impl PairDataset for ToyDataset {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> Result<Sample, BellandeError> {
        if index >= self.len {
            return Err(BellandeError::IndexOutOfBounds);
        }
        Sample::paired(
            frame(60, 80, index)?,
            frame(60, 80, index + 1)?,
            vec![[5.0, 5.0, 20.0, 25.0], [30.0, 10.0, 50.0, 40.0]],
            vec![[6.0, 5.0, 21.0, 26.0]],
            labels(2, 1, &[(0, 0)]),
        )
    }
}

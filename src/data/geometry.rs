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

/// `[x1, y1, x2, y2]` to `[x, y, w, h]`.
pub fn to_xywh(corners: &[f32; 4]) -> [f32; 4] {
    [
        corners[0],
        corners[1],
        corners[2] - corners[0],
        corners[3] - corners[1],
    ]
}

pub fn center(corners: &[f32; 4]) -> [f32; 2] {
    [
        (corners[0] + corners[2]) / 2.0,
        (corners[1] + corners[3]) / 2.0,
    ]
}

/// Intersection over union of every `[x, y, w, h]` box against one `[x, y, w, h]` rectangle.
pub fn iou(boxes: &[[f32; 4]], rect: [f32; 4]) -> Vec<f32> {
    let [rx, ry, rw, rh] = rect;
    let rect_area = rw * rh;

    boxes
        .iter()
        .map(|&[x, y, w, h]| {
            let iw = ((x + w).min(rx + rw) - x.max(rx)).max(0.0);
            let ih = ((y + h).min(ry + rh) - y.max(ry)).max(0.0);
            let intersection = iw * ih;
            let union = w * h + rect_area - intersection;
            if union > 0.0 {
                intersection / union
            } else {
                0.0
            }
        })
        .collect()
}

/// Clamps every coordinate of a box into `[0, max_x] x [0, max_y]`.
pub fn clamp_box(corners: &mut [f32; 4], max_x: f32, max_y: f32) {
    corners[0] = corners[0].clamp(0.0, max_x);
    corners[2] = corners[2].clamp(0.0, max_x);
    corners[1] = corners[1].clamp(0.0, max_y);
    corners[3] = corners[3].clamp(0.0, max_y);
}

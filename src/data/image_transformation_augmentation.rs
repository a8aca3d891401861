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

//! Photometric transforms. Every random draw is made once per sample and
//! applied to both frames of a pair.

use crate::core::{error::BellandeError, random, tensor::Tensor};
use crate::data::augmentation::{Compose, Transform};
use crate::data::sample::Sample;
use rand::rngs::StdRng;
use rand::Rng;
use std::str::FromStr;

const HUE_PERIOD: f32 = 360.0;

fn require_three_channels(frame: &Tensor) -> Result<(), BellandeError> {
    let (_, _, channels) = frame.frame_dims()?;
    if channels != 3 {
        return Err(BellandeError::InvalidShape(format!(
            "color transforms need 3 channels, frame has {}",
            channels
        )));
    }
    Ok(())
}

fn map_channel<F>(mut frame: Tensor, channel: usize, f: F) -> Result<Tensor, BellandeError>
where
    F: Fn(f32) -> f32,
{
    require_three_channels(&frame)?;
    for pixel in frame.data_mut().chunks_mut(3) {
        pixel[channel] = f(pixel[channel]);
    }
    Ok(frame)
}

fn check_range(kind: &str, lower: f32, upper: f32) -> Result<(), BellandeError> {
    if !(upper >= lower) {
        return Err(BellandeError::InvalidParameter(format!(
            "{} upper must be >= lower ({} < {})",
            kind, upper, lower
        )));
    }
    if lower < 0.0 {
        return Err(BellandeError::InvalidParameter(format!(
            "{} lower must be non-negative, got {}",
            kind, lower
        )));
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Bgr,
    Hsv,
}

impl FromStr for ColorSpace {
    type Err = BellandeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BGR" => Ok(ColorSpace::Bgr),
            "HSV" => Ok(ColorSpace::Hsv),
            other => Err(BellandeError::UnsupportedConversion(format!(
                "unknown color space '{}'",
                other
            ))),
        }
    }
}

/// Float BGR to HSV with H in [0, 360), S in [0, 1] and V in the source units.
pub fn bgr_to_hsv(pixel: [f32; 3]) -> [f32; 3] {
    let [b, g, r] = pixel;
    let v = b.max(g).max(r);
    let diff = v - b.min(g).min(r);
    let s = if v != 0.0 { diff / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += HUE_PERIOD;
    }
    [h, s, v]
}

/// Inverse of [`bgr_to_hsv`]. Hue outside [0, 360) wraps around.
pub fn hsv_to_bgr(pixel: [f32; 3]) -> [f32; 3] {
    let [h, s, v] = pixel;
    if s == 0.0 {
        return [v, v, v];
    }

    let h = (h / 60.0).rem_euclid(6.0);
    let sector = h.floor();
    let fraction = h - sector;
    let sector = if (0.0..6.0).contains(&sector) {
        sector as usize
    } else {
        0
    };

    let tab = [
        v,
        v * (1.0 - s),
        v * (1.0 - s * fraction),
        v * (1.0 - s * (1.0 - fraction)),
    ];
    const SECTORS: [[usize; 3]; 6] = [
        [1, 3, 0],
        [1, 0, 2],
        [3, 0, 1],
        [0, 2, 1],
        [0, 1, 3],
        [2, 1, 0],
    ];
    let [bi, gi, ri] = SECTORS[sector];
    [tab[bi], tab[gi], tab[ri]]
}

pub struct ConvertColor {
    current: ColorSpace,
    target: ColorSpace,
}

impl ConvertColor {
    pub fn new(current: ColorSpace, target: ColorSpace) -> Result<Self, BellandeError> {
        if current == target {
            return Err(BellandeError::UnsupportedConversion(format!(
                "{:?} to {:?}",
                current, target
            )));
        }
        Ok(ConvertColor { current, target })
    }

    pub fn from_names(current: &str, target: &str) -> Result<Self, BellandeError> {
        ConvertColor::new(current.parse()?, target.parse()?)
    }

    fn convert(&self, mut frame: Tensor) -> Result<Tensor, BellandeError> {
        require_three_channels(&frame)?;
        let convert: fn([f32; 3]) -> [f32; 3] = match (self.current, self.target) {
            (ColorSpace::Bgr, ColorSpace::Hsv) => bgr_to_hsv,
            (ColorSpace::Hsv, ColorSpace::Bgr) => hsv_to_bgr,
            (current, target) => {
                return Err(BellandeError::UnsupportedConversion(format!(
                    "{:?} to {:?}",
                    current, target
                )))
            }
        };
        for pixel in frame.data_mut().chunks_mut(3) {
            let converted = convert([pixel[0], pixel[1], pixel[2]]);
            pixel.copy_from_slice(&converted);
        }
        Ok(frame)
    }
}

impl Transform for ConvertColor {
    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample, BellandeError> {
        sample.map_frames(|frame| self.convert(frame))
    }

    fn name(&self) -> &str {
        "ConvertColor"
    }
}

/// Multiplies every pixel by a factor from U[lower, upper) with probability 1/2.
pub struct RandomContrast {
    lower: f32,
    upper: f32,
}

impl RandomContrast {
    pub fn new(lower: f32, upper: f32) -> Result<Self, BellandeError> {
        check_range("contrast", lower, upper)?;
        Ok(RandomContrast { lower, upper })
    }
}

impl Transform for RandomContrast {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !random::coin(rng) {
            return Ok(sample);
        }
        let alpha = random::uniform(rng, self.lower, self.upper);
        sample.map_frames(|frame| Ok(frame.scale(alpha)))
    }

    fn name(&self) -> &str {
        "RandomContrast"
    }
}

/// Scales the S channel of an HSV frame with probability 1/2.
pub struct RandomSaturation {
    lower: f32,
    upper: f32,
}

impl RandomSaturation {
    pub fn new(lower: f32, upper: f32) -> Result<Self, BellandeError> {
        check_range("saturation", lower, upper)?;
        Ok(RandomSaturation { lower, upper })
    }
}

impl Transform for RandomSaturation {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !random::coin(rng) {
            return Ok(sample);
        }
        let alpha = random::uniform(rng, self.lower, self.upper);
        sample.map_frames(|frame| map_channel(frame, 1, |s| s * alpha))
    }

    fn name(&self) -> &str {
        "RandomSaturation"
    }
}

/// Brings a shifted hue back into [0, 360].
pub fn wrap_hue(hue: f32) -> f32 {
    if hue > HUE_PERIOD {
        hue - HUE_PERIOD
    } else if hue < 0.0 {
        hue + HUE_PERIOD
    } else {
        hue
    }
}

/// Shifts the H channel of an HSV frame by U[-delta, delta), wrapping at 360.
pub struct RandomHue {
    delta: f32,
}

impl RandomHue {
    pub fn new(delta: f32) -> Result<Self, BellandeError> {
        if !(0.0..=HUE_PERIOD).contains(&delta) {
            return Err(BellandeError::InvalidParameter(format!(
                "hue delta must lie in [0, 360], got {}",
                delta
            )));
        }
        Ok(RandomHue { delta })
    }
}

impl Default for RandomHue {
    fn default() -> Self {
        RandomHue { delta: 18.0 }
    }
}

impl Transform for RandomHue {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !random::coin(rng) {
            return Ok(sample);
        }
        let delta = random::uniform(rng, -self.delta, self.delta);
        sample.map_frames(|frame| {
            map_channel(frame, 0, |h| wrap_hue(h + delta))
        })
    }

    fn name(&self) -> &str {
        "RandomHue"
    }
}

/// Adds U[-delta, delta) to every pixel with probability 1/2.
pub struct RandomBrightness {
    delta: f32,
}

impl RandomBrightness {
    pub fn new(delta: f32) -> Result<Self, BellandeError> {
        if !(0.0..=255.0).contains(&delta) {
            return Err(BellandeError::InvalidParameter(format!(
                "brightness delta must lie in [0, 255], got {}",
                delta
            )));
        }
        Ok(RandomBrightness { delta })
    }
}

impl Default for RandomBrightness {
    fn default() -> Self {
        RandomBrightness { delta: 32.0 }
    }
}

impl Transform for RandomBrightness {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !random::coin(rng) {
            return Ok(sample);
        }
        let delta = random::uniform(rng, -self.delta, self.delta);
        sample.map_frames(|frame| Ok(frame.add_scalar(delta)))
    }

    fn name(&self) -> &str {
        "RandomBrightness"
    }
}

/// Reorders channels to the given permutation.
pub fn swap_channels(mut frame: Tensor, order: [usize; 3]) -> Result<Tensor, BellandeError> {
    require_three_channels(&frame)?;
    for pixel in frame.data_mut().chunks_mut(3) {
        let source = [pixel[0], pixel[1], pixel[2]];
        for (dst, &src) in pixel.iter_mut().zip(order.iter()) {
            *dst = source[src];
        }
    }
    Ok(frame)
}

/// Random channel shuffle with probability 1/2.
pub struct RandomLightingNoise;

impl RandomLightingNoise {
    const PERMUTATIONS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
}

impl Transform for RandomLightingNoise {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        if !random::coin(rng) {
            return Ok(sample);
        }
        let order = Self::PERMUTATIONS[rng.gen_range(0..Self::PERMUTATIONS.len())];
        sample.map_frames(|frame| swap_channels(frame, order))
    }

    fn name(&self) -> &str {
        "RandomLightingNoise"
    }
}

/// Brightness, then contrast either before or after the HSV
/// saturation/hue block (coin flip), then a channel shuffle.
pub struct PhotometricDistort {
    contrast_first: Compose,
    contrast_last: Compose,
    brightness: RandomBrightness,
    lighting_noise: RandomLightingNoise,
}

impl PhotometricDistort {
    pub fn new(
        lower_contrast: f32,
        upper_contrast: f32,
        lower_saturation: f32,
        upper_saturation: f32,
    ) -> Result<Self, BellandeError> {
        PhotometricDistort::with_deltas(
            lower_contrast,
            upper_contrast,
            lower_saturation,
            upper_saturation,
            RandomBrightness::default().delta,
            RandomHue::default().delta,
        )
    }

    pub fn with_deltas(
        lower_contrast: f32,
        upper_contrast: f32,
        lower_saturation: f32,
        upper_saturation: f32,
        brightness_delta: f32,
        hue_delta: f32,
    ) -> Result<Self, BellandeError> {
        let hsv_block = || -> Result<Vec<Box<dyn Transform>>, BellandeError> {
            let block: Vec<Box<dyn Transform>> = vec![
                Box::new(ConvertColor::new(ColorSpace::Bgr, ColorSpace::Hsv)?),
                Box::new(RandomSaturation::new(lower_saturation, upper_saturation)?),
                Box::new(RandomHue::new(hue_delta)?),
                Box::new(ConvertColor::new(ColorSpace::Hsv, ColorSpace::Bgr)?),
            ];
            Ok(block)
        };

        let mut contrast_first: Vec<Box<dyn Transform>> =
            vec![Box::new(RandomContrast::new(lower_contrast, upper_contrast)?)];
        contrast_first.extend(hsv_block()?);

        let mut contrast_last = hsv_block()?;
        contrast_last.push(Box::new(RandomContrast::new(lower_contrast, upper_contrast)?));

        Ok(PhotometricDistort {
            contrast_first: Compose::new(contrast_first),
            contrast_last: Compose::new(contrast_last),
            brightness: RandomBrightness::new(brightness_delta)?,
            lighting_noise: RandomLightingNoise,
        })
    }
}

impl Transform for PhotometricDistort {
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample, BellandeError> {
        let sample = self.brightness.apply(sample, rng)?;
        let sample = if random::coin(rng) {
            self.contrast_first.apply(sample, rng)?
        } else {
            self.contrast_last.apply(sample, rng)?
        };
        self.lighting_noise.apply(sample, rng)
    }

    fn name(&self) -> &str {
        "PhotometricDistort"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::core::dtype::DataType;
    use crate::data::sample::BoxSet;
    use rand::SeedableRng;

    #[test]
    fn hue_wraps_instead_of_clipping() {
        assert_abs_diff_eq!(wrap_hue(355.0 + 18.0), 13.0, epsilon = 1e-4);
        assert_abs_diff_eq!(wrap_hue(5.0 - 18.0), 347.0, epsilon = 1e-4);
        assert_eq!(wrap_hue(180.0), 180.0);
    }

    #[test]
    fn random_hue_keeps_hue_in_range() {
        let frame = Tensor::new(
            vec![355.0, 0.5, 100.0, 5.0, 0.5, 100.0],
            vec![1, 2, 3],
            DataType::Float32,
        );
        let hue = RandomHue::default();
        let mut wrapped = false;
        for seed in 0..20 {
            let sample = Sample::Single {
                frame: frame.clone(),
                boxes: BoxSet::new(Vec::new()),
            };
            let mut rng = StdRng::seed_from_u64(seed);
            let out = hue.apply(sample, &mut rng).unwrap();
            let data = out.frame_a().data();
            for h in [data[0], data[3]] {
                assert!((0.0..=HUE_PERIOD).contains(&h), "hue {} escaped", h);
            }
            // a hue that crossed the 0/360 seam lands on the far side of 180
            if data[0] < 180.0 || data[3] > 180.0 {
                wrapped = true;
            }
            assert_eq!(&data[1..3], &[0.5, 100.0]);
        }
        assert!(wrapped);
    }

    #[test]
    fn hsv_round_trip() {
        for pixel in [[10.0, 200.0, 30.0], [255.0, 0.0, 128.0], [40.0, 40.0, 40.0], [0.0, 0.0, 0.0]] {
            let back = hsv_to_bgr(bgr_to_hsv(pixel));
            for c in 0..3 {
                assert_abs_diff_eq!(back[c], pixel[c], epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn pure_red_is_hue_zero() {
        let hsv = bgr_to_hsv([0.0, 0.0, 255.0]);
        assert_abs_diff_eq!(hsv[0], 0.0);
        assert_abs_diff_eq!(hsv[1], 1.0);
        assert_abs_diff_eq!(hsv[2], 255.0);
    }

    #[test]
    fn same_space_conversion_is_rejected() {
        assert!(ConvertColor::new(ColorSpace::Hsv, ColorSpace::Hsv).is_err());
        assert!(ConvertColor::from_names("BGR", "LAB").is_err());
        assert!(ConvertColor::from_names("bgr", "hsv").is_ok());
    }

    #[test]
    fn invalid_ranges_fail_at_construction() {
        assert!(RandomContrast::new(1.5, 0.5).is_err());
        assert!(RandomSaturation::new(-0.1, 0.5).is_err());
        assert!(RandomHue::new(400.0).is_err());
        assert!(RandomBrightness::new(-1.0).is_err());
    }

    #[test]
    fn swap_channels_reorders() {
        let frame = Tensor::new(
            vec![1.0, 2.0, 3.0],
            vec![1, 1, 3],
            crate::core::dtype::DataType::Float32,
        );
        let swapped = swap_channels(frame, [2, 0, 1]).unwrap();
        assert_eq!(swapped.data(), &[3.0, 1.0, 2.0]);
    }
}

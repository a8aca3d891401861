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

mod common;

use std::error::Error;

use approx::assert_abs_diff_eq;
use bellande_tracking_augmentation::core::{error::BellandeError, tensor::Tensor};
use bellande_tracking_augmentation::data::{
    augmentation::{Compose, Transform},
    correspondence,
    crop::{CropMode, RandomSampleCrop},
    formatting::{pad_boxes, ResizeShuffleBoxes},
    geometric_augmentation::{Expand, RandomMirror, ToPercentCoords},
    image_transformation_augmentation::PhotometricDistort,
    preprocessing::ConvertFromInts,
    sample::Sample,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn at(labels: &Tensor, i: usize, j: usize) -> f32 {
    labels.data()[i * labels.shape()[1] + j]
}

#[test]
fn test_geometric_chain_keeps_boxes_inside_frames() -> Result<(), Box<dyn Error>> {
    let transforms: Vec<Box<dyn Transform>> = vec![
        Box::new(ConvertFromInts),
        Box::new(Expand::with_probability(vec![104.0, 117.0, 123.0], 2.0, 1.0)?),
        Box::new(RandomSampleCrop::new()),
        Box::new(RandomMirror),
    ];
    let chain = Compose::new(transforms);
    let sample = common::paired_sample()?;

    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let out = chain.apply(sample.clone(), &mut rng)?;
        common::assert_boxes_inside(&out);

        let (boxes_a, boxes_b) = (out.boxes_a().len(), out.boxes_b().map_or(0, |b| b.len()));
        let labels = out.labels().ok_or("pair lost its labels")?;
        correspondence::validate(labels, boxes_a, boxes_b)?;
        assert_eq!(labels.shape(), &[3, 2]);
        assert_eq!(
            out.frame_a().shape(),
            out.frame_b().ok_or("pair lost frame B")?.shape()
        );
    }
    Ok(())
}

#[test]
fn test_percent_coords_round_trip() -> Result<(), Box<dyn Error>> {
    let sample = Sample::single(
        common::frame(37, 53, 0)?,
        vec![[3.0, 4.5, 17.25, 30.0], [0.0, 0.0, 52.0, 36.0]],
    )?;
    let original = sample.boxes_a().corners()?.to_vec();

    let mut rng = StdRng::seed_from_u64(0);
    let out = ToPercentCoords.apply(sample, &mut rng)?;
    for (scaled, b) in out.boxes_a().corners()?.iter().zip(&original) {
        assert_abs_diff_eq!(scaled[0] * 53.0, b[0], epsilon = 1e-3);
        assert_abs_diff_eq!(scaled[1] * 37.0, b[1], epsilon = 1e-3);
        assert_abs_diff_eq!(scaled[2] * 53.0, b[2], epsilon = 1e-3);
        assert_abs_diff_eq!(scaled[3] * 37.0, b[3], epsilon = 1e-3);
    }
    Ok(())
}

#[test]
fn test_crop_trials_are_bounded() -> Result<(), Box<dyn Error>> {
    let crop = RandomSampleCrop::new();
    for seed in 0..30 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (_, outcome) = crop.crop(common::paired_sample()?, &mut rng)?;
        assert!(outcome.trials <= crop.max_trials());
    }
    Ok(())
}

#[test]
fn test_impossible_crop_returns_input() -> Result<(), Box<dyn Error>> {
    let crop = RandomSampleCrop::with_modes(vec![CropMode::min_overlap(1.5); 6])?
        .with_strict_overlap(true);
    let sample = common::paired_sample()?;
    let mut rng = StdRng::seed_from_u64(17);
    let (out, outcome) = crop.crop(sample.clone(), &mut rng)?;

    assert!(!outcome.cropped);
    assert_eq!(outcome.trials, 300);
    assert_eq!(out.frame_a(), sample.frame_a());
    assert_eq!(out.boxes_b(), sample.boxes_b());
    assert_eq!(out.labels(), sample.labels());
    Ok(())
}

#[test]
fn test_crop_keeps_matches_on_the_same_object() -> Result<(), Box<dyn Error>> {
    let boxes = vec![
        [4.0, 4.0, 18.0, 20.0],
        [25.0, 8.0, 45.0, 30.0],
        [50.0, 25.0, 70.0, 50.0],
        [10.0, 35.0, 30.0, 55.0],
    ];
    let identity = common::labels(4, 4, &[(0, 0), (1, 1), (2, 2), (3, 3)]);
    let sample = Sample::paired(
        common::frame(60, 80, 0)?,
        common::frame(60, 80, 9)?,
        boxes.clone(),
        boxes,
        identity,
    )?;
    let crop = RandomSampleCrop::new();

    let mut cropped = 0;
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (out, outcome) = crop.crop(sample.clone(), &mut rng)?;
        if outcome.cropped {
            cropped += 1;
        }

        let boxes_a = out.boxes_a().corners()?;
        let boxes_b = out.boxes_b().ok_or("pair lost boxes B")?.corners()?;
        let labels = out.labels().ok_or("pair lost its labels")?;
        correspondence::validate(labels, boxes_a.len(), boxes_b.len())?;

        let mut matches = 0;
        for i in 0..labels.shape()[0] {
            for j in 0..labels.shape()[1] {
                if at(labels, i, j) == 1.0 {
                    assert_eq!(boxes_a[i], boxes_b[j], "seed {} linked ({}, {})", seed, i, j);
                    matches += 1;
                }
            }
        }
        assert_eq!(matches, boxes_a.len().min(boxes_b.len()), "seed {}", seed);
    }
    assert!(cropped > 0);
    Ok(())
}

#[test]
fn test_pair_rejects_matches_between_padding_slots() -> Result<(), Box<dyn Error>> {
    let result = Sample::paired(
        common::frame(10, 10, 0)?,
        common::frame(10, 10, 1)?,
        vec![[2.0, 2.0, 6.0, 6.0]],
        vec![[3.0, 2.0, 7.0, 6.0]],
        common::labels(2, 2, &[(1, 1)]),
    );
    assert!(matches!(result, Err(BellandeError::InvalidInputs(_))));

    let padded = Sample::paired(
        common::frame(10, 10, 0)?,
        common::frame(10, 10, 1)?,
        vec![[2.0, 2.0, 6.0, 6.0]],
        vec![[3.0, 2.0, 7.0, 6.0]],
        common::labels(2, 2, &[(0, 0)]),
    )?;
    let mut rng = StdRng::seed_from_u64(4);
    let out = ResizeShuffleBoxes::new(2)?.apply(padded, &mut rng)?;
    let labels = out.labels().ok_or("missing labels")?;
    assert_eq!(at(labels, 2, 2), 1.0);
    assert_eq!((0..2).map(|k| at(labels, k, 2) + at(labels, 2, k)).sum::<f32>(), 0.0);
    Ok(())
}

#[test]
fn test_shuffle_preserves_matches_and_no_match_bucket() -> Result<(), Box<dyn Error>> {
    let stage = ResizeShuffleBoxes::new(5)?;
    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let out = stage.apply(common::paired_sample()?, &mut rng)?;
        let labels = out.labels().ok_or("missing labels")?;
        assert_eq!(labels.shape(), &[6, 6]);

        let inner = labels.narrow(0, 0, 5)?.narrow(1, 0, 5)?;
        assert_eq!(correspondence::match_count(&inner), 2);

        let mask_a = out.boxes_a().mask().ok_or("missing mask A")?;
        let mask_b = out.boxes_b().and_then(|b| b.mask()).ok_or("missing mask B")?;
        assert_eq!(mask_a.len(), 6);
        assert_eq!(mask_a.iter().filter(|&&m| m).count(), 4);
        assert_eq!(mask_b.iter().filter(|&&m| m).count(), 3);

        for i in 0..5 {
            let row_sum: f32 = (0..5).map(|j| at(labels, i, j)).sum();
            let expected = if mask_a[i] && row_sum == 0.0 { 1.0 } else { 0.0 };
            assert_eq!(at(labels, i, 5), expected);

            let col_sum: f32 = (0..5).map(|k| at(labels, k, i)).sum();
            let expected = if mask_b[i] && col_sum == 0.0 { 1.0 } else { 0.0 };
            assert_eq!(at(labels, 5, i), expected);
        }
        assert_eq!(at(labels, 5, 5), 1.0);

        // A1 is the only unmatched real box on either side.
        assert_eq!((0..5).map(|i| at(labels, i, 5)).sum::<f32>(), 1.0);
        assert_eq!((0..5).map(|j| at(labels, 5, j)).sum::<f32>(), 0.0);
    }
    Ok(())
}

#[test]
fn test_padding_before_shuffle() -> Result<(), Box<dyn Error>> {
    let boxes = [[10.0, 10.0, 30.0, 30.0], [50.0, 50.0, 80.0, 80.0]];
    let sample = Sample::single(common::frame(100, 100, 0)?, boxes.to_vec())?;

    let (padded, mask) = pad_boxes(sample.boxes_a().corners()?, 4)?;
    assert_eq!(padded.len(), 4);
    assert_eq!(&padded[..2], &boxes);
    assert!(padded[2..].iter().flatten().all(|v| *v == f32::INFINITY));
    assert_eq!(mask, vec![true, true, false, false]);
    Ok(())
}

#[test]
fn test_single_match_scenario() -> Result<(), Box<dyn Error>> {
    let stage = ResizeShuffleBoxes::new(2)?;
    for seed in 0..20 {
        let sample = Sample::paired(
            common::frame(10, 10, 0)?,
            common::frame(10, 10, 1)?,
            vec![[2.0, 2.0, 6.0, 6.0]],
            vec![[3.0, 2.0, 7.0, 6.0]],
            common::labels(1, 1, &[(0, 0)]),
        )?;
        let mut rng = StdRng::seed_from_u64(seed);
        let out = stage.apply(sample, &mut rng)?;
        let labels = out.labels().ok_or("missing labels")?;

        assert_eq!(labels.shape(), &[3, 3]);
        let inner = labels.narrow(0, 0, 2)?.narrow(1, 0, 2)?;
        assert_eq!(correspondence::match_count(&inner), 1);
        for k in 0..2 {
            assert_eq!(at(labels, k, 2), 0.0);
            assert_eq!(at(labels, 2, k), 0.0);
        }
        assert_eq!(at(labels, 2, 2), 1.0);
    }
    Ok(())
}

#[test]
fn test_capacity_overflow_is_an_error() -> Result<(), Box<dyn Error>> {
    let stage = ResizeShuffleBoxes::new(2)?;
    let mut rng = StdRng::seed_from_u64(0);
    match stage.apply(common::paired_sample()?, &mut rng) {
        Err(BellandeError::CapacityExceeded { boxes, capacity }) => {
            assert_eq!((boxes, capacity), (3, 2));
        }
        other => panic!("expected a capacity error, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[test]
fn test_photometric_jitter_is_shared_by_both_frames() -> Result<(), Box<dyn Error>> {
    let distort = PhotometricDistort::new(0.5, 1.5, 0.5, 1.5)?;
    let frame = common::frame(12, 16, 3)?;
    let sample = Sample::paired(
        frame.clone(),
        frame,
        vec![[1.0, 1.0, 5.0, 5.0]],
        vec![[1.0, 1.0, 5.0, 5.0]],
        common::labels(1, 1, &[(0, 0)]),
    )?;

    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let converted = ConvertFromInts.apply(sample.clone(), &mut rng)?;
        let out = distort.apply(converted, &mut rng)?;
        assert_eq!(Some(out.frame_a()), out.frame_b());
    }
    Ok(())
}

#[test]
fn test_invalid_ranges_fail_at_construction() {
    assert!(PhotometricDistort::new(1.5, 0.5, 0.5, 1.5).is_err());
    assert!(PhotometricDistort::new(0.5, 1.5, -0.5, 1.5).is_err());
    assert!(ResizeShuffleBoxes::new(0).is_err());
    assert!(RandomSampleCrop::with_modes(Vec::new()).is_err());
}

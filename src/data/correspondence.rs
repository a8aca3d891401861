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

//! Operations on the identity-correspondence matrix. Row `i` belongs to box
//! `i` of frame A, column `j` to box `j` of frame B.

use crate::core::{dtype::DataType, error::BellandeError, tensor::Tensor};

/// Checks shape, binary entries, zero padding and the one-match-per-row/column rule.
pub fn validate(labels: &Tensor, boxes_a: usize, boxes_b: usize) -> Result<(), BellandeError> {
    let (rows, cols) = labels.matrix_dims()?;
    if rows < boxes_a || cols < boxes_b {
        return Err(BellandeError::ShapeMismatch(format!(
            "correspondence matrix {}x{} cannot cover {}x{} boxes",
            rows, cols, boxes_a, boxes_b
        )));
    }

    if labels.data().iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(BellandeError::InvalidInputs(
            "correspondence matrix must be binary".into(),
        ));
    }

    let padded_match = labels
        .data()
        .chunks(cols.max(1))
        .take(rows)
        .enumerate()
        .find_map(|(i, row)| {
            row.iter()
                .enumerate()
                .find(|&(j, &v)| v != 0.0 && (i >= boxes_a || j >= boxes_b))
                .map(|(j, _)| (i, j))
        });
    if let Some((i, j)) = padded_match {
        return Err(BellandeError::InvalidInputs(format!(
            "correspondence entry ({}, {}) marks a padding slot as matched",
            i, j
        )));
    }

    let row_sums = labels.sum_dim(1, false)?;
    let col_sums = labels.sum_dim(0, false)?;
    if let Some(i) = row_sums.data().iter().position(|&s| s > 1.0) {
        return Err(BellandeError::InvalidInputs(format!(
            "row {} of the correspondence matrix has more than one match",
            i
        )));
    }
    if let Some(j) = col_sums.data().iter().position(|&s| s > 1.0) {
        return Err(BellandeError::InvalidInputs(format!(
            "column {} of the correspondence matrix has more than one match",
            j
        )));
    }
    Ok(())
}

/// Keeps the rows flagged in `keep` (rows past `keep.len()` are dropped) and
/// refills the matrix with zero rows up to its original height.
pub fn select_rows(labels: &Tensor, keep: &[bool]) -> Result<Tensor, BellandeError> {
    let (rows, cols) = labels.matrix_dims()?;
    let mut data = Vec::with_capacity(rows * cols);
    for (i, row) in labels.data().chunks(cols.max(1)).take(rows).enumerate() {
        if keep.get(i).copied().unwrap_or(false) {
            data.extend_from_slice(&row[..cols]);
        }
    }
    data.resize(rows * cols, 0.0);
    Ok(Tensor::new(data, vec![rows, cols], labels.dtype))
}

/// Column counterpart of [`select_rows`].
pub fn select_cols(labels: &Tensor, keep: &[bool]) -> Result<Tensor, BellandeError> {
    let (rows, cols) = labels.matrix_dims()?;
    let kept: Vec<usize> = (0..cols)
        .filter(|&j| keep.get(j).copied().unwrap_or(false))
        .collect();

    let mut data = vec![0.0; rows * cols];
    for i in 0..rows {
        for (dst, &src) in kept.iter().enumerate() {
            data[i * cols + dst] = labels.data()[i * cols + src];
        }
    }
    Ok(Tensor::new(data, vec![rows, cols], labels.dtype))
}

/// Zero-pads the matrix to `rows x cols`.
pub fn pad_to(labels: &Tensor, rows: usize, cols: usize) -> Result<Tensor, BellandeError> {
    let (old_rows, old_cols) = labels.matrix_dims()?;
    if old_rows > rows || old_cols > cols {
        return Err(BellandeError::CapacityExceeded {
            boxes: old_rows.max(old_cols),
            capacity: rows.min(cols),
        });
    }

    let mut data = vec![0.0; rows * cols];
    for i in 0..old_rows {
        data[i * cols..i * cols + old_cols]
            .copy_from_slice(&labels.data()[i * old_cols..(i + 1) * old_cols]);
    }
    Ok(Tensor::new(data, vec![rows, cols], labels.dtype))
}

/// Row `k` of the result is row `row_order[k]` of the input; columns likewise.
pub fn reorder(
    labels: &Tensor,
    row_order: &[usize],
    col_order: &[usize],
) -> Result<Tensor, BellandeError> {
    let (rows, cols) = labels.matrix_dims()?;
    if row_order.len() != rows || col_order.len() != cols {
        return Err(BellandeError::DimensionMismatch);
    }
    if row_order.iter().any(|&r| r >= rows) || col_order.iter().any(|&c| c >= cols) {
        return Err(BellandeError::IndexOutOfBounds);
    }

    let mut data = Vec::with_capacity(rows * cols);
    for &r in row_order {
        for &c in col_order {
            data.push(labels.data()[r * cols + c]);
        }
    }
    Ok(Tensor::new(data, vec![rows, cols], labels.dtype))
}

/// Grows an `M x M` matrix to `(M+1) x (M+1)` with the no-match bucket.
///
/// Entry `(i, M)` is 1 iff row `i` is a valid box with no match, entry
/// `(M, j)` likewise for column `j`. Entry `(M, M)` is reserved and always 1;
/// see [`no_match_loss_mask`].
pub fn append_no_match(
    labels: &Tensor,
    mask_a: &[bool],
    mask_b: &[bool],
) -> Result<Tensor, BellandeError> {
    let (rows, cols) = labels.matrix_dims()?;
    if mask_a.len() != rows || mask_b.len() != cols {
        return Err(BellandeError::DimensionMismatch);
    }

    let row_sums = labels.sum_dim(1, false)?;
    let col_sums = labels.sum_dim(0, false)?;
    let unmatched = |valid: bool, sum: f32| if valid && sum == 0.0 { 1.0 } else { 0.0 };

    let width = cols + 1;
    let mut data = Vec::with_capacity((rows + 1) * width);
    for i in 0..rows {
        data.extend_from_slice(&labels.data()[i * cols..(i + 1) * cols]);
        data.push(unmatched(mask_a[i], row_sums.data()[i]));
    }
    for j in 0..cols {
        data.push(unmatched(mask_b[j], col_sums.data()[j]));
    }
    data.push(1.0);

    Ok(Tensor::new(data, vec![rows + 1, width], DataType::Float32))
}

/// Ones everywhere except the reserved `(M, M)` entry of the augmented label
/// matrix. Loss computations multiply by this so the reserved cell never
/// contributes.
pub fn no_match_loss_mask(capacity: usize) -> Tensor {
    let side = capacity + 1;
    let mut mask = Tensor::ones(&[side, side]);
    mask.data_mut()[side * side - 1] = 0.0;
    mask
}

/// Number of matched pairs in the matrix.
pub fn match_count(labels: &Tensor) -> usize {
    labels.data().iter().filter(|&&v| v == 1.0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: usize, cols: usize, values: &[f32]) -> Tensor {
        Tensor::new(values.to_vec(), vec![rows, cols], DataType::Float32)
    }

    #[test]
    fn select_rows_drops_and_repads() {
        let labels = matrix(3, 2, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let kept = select_rows(&labels, &[false, true, true]).unwrap();
        assert_eq!(kept.shape(), &[3, 2]);
        assert_eq!(kept.data(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn select_cols_drops_and_repads() {
        let labels = matrix(2, 3, &[0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let kept = select_cols(&labels, &[true, false, true]).unwrap();
        assert_eq!(kept.data(), &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn reorder_moves_matches() {
        let labels = matrix(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let shuffled = reorder(&labels, &[1, 0], &[1, 0]).unwrap();
        assert_eq!(shuffled.data(), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn no_match_bucket_marks_valid_unmatched_only() {
        // row 0 matched to col 1, row 1 valid but unmatched, row 2 padding
        let labels = matrix(3, 3, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let augmented =
            append_no_match(&labels, &[true, true, false], &[true, true, false]).unwrap();
        assert_eq!(augmented.shape(), &[4, 4]);
        let at = |i: usize, j: usize| augmented.data()[i * 4 + j];
        assert_eq!(at(0, 3), 0.0);
        assert_eq!(at(1, 3), 1.0);
        assert_eq!(at(2, 3), 0.0);
        assert_eq!(at(3, 0), 1.0);
        assert_eq!(at(3, 1), 0.0);
        assert_eq!(at(3, 2), 0.0);
        assert_eq!(at(3, 3), 1.0);
    }

    #[test]
    fn validate_rejects_double_match() {
        let labels = matrix(2, 2, &[1.0, 1.0, 0.0, 0.0]);
        assert!(validate(&labels, 2, 2).is_err());
        let labels = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        assert!(validate(&labels, 2, 2).is_ok());
    }

    #[test]
    fn validate_rejects_matches_in_padding() {
        let labels = matrix(2, 2, &[0.0, 0.0, 0.0, 1.0]);
        match validate(&labels, 1, 1) {
            Err(BellandeError::InvalidInputs(msg)) => assert!(msg.contains("(1, 1)")),
            other => panic!("expected invalid inputs, got {:?}", other),
        }
        let labels = matrix(2, 3, &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(validate(&labels, 2, 2).is_err());
        let labels = matrix(3, 3, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(validate(&labels, 1, 1).is_ok());
    }

    #[test]
    fn loss_mask_zeroes_reserved_entry() {
        let mask = no_match_loss_mask(2);
        assert_eq!(mask.shape(), &[3, 3]);
        assert_eq!(mask.data().iter().filter(|&&v| v == 0.0).count(), 1);
        assert_eq!(mask.data()[8], 0.0);
    }
}

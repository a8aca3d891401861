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

use crate::core::{dtype::DataType, error::BellandeError};

/// Dense row-major tensor. Frames are stored as `[height, width, channels]`,
/// correspondence matrices as `[rows, cols]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
    pub dtype: DataType,
}

impl Tensor {
    /// Builds a tensor from parts the caller knows to agree; panics when
    /// `data.len()` differs from the shape's element count. Use [`Tensor::from_vec`]
    /// for data that has not been checked.
    pub fn new(data: Vec<f32>, shape: Vec<usize>, dtype: DataType) -> Self {
        let size: usize = shape.iter().product();
        assert_eq!(data.len(), size, "Data size does not match shape");

        Tensor { data, shape, dtype }
    }

    /// Checked constructor for data coming from outside the crate.
    pub fn from_vec(
        data: Vec<f32>,
        shape: Vec<usize>,
        dtype: DataType,
    ) -> Result<Self, BellandeError> {
        let size: usize = shape.iter().product();
        if data.len() != size {
            return Err(BellandeError::InvalidShape(format!(
                "{} values cannot fill shape {:?}",
                data.len(),
                shape
            )));
        }
        Ok(Tensor { data, shape, dtype })
    }

    /// Builds a `[height, width, channels]` frame from raw 8-bit pixels.
    pub fn from_u8_frame(
        pixels: &[u8],
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Self, BellandeError> {
        Tensor::from_vec(
            pixels.iter().map(|&p| p as f32).collect(),
            vec![height, width, channels],
            DataType::UInt8,
        )
    }

    pub fn from_mask(mask: &[bool]) -> Self {
        Tensor::new(
            mask.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect(),
            vec![mask.len()],
            DataType::Bool,
        )
    }

    // Data access methods
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn get_dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// `(height, width, channels)` of a frame tensor.
    pub fn frame_dims(&self) -> Result<(usize, usize, usize), BellandeError> {
        match self.shape[..] {
            [height, width, channels] => Ok((height, width, channels)),
            _ => Err(BellandeError::InvalidShape(format!(
                "Expected a [height, width, channels] frame, got {:?}",
                self.shape
            ))),
        }
    }

    /// `(rows, cols)` of a matrix tensor.
    pub fn matrix_dims(&self) -> Result<(usize, usize), BellandeError> {
        match self.shape[..] {
            [rows, cols] => Ok((rows, cols)),
            _ => Err(BellandeError::InvalidShape(format!(
                "Expected a 2D matrix, got {:?}",
                self.shape
            ))),
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Tensor::full(shape, 0.0)
    }

    pub fn ones(shape: &[usize]) -> Self {
        Tensor::full(shape, 1.0)
    }

    pub fn full(shape: &[usize], value: f32) -> Self {
        let size = shape.iter().product();
        Tensor::new(vec![value; size], shape.to_vec(), DataType::default())
    }

    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn stack(tensors: &[Tensor]) -> Result<Tensor, BellandeError> {
        if tensors.is_empty() {
            return Err(BellandeError::InvalidInputs("Cannot stack zero tensors".into()));
        }

        let base_shape = tensors[0].shape();

        // Verify all tensors have the same shape
        for (i, tensor) in tensors.iter().enumerate().skip(1) {
            if tensor.shape() != base_shape {
                return Err(BellandeError::ShapeMismatch(format!(
                    "tensor 0 has shape {:?} but tensor {} has shape {:?}",
                    base_shape,
                    i,
                    tensor.shape()
                )));
            }
        }

        // Calculate new shape with batch dimension
        let mut new_shape = vec![tensors.len()];
        new_shape.extend(base_shape);

        let mut stacked = Tensor::zeros(&new_shape).with_dtype(tensors[0].dtype);
        for (i, tensor) in tensors.iter().enumerate() {
            stacked.copy_slice(i, tensor)?;
        }
        Ok(stacked)
    }

    pub fn copy_slice(&mut self, batch_idx: usize, source: &Tensor) -> Result<(), BellandeError> {
        let strides = compute_strides(&self.shape);
        if strides.is_empty() {
            return Err(BellandeError::InvalidShape("Empty tensor shape".into()));
        }

        let batch_stride = strides[0];
        let start_idx = batch_idx * batch_stride;
        let end_idx = start_idx + batch_stride;

        if end_idx > self.data.len() {
            return Err(BellandeError::IndexOutOfBounds);
        }

        // Check if source has correct size
        if source.data.len() != batch_stride {
            return Err(BellandeError::DimensionMismatch);
        }

        self.data[start_idx..end_idx].copy_from_slice(&source.data);
        Ok(())
    }

    pub fn permute(&self, dims: &[usize]) -> Result<Tensor, BellandeError> {
        if dims.len() != self.shape.len() {
            return Err(BellandeError::InvalidShape(format!(
                "Permutation dimensions must match tensor dimensions: expected {}, got {}",
                self.shape.len(),
                dims.len()
            )));
        }

        let mut new_shape = vec![0; self.shape.len()];
        for (i, &dim) in dims.iter().enumerate() {
            if dim >= self.shape.len() {
                return Err(BellandeError::InvalidShape(format!(
                    "Invalid permutation dimension: {}",
                    dim
                )));
            }
            new_shape[i] = self.shape[dim];
        }

        let mut new_data = vec![0.0; self.data.len()];
        let strides = compute_strides(&self.shape);
        let new_strides = compute_strides(&new_shape);

        for i in 0..self.data.len() {
            let old_indices = get_indices(i, &strides, &self.shape);
            let mut new_indices = vec![0; old_indices.len()];
            for (j, &dim) in dims.iter().enumerate() {
                new_indices[j] = old_indices[dim];
            }
            let new_idx = get_flat_index(&new_indices, &new_strides);
            new_data[new_idx] = self.data[i];
        }

        Ok(Tensor::new(new_data, new_shape, self.dtype))
    }

    pub fn reshape(&self, new_shape: &[usize]) -> Result<Tensor, BellandeError> {
        let new_size: usize = new_shape.iter().product();
        if new_size != self.data.len() {
            return Err(BellandeError::InvalidShape(format!(
                "Cannot reshape tensor of size {} to shape {:?}",
                self.data.len(),
                new_shape
            )));
        }

        Ok(Tensor::new(self.data.clone(), new_shape.to_vec(), self.dtype))
    }

    /// Inserts a singleton axis at `dim`.
    pub fn unsqueeze(&self, dim: usize) -> Result<Tensor, BellandeError> {
        if dim > self.shape.len() {
            return Err(BellandeError::InvalidShape(format!(
                "Cannot insert axis {} into a tensor with {} dimensions",
                dim,
                self.shape.len()
            )));
        }
        let mut new_shape = self.shape.clone();
        new_shape.insert(dim, 1);
        self.reshape(&new_shape)
    }

    pub fn sum_dim(&self, dim: usize, keepdim: bool) -> Result<Tensor, BellandeError> {
        if dim >= self.shape.len() {
            return Err(BellandeError::InvalidShape(format!(
                "Dimension {} out of bounds",
                dim
            )));
        }

        let mut new_shape = self.shape.clone();
        if !keepdim {
            new_shape.remove(dim);
        } else {
            new_shape[dim] = 1;
        }

        let stride: usize = self.shape[dim..].iter().product();
        let outer_stride: usize = self.shape[..dim].iter().product();
        let inner_size: usize = if self.shape[dim] == 0 {
            0
        } else {
            stride / self.shape[dim]
        };
        let mut result = vec![0.0; new_shape.iter().product()];

        for i in 0..outer_stride {
            for k in 0..inner_size {
                let mut sum = 0.0;
                for j in 0..self.shape[dim] {
                    let idx = i * stride + j * inner_size + k;
                    sum += self.data[idx];
                }
                result[i * inner_size + k] = sum;
            }
        }

        Ok(Tensor::new(result, new_shape, DataType::Float32))
    }

    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Result<Tensor, BellandeError> {
        if dim >= self.shape.len() {
            return Err(BellandeError::InvalidShape(format!(
                "Dimension {} out of range for tensor with {} dimensions",
                dim,
                self.shape.len()
            )));
        }

        if start + length > self.shape[dim] {
            return Err(BellandeError::InvalidShape(
                "Narrow operation out of bounds".into(),
            ));
        }

        let mut new_shape = self.shape.clone();
        new_shape[dim] = length;

        let mut new_data = Vec::with_capacity(new_shape.iter().product());
        let stride = self.get_stride(dim);

        // Collect the narrowed data
        for i in 0..self.data.len() {
            let dim_idx = (i / stride) % self.shape[dim];
            if dim_idx >= start && dim_idx < start + length {
                new_data.push(self.data[i]);
            }
        }

        Ok(Tensor::new(new_data, new_shape, self.dtype))
    }

    fn get_stride(&self, dim: usize) -> usize {
        self.shape[dim + 1..].iter().product()
    }

    pub fn scale(&self, factor: f32) -> Tensor {
        let new_data = self.data.iter().map(|&x| x * factor).collect();
        Tensor::new(new_data, self.shape.clone(), self.dtype)
    }

    pub fn add_scalar(&self, value: f32) -> Tensor {
        let new_data = self.data.iter().map(|&x| x + value).collect();
        Tensor::new(new_data, self.shape.clone(), self.dtype)
    }
}

fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

fn get_indices(flat_idx: usize, strides: &[usize], shape: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; shape.len()];
    let mut remaining = flat_idx;
    for i in 0..shape.len() {
        indices[i] = remaining / strides[i];
        remaining %= strides[i];
    }
    indices
}

fn get_flat_index(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

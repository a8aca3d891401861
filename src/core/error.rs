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

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum BellandeError {
    InvalidShape(String),
    ShapeMismatch(String),
    DimensionMismatch,
    InvalidInputs(String),
    IndexOutOfBounds,
    LockError,
    IOError(String),
    SerializationError(String),
    InvalidDataType,
    InvalidOperation(String),
    InvalidConfiguration(String),
    InvalidParameter(String),
    UnsupportedConversion(String),
    CapacityExceeded { boxes: usize, capacity: usize },
    MixedBatch { paired: usize, single: usize },
}

impl Error for BellandeError {}

impl fmt::Display for BellandeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BellandeError::InvalidShape(msg) => write!(f, "Invalid tensor shape: {}", msg),
            BellandeError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            BellandeError::DimensionMismatch => write!(f, "Tensor dimensions do not match"),
            BellandeError::InvalidInputs(msg) => write!(f, "Invalid inputs: {}", msg),
            BellandeError::IndexOutOfBounds => write!(f, "Index out of bounds"),
            BellandeError::LockError => write!(f, "Lock error"),
            BellandeError::IOError(err) => write!(f, "IO error: {}", err),
            BellandeError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            BellandeError::InvalidDataType => write!(f, "Invalid data type"),
            BellandeError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            BellandeError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            BellandeError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            BellandeError::UnsupportedConversion(msg) => {
                write!(f, "Unsupported color conversion: {}", msg)
            }
            BellandeError::CapacityExceeded { boxes, capacity } => write!(
                f,
                "Box set of {} entries exceeds the configured capacity of {}",
                boxes, capacity
            ),
            BellandeError::MixedBatch { paired, single } => write!(
                f,
                "Batch mixes {} paired samples with {} single-frame samples",
                paired, single
            ),
        }
    }
}

impl From<std::io::Error> for BellandeError {
    fn from(err: std::io::Error) -> Self {
        BellandeError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for BellandeError {
    fn from(err: serde_yaml::Error) -> Self {
        BellandeError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for BellandeError {
    fn from(err: serde_json::Error) -> Self {
        BellandeError::SerializationError(err.to_string())
    }
}

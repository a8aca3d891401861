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

/// Logical element type of a tensor. Storage is always `f32`; the tag records
/// how the values are meant to be read (raw 8-bit pixels, floats, or 0/1 flags).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    Float32,
    UInt8,
    Bool,
}

impl DataType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::Float32 => 4,
            DataType::UInt8 => 1,
            DataType::Bool => 1,
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, DataType::Float32)
    }

    pub fn default() -> Self {
        DataType::Float32
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataType::Float32 => write!(f, "float32"),
            DataType::UInt8 => write!(f, "uint8"),
            DataType::Bool => write!(f, "bool"),
        }
    }
}

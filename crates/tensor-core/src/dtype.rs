// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element data types for model variables and IR values.

use crate::TensorError;
use std::fmt;
use std::str::FromStr;

/// Enumerates the element types a model variable or IR value can hold.
///
/// Names follow the NumPy-style spelling used by model descriptors and by
/// the IR printer (`"float32"`, `"int64"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float32,
    Float16,
    BFloat16,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    Bool,
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::Float64 | DType::Int64 => 8,
            DType::Float32 | DType::Int32 => 4,
            DType::Float16 | DType::BFloat16 | DType::Int16 => 2,
            DType::Int8 | DType::UInt8 | DType::Bool => 1,
        }
    }

    /// Returns the canonical label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Float16 => "float16",
            DType::BFloat16 => "bfloat16",
            DType::Float64 => "float64",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::Bool => "bool",
        }
    }

    /// Returns `true` for the floating-point types.
    pub fn is_float(self) -> bool {
        matches!(
            self,
            DType::Float32 | DType::Float16 | DType::BFloat16 | DType::Float64
        )
    }
}

impl Default for DType {
    fn default() -> Self {
        DType::Float32
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses both the canonical names and the short aliases (`"f32"`, `"i64"`).
impl FromStr for DType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "float32" | "f32" | "float" => Ok(DType::Float32),
            "float16" | "f16" | "half" => Ok(DType::Float16),
            "bfloat16" | "bf16" => Ok(DType::BFloat16),
            "float64" | "f64" | "double" => Ok(DType::Float64),
            "int8" | "i8" => Ok(DType::Int8),
            "int16" | "i16" => Ok(DType::Int16),
            "int32" | "i32" => Ok(DType::Int32),
            "int64" | "i64" => Ok(DType::Int64),
            "uint8" | "u8" => Ok(DType::UInt8),
            "bool" => Ok(DType::Bool),
            _ => Err(TensorError::UnknownDType(s.to_string())),
        }
    }
}

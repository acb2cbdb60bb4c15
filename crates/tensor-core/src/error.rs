// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction and element-type parsing.

use crate::Shape;

/// Errors that can occur when building tensors or parsing element types.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The number of values does not match the element count of the shape.
    #[error("value count mismatch for shape {shape}: expected {expected} elements, got {actual}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    /// A declared dimension is negative where a concrete size is required.
    #[error("dimension {index} of {dims:?} is negative")]
    NegativeDimension { dims: Vec<i64>, index: usize },

    /// The element type string is not recognised.
    #[error("unknown element type '{0}'")]
    UnknownDType(String),
}

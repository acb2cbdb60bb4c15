// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Placeholder-dimension resolution.
//!
//! Declared shapes use negative entries (conventionally `-1`) for the batch
//! dimension. Resolution replaces every negative entry with one concrete,
//! positive batch size; all other entries pass through unchanged.

use crate::ImportError;
use tensor_core::Shape;

/// Chooses the batch size for an import.
///
/// A negative `requested` value defers to the network's `declared` default.
/// The chosen value must be positive.
pub fn resolve_batch_size(requested: i64, declared: Option<i64>) -> Result<usize, ImportError> {
    let batch_size = if requested < 0 {
        declared.unwrap_or(requested)
    } else {
        requested
    };
    if batch_size <= 0 {
        return Err(ImportError::InvalidBatchSize { batch_size });
    }
    usize::try_from(batch_size).map_err(|_| ImportError::InvalidBatchSize { batch_size })
}

/// Replaces every negative dimension of `raw` with `batch_size`.
pub fn resolve_shape(raw: &[i64], batch_size: i64) -> Result<Shape, ImportError> {
    if batch_size <= 0 {
        return Err(ImportError::InvalidBatchSize { batch_size });
    }
    let dims: Vec<i64> = raw
        .iter()
        .map(|&d| if d < 0 { batch_size } else { d })
        .collect();
    Ok(Shape::from_signed(&dims)?)
}

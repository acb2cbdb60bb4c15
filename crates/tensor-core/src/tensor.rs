// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Owned dense tensors for learned parameters and IR constants.

use crate::{DType, Shape, TensorError};
use std::fmt;

/// An owned, dense, row-major `float32` array.
///
/// NNP parameters are serialised as flat `float` lists, so every parameter
/// and every importer-generated constant is stored as `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a tensor from a flat list of values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Shape, Tensor};
    /// let t = Tensor::from_f32(Shape::new(vec![2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(t.as_f32_slice()[3], 4.0);
    /// ```
    pub fn from_f32(shape: Shape, data: Vec<f32>) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(TensorError::ElementCountMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a tensor where every element equals `value`.
    pub fn filled(shape: Shape, value: f32) -> Self {
        let data = vec![value; shape.num_elements()];
        Self { shape, data }
    }

    /// Creates a rank-0 tensor.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the element type.
    pub fn dtype(&self) -> DType {
        DType::Float32
    }

    /// Returns the values in row-major order.
    pub fn as_f32_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the value of a rank-0 or single-element tensor.
    pub fn as_scalar(&self) -> Option<f32> {
        match self.data.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Returns the memory footprint of the values in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * self.dtype().size_bytes()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor[{}, {}]", self.shape, self.dtype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::from_f32(Shape::new(vec![2, 3]), data.clone()).unwrap();
        assert_eq!(t.as_f32_slice(), data.as_slice());
        assert_eq!(t.dtype(), DType::Float32);
        assert_eq!(t.size_bytes(), 24);
    }

    #[test]
    fn test_from_f32_count_mismatch() {
        let err = Tensor::from_f32(Shape::new(vec![2, 3]), vec![0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            TensorError::ElementCountMismatch {
                expected: 6,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_filled_and_scalar() {
        let t = Tensor::filled(Shape::new(vec![3]), 0.5);
        assert!(t.as_f32_slice().iter().all(|&x| x == 0.5));
        assert_eq!(t.as_scalar(), None);

        let s = Tensor::scalar(2.0);
        assert_eq!(s.shape().rank(), 0);
        assert_eq!(s.as_scalar(), Some(2.0));
    }

    #[test]
    fn test_display() {
        let t = Tensor::filled(Shape::new(vec![16, 3, 3, 3]), 0.0);
        assert_eq!(t.to_string(), "Tensor[(16, 3, 3, 3), float32]");
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Value types shared between the NNP model descriptor, the importer and the
//! dataflow IR:
//!
//! - [`DType`]: element types a model variable or IR value can carry.
//! - [`Shape`]: fully resolved (concrete, non-negative) tensor dimensions.
//! - [`Tensor`]: an owned dense array used for learned parameters and
//!   IR constants.
//!
//! Nothing in this crate knows about graphs; it only describes data.

mod dtype;
mod error;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::Tensor;

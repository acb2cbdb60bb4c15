// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # dataflow-ir
//!
//! A small expression IR for imported neural-network graphs.
//!
//! - [`Expr`]: an immutable, reference-counted expression node. Cloning is
//!   a pointer copy, so one value can feed any number of consumers and the
//!   program forms a DAG rather than a tree.
//! - [`op`]: constructors for the operator vocabulary (`nn.conv2d`,
//!   `nn.dense`, `add`, ...).
//! - [`analysis`]: post-order traversal and free-variable collection.
//! - [`Function`]: a closed function over its free variables, with a
//!   textual printer.
//!
//! # Example
//! ```
//! use dataflow_ir::{op, Expr, Function, TensorType};
//! use tensor_core::{DType, Shape};
//!
//! let x = Expr::var("x", TensorType::new(Shape::new(vec![1, 8]), DType::Float32));
//! let func = Function::closed(op::relu(x));
//! assert_eq!(func.params().len(), 1);
//! println!("{func}");
//! ```

pub mod analysis;
mod attrs;
mod expr;
mod function;
pub mod op;

pub use attrs::{AttrValue, Attrs};
pub use expr::{Call, Constant, Expr, ExprKind, Op, TensorType, Var};
pub use function::Function;

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # nnp-model
//!
//! The in-memory form of a decoded NNP (Neural Network Libraries) model.
//!
//! An NNP file bundles:
//!
//! - [`Network`]s: each a list of [`Variable`]s and [`FunctionNode`]s.
//! - Global [`Parameter`]s: learned weights stored as flat `float` lists.
//! - [`Executor`]s: execution entry points naming a network, its data
//!   (runtime input) variables, generator variables and outputs.
//!
//! Decoding protobuf bytes or `.nnp` archives is left to a codec; this
//! crate only defines the decoded data model plus a JSON loader that
//! mirrors the protobuf text format field for field.
//!
//! # Example
//! ```no_run
//! use nnp_model::NnpModel;
//! use std::path::Path;
//!
//! let model = NnpModel::from_file(Path::new("./models/lenet.json")).unwrap();
//! for network in &model.networks {
//!     println!("{}: {} functions", network.name, network.functions.len());
//! }
//! ```

mod attributes;
mod descriptor;
mod error;

pub use attributes::{AttrValue, Attributes};
pub use descriptor::{
    DataVariable, Executor, FunctionNode, GeneratorVariable, Network, NnpModel, OutputVariable,
    Parameter, ParameterVariable, Variable, VariableKind,
};
pub use error::ModelError;

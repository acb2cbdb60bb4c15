// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Decoded model descriptor types.
//!
//! Field names follow the NNP protobuf schema. Repeated protobuf fields are
//! singular there (`input`, `data_variable`); the plural spelling is used
//! here and the singular one is accepted as an alias.
//!
//! # Format
//! ```json
//! {
//!   "networks": [{
//!     "name": "main",
//!     "batch_size": 1,
//!     "variables": [
//!       { "name": "x", "type": "Buffer", "shape": [-1, 1, 28, 28] },
//!       { "name": "conv/W", "type": "Parameter", "shape": [16, 1, 5, 5] }
//!     ],
//!     "functions": [
//!       { "name": "conv", "type": "Convolution",
//!         "inputs": ["x", "conv/W"], "outputs": ["y"],
//!         "attributes": { "pad": [0, 0], "stride": [1, 1] } }
//!     ]
//!   }],
//!   "parameters": [{ "variable_name": "conv/W", "shape": [16, 1, 5, 5], "data": [...] }],
//!   "executors": [{
//!     "name": "runtime", "network_name": "main",
//!     "data_variables": [{ "variable_name": "x", "data_name": "x" }],
//!     "output_variables": [{ "variable_name": "y", "data_name": "y" }]
//!   }]
//! }
//! ```

use crate::{Attributes, ModelError};
use std::collections::BTreeMap;
use std::path::Path;

/// A complete decoded model.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct NnpModel {
    #[serde(default, alias = "network")]
    pub networks: Vec<Network>,
    #[serde(default, alias = "parameter")]
    pub parameters: Vec<Parameter>,
    #[serde(default, alias = "executor")]
    pub executors: Vec<Executor>,
}

impl NnpModel {
    /// Loads a descriptor from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a descriptor from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        tracing::debug!(
            networks = model.networks.len(),
            parameters = model.parameters.len(),
            executors = model.executors.len(),
            "decoded model descriptor"
        );
        Ok(model)
    }

    /// Serialises the descriptor back to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Finds a network by name.
    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.name == name)
    }

    /// Counts function nodes per operator type across all networks.
    pub fn op_histogram(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for function in self.networks.iter().flat_map(|n| &n.functions) {
            *counts.entry(function.op_type.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// A network definition: variables plus the functions connecting them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Network {
    pub name: String,
    /// Batch size the network was exported with; substituted for negative
    /// dimensions when the importer is not given one.
    #[serde(default)]
    pub batch_size: Option<i64>,
    #[serde(default, alias = "variable")]
    pub variables: Vec<Variable>,
    #[serde(default, alias = "function")]
    pub functions: Vec<FunctionNode>,
}

impl Network {
    /// Creates an empty network.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_size: None,
            variables: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Finds a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Whether a variable holds activations or learned weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VariableKind {
    #[default]
    Buffer,
    Parameter,
}

/// A declared variable. Negative dimensions stand for the batch size.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    #[serde(default)]
    pub shape: Vec<i64>,
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_dtype() -> String {
    "float32".to_string()
}

impl Variable {
    /// Creates a `float32` buffer variable.
    pub fn new(name: impl Into<String>, shape: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Buffer,
            shape,
            dtype: default_dtype(),
        }
    }

    /// Creates a `float32` parameter variable.
    pub fn parameter(name: impl Into<String>, shape: Vec<i64>) -> Self {
        Self {
            kind: VariableKind::Parameter,
            ..Self::new(name, shape)
        }
    }
}

/// One function (operator) node of a network.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionNode {
    pub name: String,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default, alias = "input")]
    pub inputs: Vec<String>,
    #[serde(default, alias = "output")]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl FunctionNode {
    /// Creates a node without attributes.
    pub fn new<I, O>(name: impl Into<String>, op_type: impl Into<String>, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            attributes: Attributes::new(),
        }
    }

    /// Replaces the attribute bag.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A learned parameter stored in the model file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    pub variable_name: String,
    #[serde(default)]
    pub shape: Vec<i64>,
    #[serde(default)]
    pub data: Vec<f32>,
}

impl Parameter {
    pub fn new(variable_name: impl Into<String>, shape: Vec<i64>, data: Vec<f32>) -> Self {
        Self {
            variable_name: variable_name.into(),
            shape,
            data,
        }
    }
}

/// An execution entry point.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Executor {
    pub name: String,
    pub network_name: String,
    #[serde(default, alias = "data_variable")]
    pub data_variables: Vec<DataVariable>,
    #[serde(default, alias = "generator_variable")]
    pub generator_variables: Vec<GeneratorVariable>,
    #[serde(default, alias = "output_variable")]
    pub output_variables: Vec<OutputVariable>,
    #[serde(default, alias = "parameter_variable")]
    pub parameter_variables: Vec<ParameterVariable>,
}

impl Executor {
    /// Creates an executor with no declared variables.
    pub fn new(name: impl Into<String>, network_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            network_name: network_name.into(),
            data_variables: Vec::new(),
            generator_variables: Vec::new(),
            output_variables: Vec::new(),
            parameter_variables: Vec::new(),
        }
    }

    /// Names of the variables fed at run time.
    pub fn data_names(&self) -> impl Iterator<Item = &str> {
        self.data_variables.iter().map(|v| v.variable_name.as_str())
    }

    /// Names of the generator (initializer) variables.
    pub fn generator_names(&self) -> impl Iterator<Item = &str> {
        self.generator_variables.iter().map(|v| v.variable_name.as_str())
    }

    /// Names of the declared outputs, in declaration order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.output_variables.iter().map(|v| v.variable_name.as_str())
    }

    /// Names the executor expects to find among the stored parameters.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameter_variables.iter().map(|v| v.variable_name.as_str())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DataVariable {
    pub variable_name: String,
    #[serde(default)]
    pub data_name: String,
}

impl DataVariable {
    pub fn new(variable_name: impl Into<String>) -> Self {
        let variable_name = variable_name.into();
        Self {
            data_name: variable_name.clone(),
            variable_name,
        }
    }
}

/// A variable filled by a generator (e.g. `Normal`, `Uniform`, `Constant`)
/// rather than by user data.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GeneratorVariable {
    pub variable_name: String,
    #[serde(default)]
    pub generator_type: String,
    #[serde(default)]
    pub generator_multiplier: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OutputVariable {
    pub variable_name: String,
    #[serde(default)]
    pub data_name: String,
}

impl OutputVariable {
    pub fn new(variable_name: impl Into<String>) -> Self {
        let variable_name = variable_name.into();
        Self {
            data_name: variable_name.clone(),
            variable_name,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParameterVariable {
    pub variable_name: String,
}

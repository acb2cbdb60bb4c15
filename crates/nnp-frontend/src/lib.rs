// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # nnp-frontend
//!
//! Imports an NNP model (networks, parameters, one executor) into a closed
//! [`dataflow_ir::Function`].
//!
//! The pipeline:
//! ```text
//! NnpModel ─select_entry_point─▶ NnpGraph<Selected>
//!          ─assemble──────────▶ NnpGraph<Assembled>   (shapes, params, inputs)
//!          ─Exporter::export──▶ Bindings              (topological conversion)
//!          ─close─────────────▶ ImportedModule        (function + params)
//! ```
//!
//! Parameters become named constants and are never function parameters,
//! even when the executor also lists them as inputs. Operator handlers are
//! looked up in an [`OperatorRegistry`]; the built-in one is shared by all
//! importers and never mutated.
//!
//! # Example
//! ```no_run
//! use nnp_frontend::{from_nnp, ImportConfig};
//! use nnp_model::NnpModel;
//! use std::path::Path;
//!
//! let model = NnpModel::from_file(Path::new("lenet.json")).unwrap();
//! let config = ImportConfig::default().with_batch_size(1);
//! let module = from_nnp(&model, &config).unwrap();
//! println!("{}", module.function);
//! ```

mod bindings;
mod closer;
mod config;
mod error;
mod exporter;
pub mod graph;
pub mod ops;
mod registry;
pub mod shape;

pub use bindings::Bindings;
pub use closer::{close, ImportedModule};
pub use config::{DTypeSpec, ImportConfig};
pub use error::ImportError;
pub use exporter::Exporter;
pub use graph::{select_entry_point, NnpGraph};
pub use registry::{builtin, ConvertContext, OpConverter, OpOutput, OperatorRegistry, CONSTANT_OP};

use nnp_model::NnpModel;

/// Runs the full import pipeline against one registry.
#[derive(Debug, Clone, Copy)]
pub struct Importer<'r> {
    registry: &'r OperatorRegistry,
}

impl Importer<'static> {
    /// An importer using the built-in operator handlers.
    pub fn new() -> Self {
        Self {
            registry: builtin(),
        }
    }
}

impl Default for Importer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Importer<'r> {
    /// An importer using a caller-built registry.
    pub fn with_registry(registry: &'r OperatorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r OperatorRegistry {
        self.registry
    }

    /// Imports `model` into a closed function.
    pub fn import(&self, model: &NnpModel, config: &ImportConfig) -> Result<ImportedModule, ImportError> {
        let graph = select_entry_point(model)?.assemble(config.batch_size, &config.shapes)?;
        let bindings = Exporter::new(&graph, self.registry, config).export()?;
        close(&graph, &bindings)
    }
}

/// Imports `model` with the built-in handlers.
pub fn from_nnp(model: &NnpModel, config: &ImportConfig) -> Result<ImportedModule, ImportError> {
    Importer::new().import(model, config)
}

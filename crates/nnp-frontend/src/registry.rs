// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator dispatch: NNP operator type name → conversion handler.
//!
//! The built-in table is built once per process and never mutated
//! afterwards, so concurrent imports share it without locking. Callers that
//! need extra operators build their own registry, usually starting from
//! [`OperatorRegistry::with_builtins`], and lend it to an importer.

use crate::graph::{Assembled, NnpGraph};
use crate::{ops, ImportError};
use dataflow_ir::Expr;
use nnp_model::FunctionNode;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

/// Pseudo operator that is always accepted by the feasibility check.
pub const CONSTANT_OP: &str = "Constant";

/// Values produced by one converted node.
#[derive(Debug, Clone)]
pub enum OpOutput {
    Single(Expr),
    /// Ordered values, one per declared output.
    Multi(Vec<Expr>),
}

impl OpOutput {
    pub fn len(&self) -> usize {
        match self {
            OpOutput::Single(_) => 1,
            OpOutput::Multi(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_values(self) -> Vec<Expr> {
        match self {
            OpOutput::Single(value) => vec![value],
            OpOutput::Multi(values) => values,
        }
    }
}

impl From<Expr> for OpOutput {
    fn from(value: Expr) -> Self {
        OpOutput::Single(value)
    }
}

/// Read-only view of the graph handed to every handler.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'g> {
    graph: &'g NnpGraph<Assembled>,
}

impl<'g> ConvertContext<'g> {
    pub fn new(graph: &'g NnpGraph<Assembled>) -> Self {
        Self { graph }
    }

    /// Shape of a variable. A parameter reports its stored tensor's shape.
    pub fn shape(&self, name: &str) -> Option<&'g Shape> {
        self.graph
            .params()
            .get(name)
            .map(|t| t.shape())
            .or_else(|| self.graph.shape(name))
    }

    pub fn param(&self, name: &str) -> Option<&'g Arc<Tensor>> {
        self.graph.params().get(name)
    }

    pub fn batch_size(&self) -> usize {
        self.graph.batch_size()
    }
}

/// Converts one NNP function node into IR values.
///
/// `inputs` holds the IR value bound to each of the node's input names, in
/// order. Handlers are stateless and shared across threads.
pub trait OpConverter: Send + Sync {
    fn convert(
        &self,
        inputs: &[Expr],
        node: &FunctionNode,
        ctx: &ConvertContext<'_>,
    ) -> Result<OpOutput, ImportError>;
}

impl<F> OpConverter for F
where
    F: Fn(&[Expr], &FunctionNode, &ConvertContext<'_>) -> Result<OpOutput, ImportError>
        + Send
        + Sync,
{
    fn convert(
        &self,
        inputs: &[Expr],
        node: &FunctionNode,
        ctx: &ConvertContext<'_>,
    ) -> Result<OpOutput, ImportError> {
        self(inputs, node, ctx)
    }
}

static BUILTIN: Lazy<OperatorRegistry> = Lazy::new(OperatorRegistry::with_builtins);

fn collect_handlers(
    entries: Vec<(&'static str, Box<dyn OpConverter>)>,
) -> Result<OperatorRegistry, ImportError> {
    let mut registry = OperatorRegistry::new();
    for (op_type, handler) in entries {
        registry.insert(op_type.to_string(), handler)?;
    }
    Ok(registry)
}

/// The process-wide registry of built-in handlers.
pub fn builtin() -> &'static OperatorRegistry {
    &BUILTIN
}

/// Operator type → handler table.
#[derive(Default)]
pub struct OperatorRegistry {
    handlers: HashMap<String, Box<dyn OpConverter>>,
}

impl OperatorRegistry {
    /// An empty registry. Only [`CONSTANT_OP`] is convertible.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in handler.
    ///
    /// The built-in table goes through the same uniqueness check as
    /// [`register`](Self::register); a name listed twice is a bug in the
    /// table and fails loudly in debug builds.
    pub fn with_builtins() -> Self {
        let table = collect_handlers(ops::builtin_handlers());
        debug_assert!(table.is_ok(), "invalid built-in handler table: {table:?}");
        match table {
            Ok(registry) => {
                tracing::debug!(handlers = registry.len(), "initialised operator registry");
                registry
            }
            Err(e) => {
                tracing::error!(error = %e, "invalid built-in handler table");
                Self::new()
            }
        }
    }

    /// Adds a handler for `op_type`.
    ///
    /// # Errors
    /// [`ImportError::DuplicateRegistration`] if `op_type` already has one.
    pub fn register(
        &mut self,
        op_type: impl Into<String>,
        handler: impl OpConverter + 'static,
    ) -> Result<(), ImportError> {
        self.insert(op_type.into(), Box::new(handler))
    }

    fn insert(&mut self, op_type: String, handler: Box<dyn OpConverter>) -> Result<(), ImportError> {
        if self.handlers.contains_key(&op_type) {
            return Err(ImportError::DuplicateRegistration { op_type });
        }
        self.handlers.insert(op_type, handler);
        Ok(())
    }

    pub fn supports(&self, op_type: &str) -> bool {
        op_type == CONSTANT_OP || self.handlers.contains_key(op_type)
    }

    /// Handler for `op_type`.
    ///
    /// # Errors
    /// [`ImportError::UnsupportedOperator`] naming `op_type`.
    pub fn dispatch(&self, op_type: &str) -> Result<&dyn OpConverter, ImportError> {
        if let Some(handler) = self.handlers.get(op_type) {
            return Ok(handler.as_ref());
        }
        if op_type == CONSTANT_OP {
            let fallback: &'static dyn OpConverter = &ops::constant::convert;
            return Ok(fallback);
        }
        Err(ImportError::UnsupportedOperator {
            op_types: vec![op_type.to_string()],
        })
    }

    /// Checks every operator type up front.
    ///
    /// # Errors
    /// One [`ImportError::UnsupportedOperator`] listing all unsupported
    /// types, sorted and without duplicates.
    pub fn check_supported<'a>(
        &self,
        op_types: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ImportError> {
        let missing: BTreeSet<&str> = op_types
            .into_iter()
            .filter(|op| !self.supports(op))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(ImportError::UnsupportedOperator {
            op_types: missing.into_iter().map(str::to_string).collect(),
        })
    }

    /// Registered operator types, sorted.
    pub fn op_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("op_types", &self.op_types())
            .finish()
    }
}

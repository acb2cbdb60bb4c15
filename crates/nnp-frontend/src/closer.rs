// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Wraps the converted outputs into a closed function.

use crate::bindings::Bindings;
use crate::graph::{Assembled, NnpGraph};
use crate::ImportError;
use dataflow_ir::analysis::{free_vars, post_order};
use dataflow_ir::{Expr, Function};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tensor_core::Tensor;

/// Result of a successful import: the IR function and the tensors its
/// named constants refer to (stored parameters and `Constant` nodes).
#[derive(Debug, Clone)]
pub struct ImportedModule {
    pub function: Function,
    pub params: BTreeMap<String, Arc<Tensor>>,
}

impl ImportedModule {
    /// Total parameter payload in bytes.
    pub fn param_bytes(&self) -> usize {
        self.params.values().map(|t| t.size_bytes()).sum()
    }
}

impl fmt::Display for ImportedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.function)?;
        for (name, tensor) in &self.params {
            writeln!(f, "meta[{name}] = {tensor}")?;
        }
        Ok(())
    }
}

/// Builds the closed function for the graph's declared outputs.
///
/// One output becomes the body directly; several become a tuple in
/// declaration order. Function parameters are the runtime inputs the body
/// reaches, ordered as the executor declares them.
///
/// # Errors
/// - [`ImportError::UnresolvedOutput`] if an output was never bound.
/// - [`ImportError::MalformedGraph`] if the executor declares no outputs.
pub fn close(graph: &NnpGraph<Assembled>, bindings: &Bindings) -> Result<ImportedModule, ImportError> {
    let mut values = graph
        .outputs()
        .iter()
        .map(|name| {
            bindings
                .get(name)
                .cloned()
                .ok_or_else(|| ImportError::UnresolvedOutput { name: name.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let body = match values.len() {
        0 => {
            return Err(ImportError::MalformedGraph(format!(
                "executor '{}' declares no outputs",
                graph.executor_name()
            )))
        }
        1 => values.remove(0),
        _ => Expr::tuple(values),
    };

    let inputs: Vec<&str> = graph.runtime_inputs().collect();
    let mut params = free_vars(&body);
    params.sort_by_key(|v| inputs.iter().position(|n| *n == v.name()).unwrap_or(usize::MAX));
    for name in inputs.iter().filter(|n| !params.iter().any(|p| p.name() == **n)) {
        tracing::warn!(input = %name, "runtime input does not reach any output");
    }

    let mut constants = graph.params().clone();
    for expr in post_order(&body) {
        if let Some(c) = expr.as_constant() {
            if let Some(name) = c.name() {
                constants
                    .entry(name.to_string())
                    .or_insert_with(|| c.value().clone());
            }
        }
    }

    tracing::debug!(
        params = params.len(),
        outputs = graph.outputs().len(),
        constants = constants.len(),
        "closed function"
    );
    Ok(ImportedModule {
        function: Function::new(params, body),
        params: constants,
    })
}

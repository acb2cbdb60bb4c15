// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node conversion: walks an assembled graph in dependency order and binds
//! every produced value.
//!
//! # Phases
//! 1. Feasibility check: every operator type must have a handler.
//! 2. Parameters become named constants.
//! 3. Runtime inputs become free variables.
//! 4. Nodes are converted in topological order; each output name is bound
//!    exactly once.
//!
//! Any failure aborts the import; the partially built bindings are dropped.

use crate::bindings::Bindings;
use crate::config::ImportConfig;
use crate::graph::{Assembled, NnpGraph};
use crate::registry::{ConvertContext, OperatorRegistry};
use crate::ImportError;
use dataflow_ir::{Expr, TensorType};
use nnp_model::FunctionNode;

/// Converts the nodes of one graph into IR values.
pub struct Exporter<'a> {
    graph: &'a NnpGraph<Assembled>,
    registry: &'a OperatorRegistry,
    config: &'a ImportConfig,
    bindings: Bindings,
}

impl<'a> Exporter<'a> {
    pub fn new(
        graph: &'a NnpGraph<Assembled>,
        registry: &'a OperatorRegistry,
        config: &'a ImportConfig,
    ) -> Self {
        Self {
            graph,
            registry,
            config,
            bindings: Bindings::new(),
        }
    }

    /// Runs every phase and returns the complete bindings.
    pub fn export(mut self) -> Result<Bindings, ImportError> {
        self.registry
            .check_supported(self.graph.nodes().iter().map(|n| n.op_type.as_str()))?;
        self.bind_parameters()?;
        self.bind_inputs()?;
        self.convert_nodes()?;

        tracing::debug!(
            network = %self.graph.network_name(),
            bindings = self.bindings.len(),
            "converted graph"
        );
        Ok(self.bindings)
    }

    fn bind_parameters(&mut self) -> Result<(), ImportError> {
        for (name, tensor) in self.graph.params() {
            self.bindings
                .bind(name.as_str(), Expr::named_constant(name.as_str(), tensor.clone()))?;
        }
        Ok(())
    }

    fn bind_inputs(&mut self) -> Result<(), ImportError> {
        for name in self.graph.runtime_inputs() {
            let shape = self
                .graph
                .shape(name)
                .ok_or_else(|| ImportError::MissingInputShape {
                    name: name.to_string(),
                })?;
            let declared = self
                .graph
                .variable(name)
                .map_or("float32", |v| v.dtype.as_str());
            let dtype = self.config.resolve_dtype(name, declared)?;
            let ty = TensorType::new(shape.clone(), dtype);
            tracing::debug!(input = %name, ty = %ty, "bound runtime input");
            self.bindings.bind(name, Expr::var(name, ty))?;
        }
        Ok(())
    }

    fn convert_nodes(&mut self) -> Result<(), ImportError> {
        let ctx = ConvertContext::new(self.graph);
        for node in self.graph.topological_order()? {
            self.convert_node(node, &ctx)?;
        }
        Ok(())
    }

    fn convert_node(&mut self, node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<(), ImportError> {
        let inputs = node
            .inputs
            .iter()
            .map(|name| {
                self.bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ImportError::UnresolvedInput {
                        node: node.name.clone(),
                        op_type: node.op_type.clone(),
                        name: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let handler = self.registry.dispatch(&node.op_type)?;
        let output = handler.convert(&inputs, node, ctx)?;
        if output.len() != node.outputs.len() {
            return Err(ImportError::OutputArityMismatch {
                node: node.name.clone(),
                op_type: node.op_type.clone(),
                expected: node.outputs.len(),
                actual: output.len(),
            });
        }

        for (name, value) in node.outputs.iter().zip(output.into_values()) {
            self.bindings.bind(name.as_str(), value)?;
        }
        tracing::trace!(node = %node.name, op_type = %node.op_type, "converted node");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::select_entry_point;
    use crate::registry::OpOutput;
    use nnp_model::{DataVariable, Executor, Network, NnpModel, OutputVariable, Parameter, Variable};
    use std::collections::BTreeMap;
    use tensor_core::DType;

    fn model(functions: Vec<FunctionNode>) -> NnpModel {
        let mut net = Network::new("main");
        net.variables = vec![
            Variable::new("x", vec![-1, 4]),
            Variable::parameter("w", vec![4]),
            Variable::new("h", vec![-1, 4]),
            Variable::new("y", vec![-1, 4]),
        ];
        net.functions = functions;
        let mut exec = Executor::new("runtime", "main");
        exec.data_variables = vec![DataVariable::new("x")];
        exec.output_variables = vec![OutputVariable::new("y")];
        NnpModel {
            networks: vec![net],
            parameters: vec![Parameter::new("w", vec![4], vec![1.0; 4])],
            executors: vec![exec],
        }
    }

    fn export_with(
        model: &NnpModel,
        registry: &OperatorRegistry,
        config: &ImportConfig,
    ) -> Result<Bindings, ImportError> {
        let graph = select_entry_point(model)?.assemble(2, &BTreeMap::new())?;
        Exporter::new(&graph, registry, config).export()
    }

    fn export(model: &NnpModel) -> Result<Bindings, ImportError> {
        export_with(model, &OperatorRegistry::with_builtins(), &ImportConfig::default())
    }

    #[test]
    fn test_binds_params_inputs_and_outputs() {
        let m = model(vec![
            FunctionNode::new("add", "Add2", ["x", "w"], ["h"]),
            FunctionNode::new("act", "ReLU", ["h"], ["y"]),
        ]);
        let b = export(&m).unwrap();
        let names: Vec<&str> = b.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["w", "x", "h", "y"]);
        assert_eq!(b.get("x").unwrap().as_var().unwrap().ty().shape.dims(), &[2, 4]);
        assert!(b.get("w").unwrap().as_constant().is_some());
    }

    #[test]
    fn test_unbound_input() {
        let m = model(vec![FunctionNode::new("act", "ReLU", ["missing"], ["y"])]);
        assert!(matches!(
            export(&m),
            Err(ImportError::UnresolvedInput { ref name, ref node, .. }) if name == "missing" && node == "act"
        ));
    }

    #[test]
    fn test_unsupported_checked_before_conversion() {
        let m = model(vec![
            FunctionNode::new("a", "Foo", ["missing"], ["h"]),
            FunctionNode::new("b", "Bar", ["h"], ["y"]),
        ]);
        match export(&m) {
            Err(ImportError::UnsupportedOperator { op_types }) => assert_eq!(op_types, vec!["Bar", "Foo"]),
            other => panic!("unexpected: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let m = model(vec![FunctionNode::new("act", "ReLU", ["x"], ["h", "y"])]);
        assert!(matches!(
            export(&m),
            Err(ImportError::OutputArityMismatch { expected: 2, actual: 1, ref op_type, .. }) if op_type == "ReLU"
        ));
    }

    #[test]
    fn test_output_shadowing_input_is_duplicate() {
        let m = model(vec![FunctionNode::new("act", "ReLU", ["x"], ["w"])]);
        assert!(matches!(
            export(&m),
            Err(ImportError::DuplicateBinding { ref name }) if name == "w"
        ));
    }

    #[test]
    fn test_missing_input_shape() {
        let mut m = model(vec![FunctionNode::new("act", "ReLU", ["x"], ["y"])]);
        m.executors[0].data_variables.push(DataVariable::new("ghost"));
        assert!(matches!(
            export(&m),
            Err(ImportError::MissingInputShape { ref name }) if name == "ghost"
        ));
    }

    #[test]
    fn test_input_dtype_from_config() {
        let m = model(vec![FunctionNode::new("act", "ReLU", ["x"], ["y"])]);
        let config = ImportConfig::default()
            .with_dtype(crate::config::DTypeSpec::Uniform("float16".into()));
        let b = export_with(&m, &OperatorRegistry::with_builtins(), &config).unwrap();
        assert_eq!(b.get("x").unwrap().as_var().unwrap().ty().dtype, DType::Float16);
    }

    #[test]
    fn test_custom_handler() {
        let mut registry = OperatorRegistry::new();
        registry
            .register(
                "Double",
                |inputs: &[Expr],
                 _node: &FunctionNode,
                 _ctx: &ConvertContext<'_>|
                 -> Result<OpOutput, ImportError> {
                    Ok(OpOutput::Single(dataflow_ir::op::add(
                        inputs[0].clone(),
                        inputs[0].clone(),
                    )))
                },
            )
            .unwrap();
        let m = model(vec![FunctionNode::new("d", "Double", ["x"], ["y"])]);
        let b = export_with(&m, &registry, &ImportConfig::default()).unwrap();
        assert_eq!(b.get("y").unwrap().as_call().unwrap().op().name(), "add");
    }
}

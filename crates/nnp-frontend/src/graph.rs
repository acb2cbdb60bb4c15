// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph assembly: from a decoded model to an indexed, shape-resolved graph.
//!
//! # Type-State Pattern
//!
//! ```text
//! NnpGraph<Selected>  : executor and network chosen, nothing resolved.
//!       │  .assemble(batch_size, shape_overrides)
//!       ▼
//! NnpGraph<Assembled> : shapes resolved, parameters materialised,
//!                        inputs/outputs classified, nodes indexed.
//! ```
//!
//! The exporter only accepts an assembled graph. The graph owns copies of
//! the selected network's variables and nodes and of its parameter tensors,
//! so it stays valid independently of the model it was built from.

use crate::shape::{resolve_batch_size, resolve_shape};
use crate::ImportError;
use nnp_model::{Executor, FunctionNode, Network, NnpModel, Parameter, Variable, VariableKind};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: entry point selected.
#[derive(Debug, Clone)]
pub struct Selected;

/// Marker: graph fully assembled and ready for conversion.
#[derive(Debug, Clone)]
pub struct Assembled;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Selected {}
impl GraphState for Assembled {}

// ── NnpGraph ───────────────────────────────────────────────────────

/// The network reachable from the model's single executor.
#[derive(Debug, Clone)]
pub struct NnpGraph<S: GraphState = Selected> {
    network: Network,
    executor: Executor,
    /// Global parameters as found in the model; filtered during assembly.
    raw_parameters: Vec<Parameter>,
    batch_size: usize,
    shapes: HashMap<String, Shape>,
    params: BTreeMap<String, Arc<Tensor>>,
    node_index: HashMap<String, usize>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    _state: std::marker::PhantomData<S>,
}

impl<S: GraphState> NnpGraph<S> {
    pub fn network_name(&self) -> &str {
        &self.network.name
    }

    pub fn executor_name(&self) -> &str {
        &self.executor.name
    }

    /// Declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.network.variable(name)
    }

    /// Function nodes in declaration order.
    pub fn nodes(&self) -> &[FunctionNode] {
        &self.network.functions
    }
}

// ── Selected state ─────────────────────────────────────────────────

/// Picks the model's only executor and the network it runs.
///
/// # Errors
/// - [`ImportError::MultipleEntryPointsUnsupported`] unless exactly one
///   executor is declared.
/// - [`ImportError::NetworkNotFound`] if the executor names a missing network.
pub fn select_entry_point(model: &NnpModel) -> Result<NnpGraph<Selected>, ImportError> {
    let executor = match model.executors.as_slice() {
        [executor] => executor,
        executors => {
            return Err(ImportError::MultipleEntryPointsUnsupported {
                count: executors.len(),
            })
        }
    };
    let network = model
        .network(&executor.network_name)
        .ok_or_else(|| ImportError::NetworkNotFound {
            executor: executor.name.clone(),
            network: executor.network_name.clone(),
        })?;

    tracing::debug!(
        executor = %executor.name,
        network = %network.name,
        variables = network.variables.len(),
        functions = network.functions.len(),
        "selected entry point"
    );

    Ok(NnpGraph {
        network: network.clone(),
        executor: executor.clone(),
        raw_parameters: model.parameters.clone(),
        batch_size: 0,
        shapes: HashMap::new(),
        params: BTreeMap::new(),
        node_index: HashMap::new(),
        inputs: Vec::new(),
        outputs: Vec::new(),
        _state: std::marker::PhantomData,
    })
}

impl NnpGraph<Selected> {
    /// Declared default batch size of the selected network.
    pub fn declared_batch_size(&self) -> Option<i64> {
        self.network.batch_size
    }

    /// Resolves shapes, materialises parameters, classifies variables and
    /// indexes nodes, then transitions to the `Assembled` state.
    ///
    /// `batch_size` follows [`resolve_batch_size`]: negative defers to the
    /// network's declared default. `shape_overrides` replace the declared
    /// shape of the named variables.
    pub fn assemble(
        mut self,
        batch_size: i64,
        shape_overrides: &BTreeMap<String, Vec<i64>>,
    ) -> Result<NnpGraph<Assembled>, ImportError> {
        self.batch_size = resolve_batch_size(batch_size, self.network.batch_size)?;
        self.resolve_shapes(shape_overrides)?;
        self.classify_variables();
        self.index_nodes()?;

        tracing::debug!(
            network = %self.network.name,
            batch_size = self.batch_size,
            parameters = self.params.len(),
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            nodes = self.node_index.len(),
            "assembled graph"
        );

        Ok(NnpGraph {
            network: self.network,
            executor: self.executor,
            raw_parameters: Vec::new(),
            batch_size: self.batch_size,
            shapes: self.shapes,
            params: self.params,
            node_index: self.node_index,
            inputs: self.inputs,
            outputs: self.outputs,
            _state: std::marker::PhantomData,
        })
    }

    fn resolve_shapes(
        &mut self,
        shape_overrides: &BTreeMap<String, Vec<i64>>,
    ) -> Result<(), ImportError> {
        let batch = self.batch_size as i64;

        for var in &self.network.variables {
            if self.shapes.contains_key(&var.name) {
                return Err(ImportError::MalformedGraph(format!(
                    "variable '{}' is declared more than once",
                    var.name
                )));
            }
            let raw = shape_overrides.get(&var.name).unwrap_or(&var.shape);
            let shape = resolve_shape(raw, batch)?;
            self.shapes.insert(var.name.clone(), shape);
        }
        for (name, raw) in shape_overrides {
            if !self.shapes.contains_key(name) {
                tracing::debug!(variable = %name, "shape given for an undeclared variable");
                self.shapes.insert(name.clone(), resolve_shape(raw, batch)?);
            }
        }

        for param in std::mem::take(&mut self.raw_parameters) {
            if self.network.variable(&param.variable_name).is_none() {
                tracing::debug!(
                    parameter = %param.variable_name,
                    network = %self.network.name,
                    "skipping parameter not used by the network"
                );
                continue;
            }
            if self.params.contains_key(&param.variable_name) {
                return Err(ImportError::MalformedGraph(format!(
                    "parameter '{}' is stored more than once",
                    param.variable_name
                )));
            }
            let tensor = Shape::from_signed(&param.shape)
                .and_then(|shape| Tensor::from_f32(shape, param.data))
                .map_err(|e| {
                    ImportError::MalformedGraph(format!(
                        "parameter '{}': {e}",
                        param.variable_name
                    ))
                })?;
            if let Some(declared) = self.shapes.get(&param.variable_name) {
                if declared != tensor.shape() {
                    return Err(ImportError::MalformedGraph(format!(
                        "parameter '{}' is stored as {} but declared as {declared}",
                        param.variable_name,
                        tensor.shape()
                    )));
                }
            }
            self.params.insert(param.variable_name, Arc::new(tensor));
        }

        let declared_params = self
            .network
            .variables
            .iter()
            .filter(|var| var.kind == VariableKind::Parameter)
            .map(|var| var.name.as_str());
        let mut seen = HashSet::new();
        for name in declared_params.chain(self.executor.parameter_names()) {
            if seen.insert(name) && !self.params.contains_key(name) {
                tracing::warn!(variable = %name, "parameter variable has no stored data");
            }
        }
        Ok(())
    }

    fn classify_variables(&mut self) {
        let mut seen = HashSet::new();
        self.inputs = self
            .executor
            .data_names()
            .chain(self.executor.generator_names())
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect();
        self.outputs = self.executor.output_names().map(str::to_string).collect();

        for name in self.inputs.iter().filter(|n| self.params.contains_key(*n)) {
            tracing::debug!(variable = %name, "input is also a parameter, binding it as a constant");
        }
    }

    fn index_nodes(&mut self) -> Result<(), ImportError> {
        for (i, node) in self.network.functions.iter().enumerate() {
            if self.node_index.insert(node.name.clone(), i).is_some() {
                return Err(ImportError::MalformedGraph(format!(
                    "function '{}' is declared more than once",
                    node.name
                )));
            }
        }
        Ok(())
    }
}

// ── Assembled state ────────────────────────────────────────────────

impl NnpGraph<Assembled> {
    /// The concrete batch size used for every placeholder dimension.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolved shape of a variable.
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    /// Parameter tensors keyed by variable name.
    pub fn params(&self) -> &BTreeMap<String, Arc<Tensor>> {
        &self.params
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Declared inputs: data variables then generator variables.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Declared inputs that are not parameters, in input order.
    pub fn runtime_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(String::as_str)
            .filter(|name| !self.params.contains_key(*name))
    }

    /// Declared outputs in executor order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Function node by its own name.
    pub fn node(&self, name: &str) -> Option<&FunctionNode> {
        self.node_index
            .get(name)
            .and_then(|&i| self.network.functions.get(i))
    }

    /// Distinct operator types used by the network, sorted.
    pub fn op_types(&self) -> BTreeSet<&str> {
        self.network
            .functions
            .iter()
            .map(|f| f.op_type.as_str())
            .collect()
    }

    /// Nodes ordered so that every producer precedes its consumers.
    ///
    /// Kahn's algorithm; among ready nodes the earliest declared goes first,
    /// so an already sorted network keeps its order.
    ///
    /// # Errors
    /// - [`ImportError::DuplicateBinding`] if two nodes produce the same name.
    /// - [`ImportError::MalformedGraph`] if the nodes form a cycle.
    pub fn topological_order(&self) -> Result<Vec<&FunctionNode>, ImportError> {
        let nodes = &self.network.functions;

        let mut producer: HashMap<&str, usize> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            for out in &node.outputs {
                if producer.insert(out.as_str(), i).is_some() {
                    return Err(ImportError::DuplicateBinding { name: out.clone() });
                }
            }
        }

        let mut in_degree = vec![0usize; nodes.len()];
        let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for input in &node.inputs {
                if let Some(&p) = producer.get(input.as_str()) {
                    consumers[p].push(i);
                    in_degree[i] += 1;
                }
            }
        }

        let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(i) = ready.pop_first() {
            order.push(&nodes[i]);
            for &c in &consumers[i] {
                in_degree[c] -= 1;
                if in_degree[c] == 0 {
                    ready.insert(c);
                }
            }
        }

        if order.len() != nodes.len() {
            let stuck: Vec<&str> = nodes
                .iter()
                .zip(&in_degree)
                .filter(|(_, &d)| d > 0)
                .map(|(n, _)| n.name.as_str())
                .collect();
            return Err(ImportError::MalformedGraph(format!(
                "cycle detected among functions: {}",
                stuck.join(", ")
            )));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nnp_model::{DataVariable, OutputVariable};

    fn add_model() -> NnpModel {
        let mut net = Network::new("main");
        net.variables = vec![
            Variable::new("x", vec![-1, 3, 32, 32]),
            Variable::parameter("w", vec![1, 3, 32, 32]),
            Variable::new("y", vec![-1, 3, 32, 32]),
        ];
        net.functions = vec![FunctionNode::new("add", "Add2", ["x", "w"], ["y"])];

        let mut exec = Executor::new("runtime", "main");
        exec.data_variables = vec![DataVariable::new("x")];
        exec.output_variables = vec![OutputVariable::new("y")];

        NnpModel {
            networks: vec![net],
            parameters: vec![Parameter::new("w", vec![1, 3, 32, 32], vec![0.5; 3 * 32 * 32])],
            executors: vec![exec],
        }
    }

    fn chain(order: &[(&str, &str, &str)]) -> NnpGraph<Assembled> {
        let mut model = add_model();
        let net = &mut model.networks[0];
        net.variables = ["x", "a", "b", "c"]
            .iter()
            .map(|n| Variable::new(*n, vec![2]))
            .collect();
        net.functions = order
            .iter()
            .map(|(name, i, o)| FunctionNode::new(*name, "ReLU", [*i], [*o]))
            .collect();
        model.parameters.clear();
        select_entry_point(&model)
            .unwrap()
            .assemble(1, &BTreeMap::new())
            .unwrap()
    }

    #[test]
    fn test_select_single_executor() {
        let graph = select_entry_point(&add_model()).unwrap();
        assert_eq!(graph.network_name(), "main");
        assert_eq!(graph.executor_name(), "runtime");
    }

    #[test]
    fn test_zero_or_many_executors_rejected() {
        let mut model = add_model();
        let exec = model.executors[0].clone();
        model.executors.push(exec);
        assert!(matches!(
            select_entry_point(&model),
            Err(ImportError::MultipleEntryPointsUnsupported { count: 2 })
        ));
        model.executors.clear();
        assert!(matches!(
            select_entry_point(&model),
            Err(ImportError::MultipleEntryPointsUnsupported { count: 0 })
        ));
    }

    #[test]
    fn test_missing_network() {
        let mut model = add_model();
        model.executors[0].network_name = "other".into();
        let err = select_entry_point(&model).unwrap_err();
        assert!(matches!(err, ImportError::NetworkNotFound { ref network, .. } if network == "other"));
    }

    #[test]
    fn test_assemble_resolves_shapes_and_params() {
        let graph = select_entry_point(&add_model())
            .unwrap()
            .assemble(4, &BTreeMap::new())
            .unwrap();
        assert_eq!(graph.batch_size(), 4);
        assert_eq!(graph.shape("x").unwrap().dims(), &[4, 3, 32, 32]);
        assert_eq!(graph.shape("w").unwrap().dims(), &[1, 3, 32, 32]);
        assert!(graph.is_parameter("w"));
        assert_eq!(graph.params()["w"].shape().dims(), &[1, 3, 32, 32]);
        assert_eq!(graph.inputs(), &["x".to_string()]);
        assert_eq!(graph.outputs(), &["y".to_string()]);
        assert_eq!(graph.node("add").unwrap().op_type, "Add2");
    }

    #[test]
    fn test_declared_batch_size_used() {
        let mut model = add_model();
        model.networks[0].batch_size = Some(16);
        let graph = select_entry_point(&model)
            .unwrap()
            .assemble(-1, &BTreeMap::new())
            .unwrap();
        assert_eq!(graph.shape("x").unwrap().dims()[0], 16);
    }

    #[test]
    fn test_missing_batch_size_rejected() {
        let selected = select_entry_point(&add_model()).unwrap();
        assert!(matches!(
            selected.clone().assemble(-1, &BTreeMap::new()),
            Err(ImportError::InvalidBatchSize { batch_size: -1 })
        ));
        assert!(matches!(
            selected.assemble(0, &BTreeMap::new()),
            Err(ImportError::InvalidBatchSize { batch_size: 0 })
        ));
    }

    #[test]
    fn test_shape_override_replaces_declared() {
        let mut overrides = BTreeMap::new();
        overrides.insert("x".to_string(), vec![-1, 3, 16, 16]);
        overrides.insert("extra".to_string(), vec![7]);
        let graph = select_entry_point(&add_model())
            .unwrap()
            .assemble(2, &overrides)
            .unwrap();
        assert_eq!(graph.shape("x").unwrap().dims(), &[2, 3, 16, 16]);
        assert_eq!(graph.shape("extra").unwrap().dims(), &[7]);
    }

    #[test]
    fn test_foreign_parameters_skipped() {
        let mut model = add_model();
        model
            .parameters
            .push(Parameter::new("unused", vec![2], vec![1.0, 2.0]));
        let graph = select_entry_point(&model)
            .unwrap()
            .assemble(1, &BTreeMap::new())
            .unwrap();
        assert_eq!(graph.params().len(), 1);
        assert!(!graph.is_parameter("unused"));
    }

    #[test]
    fn test_bad_parameter_data_is_malformed() {
        let mut model = add_model();
        model.parameters[0].data.truncate(3);
        assert!(matches!(
            select_entry_point(&model).unwrap().assemble(1, &BTreeMap::new()),
            Err(ImportError::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_parameter_shape_must_match_declaration() {
        let mut model = add_model();
        model.parameters[0] = Parameter::new("w", vec![1, 3, 16, 16], vec![0.5; 3 * 16 * 16]);
        let err = select_entry_point(&model)
            .unwrap()
            .assemble(1, &BTreeMap::new())
            .unwrap_err();
        match err {
            ImportError::MalformedGraph(msg) => {
                assert!(msg.contains("'w'"), "{msg}");
                assert!(msg.contains("(1, 3, 16, 16)"), "{msg}");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_runtime_inputs_exclude_parameters() {
        let mut model = add_model();
        model.executors[0].data_variables.push(DataVariable::new("w"));
        model.executors[0].data_variables.push(DataVariable::new("x"));
        let graph = select_entry_point(&model)
            .unwrap()
            .assemble(1, &BTreeMap::new())
            .unwrap();
        assert_eq!(graph.inputs().len(), 2);
        assert_eq!(graph.runtime_inputs().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_duplicate_names_malformed() {
        let mut model = add_model();
        let v = model.networks[0].variables[0].clone();
        model.networks[0].variables.push(v);
        assert!(matches!(
            select_entry_point(&model).unwrap().assemble(1, &BTreeMap::new()),
            Err(ImportError::MalformedGraph(_))
        ));

        let mut model = add_model();
        let f = model.networks[0].functions[0].clone();
        model.networks[0].functions.push(f);
        assert!(matches!(
            select_entry_point(&model).unwrap().assemble(1, &BTreeMap::new()),
            Err(ImportError::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_topological_order_reorders_reversed_chain() {
        let graph = chain(&[("C", "b", "c"), ("B", "a", "b"), ("A", "x", "a")]);
        let names: Vec<&str> = graph
            .topological_order()
            .unwrap()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_topological_order_keeps_sorted_order() {
        let graph = chain(&[("A", "x", "a"), ("B", "x", "b"), ("C", "x", "c")]);
        let names: Vec<&str> = graph
            .topological_order()
            .unwrap()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_cycle_is_malformed() {
        let graph = chain(&[("A", "c", "a"), ("B", "a", "b"), ("C", "b", "c")]);
        let err = graph.topological_order().unwrap_err();
        assert!(matches!(err, ImportError::MalformedGraph(ref m) if m.contains("cycle")));
    }

    #[test]
    fn test_two_producers_of_one_name() {
        let graph = chain(&[("A", "x", "a"), ("B", "x", "a")]);
        assert!(matches!(
            graph.topological_order(),
            Err(ImportError::DuplicateBinding { ref name }) if name == "a"
        ));
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Built-in operator handlers and the attribute helpers they share.
//!
//! Attribute bags are read only here: each handler pulls the keys it knows
//! with a default, and a value of the wrong kind is a conversion error
//! naming the node.

pub mod activation;
pub mod arithmetic;
pub mod constant;
pub mod conv;
pub mod linear;
pub mod normalization;
pub mod pooling;
pub mod shape_ops;

use crate::registry::{ConvertContext, OpConverter, OpOutput};
use crate::ImportError;
use dataflow_ir::Expr;
use nnp_model::{AttrValue, FunctionNode};
use std::fmt;
use tensor_core::Shape;

/// Signature shared by every built-in handler.
pub(crate) type Handler =
    fn(&[Expr], &FunctionNode, &ConvertContext<'_>) -> Result<OpOutput, ImportError>;

const BUILTINS: &[(&str, Handler)] = &[
    ("Constant", constant::convert),
    ("Identity", shape_ops::identity),
    // activations
    ("ReLU", activation::relu),
    ("ReLU6", activation::relu6),
    ("Sigmoid", activation::sigmoid),
    ("Tanh", activation::tanh),
    ("LeakyReLU", activation::leaky_relu),
    ("PReLU", activation::prelu),
    ("ELU", activation::elu),
    ("Softmax", activation::softmax),
    // linear and convolution
    ("Affine", linear::affine),
    ("Convolution", conv::convolution),
    ("DepthwiseConvolution", conv::depthwise_convolution),
    ("Deconvolution", conv::deconvolution),
    // pooling
    ("MaxPooling", pooling::max_pooling),
    ("AveragePooling", pooling::average_pooling),
    ("GlobalAveragePooling", pooling::global_average_pooling),
    ("BatchNormalization", normalization::batch_normalization),
    // arithmetic
    ("Add2", arithmetic::add2),
    ("Sub2", arithmetic::sub2),
    ("Mul2", arithmetic::mul2),
    ("Div2", arithmetic::div2),
    ("Pow2", arithmetic::pow2),
    ("AddScalar", arithmetic::add_scalar),
    ("MulScalar", arithmetic::mul_scalar),
    ("PowScalar", arithmetic::pow_scalar),
    // shape manipulation
    ("Reshape", shape_ops::reshape),
    ("Concatenate", shape_ops::concatenate),
    ("Transpose", shape_ops::transpose),
    ("Split", shape_ops::split),
];

/// Every built-in operator type with its handler.
pub(crate) fn builtin_handlers() -> Vec<(&'static str, Box<dyn OpConverter>)> {
    BUILTINS
        .iter()
        .map(|&(op_type, handler)| (op_type, Box::new(handler) as Box<dyn OpConverter>))
        .collect()
}

pub(crate) fn conversion_error(node: &FunctionNode, detail: impl fmt::Display) -> ImportError {
    ImportError::Conversion {
        node: node.name.clone(),
        op_type: node.op_type.clone(),
        detail: detail.to_string(),
    }
}

/// Checks the operand count is within `min..=max`.
pub(crate) fn operands<'a>(
    node: &FunctionNode,
    inputs: &'a [Expr],
    min: usize,
    max: usize,
) -> Result<&'a [Expr], ImportError> {
    if inputs.len() < min || inputs.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        return Err(conversion_error(
            node,
            format_args!("expected {expected} inputs, got {}", inputs.len()),
        ));
    }
    Ok(inputs)
}

fn wrong_kind(node: &FunctionNode, key: &str, wanted: &str, got: &AttrValue) -> ImportError {
    conversion_error(
        node,
        format_args!("attribute '{key}' must be {wanted}, got {}", got.kind()),
    )
}

pub(crate) fn attr_int(node: &FunctionNode, key: &str, default: i64) -> Result<i64, ImportError> {
    match node.attributes.get(key) {
        None => Ok(default),
        Some(v) => v.as_int().ok_or_else(|| wrong_kind(node, key, "an integer", v)),
    }
}

pub(crate) fn attr_float(node: &FunctionNode, key: &str, default: f64) -> Result<f64, ImportError> {
    match node.attributes.get(key) {
        None => Ok(default),
        Some(v) => v.as_float().ok_or_else(|| wrong_kind(node, key, "a number", v)),
    }
}

pub(crate) fn attr_bool(node: &FunctionNode, key: &str, default: bool) -> Result<bool, ImportError> {
    match node.attributes.get(key) {
        None => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| wrong_kind(node, key, "a boolean", v)),
    }
}

pub(crate) fn attr_ints(node: &FunctionNode, key: &str) -> Result<Option<Vec<i64>>, ImportError> {
    match node.attributes.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_ints()
            .map(Some)
            .ok_or_else(|| wrong_kind(node, key, "an integer list", v)),
    }
}

/// Resolved shape of the node's `index`-th input.
pub(crate) fn input_shape<'g>(
    node: &FunctionNode,
    ctx: &ConvertContext<'g>,
    index: usize,
) -> Result<&'g Shape, ImportError> {
    let name = node
        .inputs
        .get(index)
        .ok_or_else(|| conversion_error(node, format_args!("missing input #{index}")))?;
    ctx.shape(name)
        .ok_or_else(|| conversion_error(node, format_args!("shape of input '{name}' is unknown")))
}

/// Resolved shape of the node's `index`-th output, if declared.
pub(crate) fn output_shape<'g>(
    node: &FunctionNode,
    ctx: &ConvertContext<'g>,
    index: usize,
) -> Option<&'g Shape> {
    node.outputs.get(index).and_then(|name| ctx.shape(name))
}

/// Maps a possibly negative axis into `0..rank`.
pub(crate) fn normalize_axis(node: &FunctionNode, axis: i64, rank: usize) -> Result<i64, ImportError> {
    let rank = rank as i64;
    let normalized = if axis < 0 { axis + rank } else { axis };
    if !(0..rank).contains(&normalized) {
        return Err(conversion_error(
            node,
            format_args!("axis {axis} is out of range for rank {rank}"),
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Builds a one-node assembled graph so handlers can run in isolation.

    use super::Handler;
    use crate::graph::{select_entry_point, Assembled, NnpGraph};
    use crate::registry::{ConvertContext, OpOutput};
    use crate::ImportError;
    use dataflow_ir::{Expr, TensorType};
    use nnp_model::{Executor, FunctionNode, Network, NnpModel, Parameter, Variable};
    use std::collections::BTreeMap;
    use tensor_core::DType;

    pub(crate) struct Fixture {
        pub graph: NnpGraph<Assembled>,
        pub node: FunctionNode,
    }

    impl Fixture {
        /// `vars` are buffers, `params` are parameters filled with ones.
        pub fn new(node: FunctionNode, vars: &[(&str, &[i64])], params: &[(&str, &[i64])]) -> Self {
            let mut net = Network::new("net");
            net.batch_size = Some(1);
            for (name, shape) in vars {
                net.variables.push(Variable::new(*name, shape.to_vec()));
            }
            let mut parameters = Vec::new();
            for (name, shape) in params {
                net.variables.push(Variable::parameter(*name, shape.to_vec()));
                let len = shape.iter().product::<i64>() as usize;
                parameters.push(Parameter::new(*name, shape.to_vec(), vec![1.0; len]));
            }
            net.functions.push(node.clone());
            let model = NnpModel {
                networks: vec![net],
                parameters,
                executors: vec![Executor::new("exec", "net")],
            };
            let graph = select_entry_point(&model)
                .unwrap()
                .assemble(-1, &BTreeMap::new())
                .unwrap();
            Self { graph, node }
        }

        /// IR leaves for the node's inputs.
        pub fn inputs(&self) -> Vec<Expr> {
            self.node
                .inputs
                .iter()
                .map(|name| match self.graph.params().get(name) {
                    Some(t) => Expr::named_constant(name.clone(), t.clone()),
                    None => Expr::var(
                        name.clone(),
                        TensorType::new(self.graph.shape(name).unwrap().clone(), DType::Float32),
                    ),
                })
                .collect()
        }

        pub fn run(&self, handler: Handler) -> Result<OpOutput, ImportError> {
            handler(&self.inputs(), &self.node, &ConvertContext::new(&self.graph))
        }

        /// Runs the handler and expects exactly one value.
        pub fn single(&self, handler: Handler) -> Expr {
            match self.run(handler).unwrap() {
                OpOutput::Single(e) => e,
                OpOutput::Multi(v) => panic!("expected one value, got {}", v.len()),
            }
        }
    }
}

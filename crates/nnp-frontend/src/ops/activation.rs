// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise activations and softmax.

use super::{attr_float, attr_int, input_shape, normalize_axis, operands};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::{op, Expr};
use nnp_model::FunctionNode;

fn unary(
    inputs: &[Expr],
    node: &FunctionNode,
    build: impl FnOnce(Expr) -> Expr,
) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    Ok(build(x).into())
}

pub fn relu(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    unary(inputs, node, op::relu)
}

pub fn relu6(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    unary(inputs, node, |x| op::clip(x, 0.0, 6.0))
}

pub fn sigmoid(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    unary(inputs, node, op::sigmoid)
}

pub fn tanh(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    unary(inputs, node, op::tanh)
}

/// `alpha` defaults to 0.1.
pub fn leaky_relu(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let alpha = attr_float(node, "alpha", 0.1)?;
    unary(inputs, node, |x| op::leaky_relu(x, alpha))
}

/// Slope is the second input, broadcast along `base_axis` (default 1).
pub fn prelu(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 2, 2)?;
    let (x, slope) = (&inputs[0], &inputs[1]);
    let rank = input_shape(node, ctx, 0)?.rank();
    let axis = normalize_axis(node, attr_int(node, "base_axis", 1)?, rank)?;
    Ok(op::prelu(x.clone(), slope.clone(), axis).into())
}

/// `relu(x) - alpha * relu(1 - exp(x))`, `alpha` defaults to 1.0.
pub fn elu(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let alpha = attr_float(node, "alpha", 1.0)?;
    unary(inputs, node, |x| {
        let negative_part = op::relu(op::subtract(Expr::scalar(1.0), op::exp(x.clone())));
        op::subtract(
            op::relu(x),
            op::multiply(Expr::scalar(alpha as f32), negative_part),
        )
    })
}

/// `axis` defaults to the last axis.
pub fn softmax(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let rank = input_shape(node, ctx, 0)?.rank();
    let axis = attr_int(node, "axis", rank as i64 - 1)?;
    let axis = normalize_axis(node, axis, rank)?;
    unary(inputs, node, |x| op::softmax(x, axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::Fixture;
    use dataflow_ir::AttrValue;
    use nnp_model::{AttrValue as NnpAttr, Attributes};

    fn unary_fixture(op_type: &str, attrs: Attributes) -> Fixture {
        let node = FunctionNode::new("act", op_type, ["x"], ["y"]).with_attributes(attrs);
        Fixture::new(node, &[("x", &[2, 8]), ("y", &[2, 8])], &[])
    }

    #[test]
    fn test_relu() {
        let f = unary_fixture("ReLU", Attributes::new());
        let out = f.single(relu);
        assert_eq!(out.as_call().unwrap().op().name(), "nn.relu");
    }

    #[test]
    fn test_relu6_clips() {
        let f = unary_fixture("ReLU6", Attributes::new());
        let out = f.single(relu6);
        let call = out.as_call().unwrap();
        assert_eq!(call.op().name(), "clip");
        assert_eq!(call.attrs().get("a_max"), Some(&AttrValue::Float(6.0)));
    }

    #[test]
    fn test_leaky_relu_alpha() {
        let f = unary_fixture("LeakyReLU", Attributes::new());
        let out = f.single(leaky_relu);
        assert_eq!(out.as_call().unwrap().attrs().get("alpha"), Some(&AttrValue::Float(0.1)));

        let f = unary_fixture("LeakyReLU", Attributes::new().with("alpha", NnpAttr::Float(0.3)));
        let out = f.single(leaky_relu);
        assert_eq!(out.as_call().unwrap().attrs().get("alpha"), Some(&AttrValue::Float(0.3)));
    }

    #[test]
    fn test_prelu_axis() {
        let node = FunctionNode::new("p", "PReLU", ["x", "slope"], ["y"]);
        let f = Fixture::new(node, &[("x", &[1, 4, 6, 6]), ("y", &[1, 4, 6, 6])], &[("slope", &[4])]);
        let out = f.single(prelu);
        let call = out.as_call().unwrap();
        assert_eq!(call.op().name(), "nn.prelu");
        assert_eq!(call.attrs().get("axis"), Some(&AttrValue::Int(1)));
        assert_eq!(call.args()[1].as_constant().unwrap().name(), Some("slope"));
    }

    #[test]
    fn test_elu_decomposition() {
        let f = unary_fixture("ELU", Attributes::new());
        let out = f.single(elu);
        let call = out.as_call().unwrap();
        assert_eq!(call.op().name(), "subtract");
        assert_eq!(call.args()[0].as_call().unwrap().op().name(), "nn.relu");
        assert_eq!(call.args()[1].as_call().unwrap().op().name(), "multiply");
    }

    #[test]
    fn test_softmax_default_axis_is_last() {
        let f = unary_fixture("Softmax", Attributes::new());
        let out = f.single(softmax);
        assert_eq!(out.as_call().unwrap().attrs().get("axis"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn test_wrong_operand_count() {
        let node = FunctionNode::new("act", "ReLU", ["x", "x"], ["y"]);
        let f = Fixture::new(node, &[("x", &[2]), ("y", &[2])], &[]);
        assert!(matches!(f.run(relu), Err(ImportError::Conversion { .. })));
    }
}

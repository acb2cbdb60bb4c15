// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Broadcasting binary arithmetic and the `*Scalar` variants.

use super::{attr_float, operands};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::{op, Expr};
use nnp_model::FunctionNode;

fn binary(
    inputs: &[Expr],
    node: &FunctionNode,
    build: fn(Expr, Expr) -> Expr,
) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 2, 2)?;
    Ok(build(inputs[0].clone(), inputs[1].clone()).into())
}

/// `x <op> val`, with `val` read from the attribute bag (default 1.0).
fn with_scalar(
    inputs: &[Expr],
    node: &FunctionNode,
    build: fn(Expr, Expr) -> Expr,
) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let val = attr_float(node, "val", 1.0)?;
    Ok(build(x, Expr::scalar(val as f32)).into())
}

pub fn add2(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    binary(inputs, node, op::add)
}

pub fn sub2(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    binary(inputs, node, op::subtract)
}

pub fn mul2(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    binary(inputs, node, op::multiply)
}

pub fn div2(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    binary(inputs, node, op::divide)
}

pub fn pow2(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    binary(inputs, node, op::power)
}

pub fn add_scalar(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    with_scalar(inputs, node, op::add)
}

pub fn mul_scalar(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    with_scalar(inputs, node, op::multiply)
}

pub fn pow_scalar(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    with_scalar(inputs, node, op::power)
}

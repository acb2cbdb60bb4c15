// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Batch normalization.

use super::{attr_float, attr_ints, conversion_error, input_shape, normalize_axis, operands};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::{op, Expr};
use nnp_model::FunctionNode;

/// Inputs are `x, beta, gamma, mean, variance`; `axes` holds the single
/// channel axis (default `[1]`), `eps` defaults to 1e-5.
///
/// A node with one output yields the normalized tensor; a node with three
/// yields it followed by the batch mean and variance.
pub fn batch_normalization(
    inputs: &[Expr],
    node: &FunctionNode,
    ctx: &ConvertContext<'_>,
) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 5, 5)?;
    let rank = input_shape(node, ctx, 0)?.rank();
    let axes = attr_ints(node, "axes")?.unwrap_or_else(|| vec![1]);
    let axis = match axes.as_slice() {
        [axis] => normalize_axis(node, *axis, rank)?,
        _ => {
            return Err(conversion_error(
                node,
                format_args!("exactly one normalization axis is supported, got {axes:?}"),
            ))
        }
    };
    let epsilon = attr_float(node, "eps", 1e-5)?;

    let (x, beta, gamma, mean, variance) = (
        inputs[0].clone(),
        inputs[1].clone(),
        inputs[2].clone(),
        inputs[3].clone(),
        inputs[4].clone(),
    );
    let bn = op::batch_norm(x, gamma, beta, mean, variance, axis, epsilon);

    if node.outputs.len() == 1 {
        return Ok(Expr::tuple_get_item(bn, 0).into());
    }
    Ok(OpOutput::Multi(
        (0..3).map(|i| Expr::tuple_get_item(bn.clone(), i)).collect(),
    ))
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Max, average and global average pooling.

use super::{attr_bool, attr_ints, conversion_error, input_shape, operands};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::op::{self, PoolAttrs, Spatial};
use dataflow_ir::Expr;
use nnp_model::FunctionNode;

/// Reads `kernel`, `stride` (defaults to the kernel), `pad`,
/// `ignore_border` and `channel_last`.
fn pool_attrs(node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<(Spatial, PoolAttrs), ImportError> {
    let kernel = attr_ints(node, "kernel")?
        .ok_or_else(|| conversion_error(node, "missing 'kernel' attribute"))?;
    let spatial = Spatial::from_rank(kernel.len()).ok_or_else(|| {
        conversion_error(
            node,
            format_args!("{}-D pooling is not supported", kernel.len()),
        )
    })?;
    let x_shape = input_shape(node, ctx, 0)?;
    if x_shape.rank() != spatial.rank() + 2 {
        return Err(conversion_error(
            node,
            format_args!("input {x_shape} does not match a {}-D kernel", kernel.len()),
        ));
    }

    let strides = attr_ints(node, "stride")?.unwrap_or_else(|| kernel.clone());
    let pad = attr_ints(node, "pad")?.unwrap_or_else(|| vec![0; kernel.len()]);
    if strides.len() != kernel.len() || pad.len() != kernel.len() {
        return Err(conversion_error(
            node,
            "'stride' and 'pad' must have one entry per kernel axis",
        ));
    }
    let ignore_border = attr_bool(node, "ignore_border", true)?;
    let channel_last = attr_bool(node, "channel_last", false)?;

    let attrs = PoolAttrs {
        padding: pad.iter().chain(&pad).copied().collect(),
        pool_size: kernel,
        strides,
        layout: spatial.layouts(channel_last).0,
        ceil_mode: !ignore_border,
    };
    Ok((spatial, attrs))
}

pub fn max_pooling(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let (spatial, attrs) = pool_attrs(node, ctx)?;
    Ok(op::max_pool(spatial, x, attrs).into())
}

/// `including_pad` (default true) counts padded cells in the average.
pub fn average_pooling(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let (spatial, attrs) = pool_attrs(node, ctx)?;
    let including_pad = attr_bool(node, "including_pad", true)?;
    Ok(op::avg_pool(spatial, x, attrs, including_pad).into())
}

pub fn global_average_pooling(
    inputs: &[Expr],
    node: &FunctionNode,
    ctx: &ConvertContext<'_>,
) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let x_shape = input_shape(node, ctx, 0)?;
    if x_shape.rank() != 4 {
        return Err(conversion_error(
            node,
            format_args!("global pooling needs a 4-D input, got {x_shape}"),
        ));
    }
    Ok(op::global_avg_pool2d(x, "NCHW").into())
}

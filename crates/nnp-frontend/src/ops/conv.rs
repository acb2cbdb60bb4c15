// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Convolution family: `Convolution`, `DepthwiseConvolution`, `Deconvolution`.
//!
//! NNP stores one pad value per spatial axis and pads symmetrically; the IR
//! takes leading pads followed by trailing pads.

use super::{attr_bool, attr_int, attr_ints, conversion_error, input_shape, operands};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::op::{self, ConvAttrs, Spatial};
use dataflow_ir::Expr;
use nnp_model::FunctionNode;
use tensor_core::Shape;

/// Per-axis attribute with a fill default; the length must match the
/// number of spatial axes.
fn spatial_attr(node: &FunctionNode, key: &str, rank: usize, fill: i64) -> Result<Vec<i64>, ImportError> {
    match attr_ints(node, key)? {
        None => Ok(vec![fill; rank]),
        Some(values) if values.len() == rank => Ok(values),
        Some(values) => Err(conversion_error(
            node,
            format_args!("'{key}' has {} entries, expected {rank}", values.len()),
        )),
    }
}

struct Geometry {
    strides: Vec<i64>,
    padding: Vec<i64>,
    dilation: Vec<i64>,
}

fn geometry(node: &FunctionNode, spatial: Spatial) -> Result<Geometry, ImportError> {
    let rank = spatial.rank();
    let pad = spatial_attr(node, "pad", rank, 0)?;
    Ok(Geometry {
        strides: spatial_attr(node, "stride", rank, 1)?,
        padding: pad.iter().chain(&pad).copied().collect(),
        dilation: spatial_attr(node, "dilation", rank, 1)?,
    })
}

fn spatial_of(node: &FunctionNode, kernel_rank: usize) -> Result<Spatial, ImportError> {
    Spatial::from_rank(kernel_rank).ok_or_else(|| {
        conversion_error(
            node,
            format_args!("{kernel_rank}-D kernels are not supported"),
        )
    })
}

fn require_base_axis_one(node: &FunctionNode) -> Result<(), ImportError> {
    match attr_int(node, "base_axis", 1)? {
        1 => Ok(()),
        other => Err(conversion_error(
            node,
            format_args!("base_axis {other} is not supported, only 1"),
        )),
    }
}

fn dims_i64(shape: &Shape, range: std::ops::Range<usize>) -> Vec<i64> {
    shape.dims()[range].iter().map(|&d| d as i64).collect()
}

fn with_bias(out: Expr, inputs: &[Expr], channel_axis: i64) -> Expr {
    match inputs.get(2) {
        Some(bias) => op::bias_add(out, bias.clone(), channel_axis),
        None => out,
    }
}

/// `pad`, `stride`, `dilation`, `group`, `channel_last`, `base_axis`.
pub fn convolution(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 2, 3)?;
    require_base_axis_one(node)?;
    let x_shape = input_shape(node, ctx, 0)?;
    let w_shape = input_shape(node, ctx, 1)?;
    if w_shape.rank() < 3 {
        return Err(conversion_error(node, format_args!("weight {w_shape} has no spatial axes")));
    }
    let spatial = spatial_of(node, w_shape.rank() - 2)?;
    if x_shape.rank() != spatial.rank() + 2 {
        return Err(conversion_error(
            node,
            format_args!("input {x_shape} does not match weight {w_shape}"),
        ));
    }

    let channel_last = attr_bool(node, "channel_last", false)?;
    let groups = attr_int(node, "group", 1)?;
    let Geometry { strides, padding, dilation } = geometry(node, spatial)?;
    let kernel_size = if channel_last {
        dims_i64(w_shape, 1..1 + spatial.rank())
    } else {
        dims_i64(w_shape, 2..w_shape.rank())
    };
    let (data_layout, kernel_layout) = spatial.layouts(channel_last);

    let attrs = ConvAttrs {
        strides,
        padding,
        dilation,
        groups,
        channels: w_shape.dims()[0] as i64,
        kernel_size,
        data_layout,
        kernel_layout,
    };
    let out = op::conv(spatial, inputs[0].clone(), inputs[1].clone(), attrs);
    let channel_axis = if channel_last { x_shape.rank() as i64 - 1 } else { 1 };
    Ok(with_bias(out, inputs, channel_axis).into())
}

/// Weight `(C * multiplier, k...)` becomes a grouped convolution with one
/// group per input channel.
pub fn depthwise_convolution(
    inputs: &[Expr],
    node: &FunctionNode,
    ctx: &ConvertContext<'_>,
) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 2, 3)?;
    require_base_axis_one(node)?;
    let x_shape = input_shape(node, ctx, 0)?;
    let w_shape = input_shape(node, ctx, 1)?;
    if w_shape.rank() < 2 {
        return Err(conversion_error(node, format_args!("weight {w_shape} has no spatial axes")));
    }
    let spatial = spatial_of(node, w_shape.rank() - 1)?;
    if x_shape.rank() != spatial.rank() + 2 {
        return Err(conversion_error(
            node,
            format_args!("input {x_shape} does not match weight {w_shape}"),
        ));
    }

    let in_channels = x_shape.dims()[1] as i64;
    let multiplier = attr_int(node, "multiplier", 1)?;
    let out_channels = in_channels * multiplier;
    if w_shape.dims()[0] as i64 != out_channels {
        return Err(conversion_error(
            node,
            format_args!("weight {w_shape} does not hold {in_channels} x {multiplier} filters"),
        ));
    }

    let kernel_size = dims_i64(w_shape, 1..w_shape.rank());
    let mut grouped = vec![out_channels, 1];
    grouped.extend(&kernel_size);
    let weight = op::reshape(inputs[1].clone(), grouped);

    let Geometry { strides, padding, dilation } = geometry(node, spatial)?;
    let (data_layout, kernel_layout) = spatial.layouts(false);
    let attrs = ConvAttrs {
        strides,
        padding,
        dilation,
        groups: in_channels,
        channels: out_channels,
        kernel_size,
        data_layout,
        kernel_layout,
    };
    let out = op::conv(spatial, inputs[0].clone(), weight, attrs);
    Ok(with_bias(out, inputs, 1).into())
}

/// 2-D transposed convolution; weight is `(C_in, C_out / group, kh, kw)`.
pub fn deconvolution(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 2, 3)?;
    require_base_axis_one(node)?;
    if attr_bool(node, "channel_last", false)? {
        return Err(conversion_error(node, "channel_last deconvolution is not supported"));
    }
    let w_shape = input_shape(node, ctx, 1)?;
    if w_shape.rank() != 4 {
        return Err(conversion_error(
            node,
            format_args!("only 2-D deconvolution is supported, weight is {w_shape}"),
        ));
    }

    let groups = attr_int(node, "group", 1)?;
    let Geometry { strides, padding, dilation } = geometry(node, Spatial::D2)?;
    let output_padding = spatial_attr(node, "output_padding", 2, 0)?;
    let attrs = ConvAttrs {
        strides,
        padding,
        dilation,
        groups,
        channels: w_shape.dims()[1] as i64 * groups,
        kernel_size: dims_i64(w_shape, 2..4),
        data_layout: "NCHW",
        kernel_layout: "IOHW",
    };
    let out = op::conv2d_transpose(inputs[0].clone(), inputs[1].clone(), attrs, output_padding);
    Ok(with_bias(out, inputs, 1).into())
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Constructors for the operator vocabulary.
//!
//! Each function builds one [`Expr::call`] with the operator name and
//! attribute spelling downstream compilers expect. No shape checking is
//! performed here; callers are responsible for passing consistent operands.

use crate::{Attrs, Expr, Op};

/// Builds a call to an arbitrary operator.
pub fn call(name: &'static str, args: Vec<Expr>, attrs: Attrs) -> Expr {
    Expr::call(Op::new(name), args, attrs)
}

fn unary(name: &'static str, x: Expr) -> Expr {
    call(name, vec![x], Attrs::new())
}

fn binary(name: &'static str, lhs: Expr, rhs: Expr) -> Expr {
    call(name, vec![lhs, rhs], Attrs::new())
}

// ── Element-wise ───────────────────────────────────────────────────

pub fn relu(x: Expr) -> Expr {
    unary("nn.relu", x)
}

pub fn sigmoid(x: Expr) -> Expr {
    unary("sigmoid", x)
}

pub fn tanh(x: Expr) -> Expr {
    unary("tanh", x)
}

pub fn exp(x: Expr) -> Expr {
    unary("exp", x)
}

pub fn negative(x: Expr) -> Expr {
    unary("negative", x)
}

pub fn leaky_relu(x: Expr, alpha: f64) -> Expr {
    call("nn.leaky_relu", vec![x], Attrs::new().set("alpha", alpha))
}

/// Parametric ReLU with a learned slope broadcast along `axis`.
pub fn prelu(x: Expr, alpha: Expr, axis: i64) -> Expr {
    call("nn.prelu", vec![x, alpha], Attrs::new().set("axis", axis))
}

pub fn clip(x: Expr, a_min: f64, a_max: f64) -> Expr {
    call(
        "clip",
        vec![x],
        Attrs::new().set("a_min", a_min).set("a_max", a_max),
    )
}

pub fn softmax(x: Expr, axis: i64) -> Expr {
    call("nn.softmax", vec![x], Attrs::new().set("axis", axis))
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    binary("add", lhs, rhs)
}

pub fn subtract(lhs: Expr, rhs: Expr) -> Expr {
    binary("subtract", lhs, rhs)
}

pub fn multiply(lhs: Expr, rhs: Expr) -> Expr {
    binary("multiply", lhs, rhs)
}

pub fn divide(lhs: Expr, rhs: Expr) -> Expr {
    binary("divide", lhs, rhs)
}

pub fn power(lhs: Expr, rhs: Expr) -> Expr {
    binary("power", lhs, rhs)
}

// ── Shape manipulation ─────────────────────────────────────────────

pub fn reshape(x: Expr, newshape: Vec<i64>) -> Expr {
    call("reshape", vec![x], Attrs::new().set("newshape", newshape))
}

pub fn transpose(x: Expr, axes: Vec<i64>) -> Expr {
    call("transpose", vec![x], Attrs::new().set("axes", axes))
}

pub fn squeeze(x: Expr, axes: Vec<i64>) -> Expr {
    call("squeeze", vec![x], Attrs::new().set("axis", axes))
}

/// Joins `parts` along `axis`. The operands are passed as one tuple.
pub fn concatenate(parts: Vec<Expr>, axis: i64) -> Expr {
    call(
        "concatenate",
        vec![Expr::tuple(parts)],
        Attrs::new().set("axis", axis),
    )
}

/// Splits `x` into `sections` equal parts along `axis`. The result is
/// tuple-valued; project fields with [`Expr::tuple_get_item`].
pub fn split(x: Expr, sections: i64, axis: i64) -> Expr {
    call(
        "split",
        vec![x],
        Attrs::new()
            .set("indices_or_sections", sections)
            .set("axis", axis),
    )
}

pub fn batch_flatten(x: Expr) -> Expr {
    unary("nn.batch_flatten", x)
}

// ── Neural-network layers ──────────────────────────────────────────

/// Number of spatial dimensions of a convolution or pooling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spatial {
    D1,
    D2,
    D3,
}

impl Spatial {
    /// Maps a kernel rank to a spatial variant; only 1-3 are supported.
    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Spatial::D1),
            2 => Some(Spatial::D2),
            3 => Some(Spatial::D3),
            _ => None,
        }
    }

    pub fn rank(self) -> usize {
        match self {
            Spatial::D1 => 1,
            Spatial::D2 => 2,
            Spatial::D3 => 3,
        }
    }

    /// Default layouts for channel-first or channel-last data.
    pub fn layouts(self, channel_last: bool) -> (&'static str, &'static str) {
        match (self, channel_last) {
            (Spatial::D1, false) => ("NCW", "OIW"),
            (Spatial::D1, true) => ("NWC", "OWI"),
            (Spatial::D2, false) => ("NCHW", "OIHW"),
            (Spatial::D2, true) => ("NHWC", "OHWI"),
            (Spatial::D3, false) => ("NCDHW", "OIDHW"),
            (Spatial::D3, true) => ("NDHWC", "ODHWI"),
        }
    }
}

/// Attributes shared by the convolution family.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvAttrs {
    pub strides: Vec<i64>,
    /// Leading pads for every spatial axis, then trailing pads.
    pub padding: Vec<i64>,
    pub dilation: Vec<i64>,
    pub groups: i64,
    pub channels: i64,
    pub kernel_size: Vec<i64>,
    pub data_layout: &'static str,
    pub kernel_layout: &'static str,
}

impl ConvAttrs {
    fn into_attrs(self) -> Attrs {
        Attrs::new()
            .set("strides", self.strides)
            .set("padding", self.padding)
            .set("dilation", self.dilation)
            .set("groups", self.groups)
            .set("channels", self.channels)
            .set("kernel_size", self.kernel_size)
            .set("data_layout", self.data_layout)
            .set("kernel_layout", self.kernel_layout)
    }
}

pub fn conv(spatial: Spatial, data: Expr, weight: Expr, attrs: ConvAttrs) -> Expr {
    let name = match spatial {
        Spatial::D1 => "nn.conv1d",
        Spatial::D2 => "nn.conv2d",
        Spatial::D3 => "nn.conv3d",
    };
    call(name, vec![data, weight], attrs.into_attrs())
}

pub fn conv2d_transpose(data: Expr, weight: Expr, attrs: ConvAttrs, output_padding: Vec<i64>) -> Expr {
    call(
        "nn.conv2d_transpose",
        vec![data, weight],
        attrs.into_attrs().set("output_padding", output_padding),
    )
}

pub fn bias_add(x: Expr, bias: Expr, axis: i64) -> Expr {
    call("nn.bias_add", vec![x, bias], Attrs::new().set("axis", axis))
}

/// `x · weightᵀ` with `weight` laid out as `(units, in_features)`.
pub fn dense(x: Expr, weight: Expr, units: i64) -> Expr {
    call("nn.dense", vec![x, weight], Attrs::new().set("units", units))
}

/// Inference-mode batch normalisation. The result is a 3-tuple
/// `(normalised, moving_mean, moving_var)`.
pub fn batch_norm(
    data: Expr,
    gamma: Expr,
    beta: Expr,
    moving_mean: Expr,
    moving_var: Expr,
    axis: i64,
    epsilon: f64,
) -> Expr {
    call(
        "nn.batch_norm",
        vec![data, gamma, beta, moving_mean, moving_var],
        Attrs::new().set("axis", axis).set("epsilon", epsilon),
    )
}

/// Attributes shared by max and average pooling.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolAttrs {
    pub pool_size: Vec<i64>,
    pub strides: Vec<i64>,
    pub padding: Vec<i64>,
    pub layout: &'static str,
    pub ceil_mode: bool,
}

impl PoolAttrs {
    fn into_attrs(self) -> Attrs {
        Attrs::new()
            .set("pool_size", self.pool_size)
            .set("strides", self.strides)
            .set("padding", self.padding)
            .set("layout", self.layout)
            .set("ceil_mode", self.ceil_mode)
    }
}

pub fn max_pool(spatial: Spatial, x: Expr, attrs: PoolAttrs) -> Expr {
    let name = match spatial {
        Spatial::D1 => "nn.max_pool1d",
        Spatial::D2 => "nn.max_pool2d",
        Spatial::D3 => "nn.max_pool3d",
    };
    call(name, vec![x], attrs.into_attrs())
}

pub fn avg_pool(spatial: Spatial, x: Expr, attrs: PoolAttrs, count_include_pad: bool) -> Expr {
    let name = match spatial {
        Spatial::D1 => "nn.avg_pool1d",
        Spatial::D2 => "nn.avg_pool2d",
        Spatial::D3 => "nn.avg_pool3d",
    };
    call(
        name,
        vec![x],
        attrs
            .into_attrs()
            .set("count_include_pad", count_include_pad),
    )
}

pub fn global_avg_pool2d(x: Expr, layout: &'static str) -> Expr {
    call("nn.global_avg_pool2d", vec![x], Attrs::new().set("layout", layout))
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The `Constant` pseudo operator: a tensor filled with one value.

use super::{attr_float, attr_ints, conversion_error, operands, output_shape};
use crate::registry::{ConvertContext, OpOutput};
use crate::shape::resolve_shape;
use crate::ImportError;
use dataflow_ir::Expr;
use nnp_model::FunctionNode;
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

/// Named after its output variable. The shape comes from the output
/// variable, then the `shape` attribute, and is rank 0 otherwise.
pub fn convert(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    operands(node, inputs, 0, 0)?;
    let name = node
        .outputs
        .first()
        .ok_or_else(|| conversion_error(node, "constant has no output"))?;
    let value = attr_float(node, "val", 0.0)?;

    let shape = match output_shape(node, ctx, 0) {
        Some(shape) => shape.clone(),
        None => match attr_ints(node, "shape")? {
            Some(dims) => resolve_shape(&dims, ctx.batch_size() as i64)?,
            None => Shape::scalar(),
        },
    };
    let tensor = Tensor::filled(shape, value as f32);
    Ok(Expr::named_constant(name.clone(), Arc::new(tensor)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::Fixture;
    use nnp_model::{AttrValue, Attributes};

    #[test]
    fn test_constant_from_output_shape() {
        let node = FunctionNode::new("c", "Constant", Vec::<String>::new(), ["k"])
            .with_attributes(Attributes::new().with("val", AttrValue::Float(3.0)));
        let f = Fixture::new(node, &[("k", &[2, 2])], &[]);
        let out = f.single(convert);
        let c = out.as_constant().unwrap();
        assert_eq!(c.name(), Some("k"));
        assert_eq!(c.value().shape().dims(), &[2, 2]);
        assert!(c.value().as_f32_slice().iter().all(|&v| v == 3.0));
    }

    #[test]
    fn test_constant_from_attribute_shape() {
        let node = FunctionNode::new("c", "Constant", Vec::<String>::new(), ["k"]).with_attributes(
            Attributes::new()
                .with("val", AttrValue::Int(1))
                .with("shape", AttrValue::Ints(vec![-1, 3])),
        );
        let f = Fixture::new(node, &[], &[]);
        let out = f.single(convert);
        assert_eq!(out.as_constant().unwrap().value().shape().dims(), &[1, 3]);
    }

    #[test]
    fn test_constant_rejects_inputs() {
        let node = FunctionNode::new("c", "Constant", ["x"], ["k"]);
        let f = Fixture::new(node, &[("x", &[1]), ("k", &[1])], &[]);
        assert!(matches!(f.run(convert), Err(ImportError::Conversion { .. })));
    }
}

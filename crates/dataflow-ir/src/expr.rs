// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Expression nodes.

use crate::Attrs;
use std::fmt;
use std::sync::Arc;
use tensor_core::{DType, Shape, Tensor};

/// Static type of a tensor-valued leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub shape: Shape,
    pub dtype: DType,
}

impl TensorType {
    pub fn new(shape: Shape, dtype: DType) -> Self {
        Self { shape, dtype }
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor[{}, {}]", self.shape, self.dtype)
    }
}

/// Name of a target operator, e.g. `nn.conv2d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Op(&'static str);

impl Op {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A free variable: a value supplied when the function is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    name: String,
    ty: TensorType,
}

impl Var {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TensorType {
        &self.ty
    }
}

/// A constant leaf. Named constants come from model parameters and print
/// as `meta[name]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: Option<String>,
    value: Arc<Tensor>,
}

impl Constant {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> &Arc<Tensor> {
        &self.value
    }

    pub fn ty(&self) -> TensorType {
        TensorType::new(self.value.shape().clone(), self.value.dtype())
    }
}

/// Application of an operator to arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    op: Op,
    args: Vec<Expr>,
    attrs: Attrs,
}

impl Call {
    pub fn op(&self) -> Op {
        self.op
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }
}

/// The variants an [`Expr`] can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Var(Var),
    Constant(Constant),
    Call(Call),
    Tuple(Vec<Expr>),
    TupleGetItem { tuple: Expr, index: usize },
}

/// A shared, immutable expression node.
///
/// Identity matters: two `Expr`s are the same graph node only when they
/// share an allocation (see [`Expr::ptr_eq`]). `PartialEq` compares
/// structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr(Arc<ExprKind>);

impl Expr {
    fn from_kind(kind: ExprKind) -> Self {
        Self(Arc::new(kind))
    }

    /// A free variable leaf.
    pub fn var(name: impl Into<String>, ty: TensorType) -> Self {
        Self::from_kind(ExprKind::Var(Var {
            name: name.into(),
            ty,
        }))
    }

    /// An anonymous constant.
    pub fn constant(value: Arc<Tensor>) -> Self {
        Self::from_kind(ExprKind::Constant(Constant { name: None, value }))
    }

    /// A constant bound to a parameter name.
    pub fn named_constant(name: impl Into<String>, value: Arc<Tensor>) -> Self {
        Self::from_kind(ExprKind::Constant(Constant {
            name: Some(name.into()),
            value,
        }))
    }

    /// A rank-0 `float32` constant.
    pub fn scalar(value: f32) -> Self {
        Self::constant(Arc::new(Tensor::scalar(value)))
    }

    pub fn call(op: Op, args: Vec<Expr>, attrs: Attrs) -> Self {
        Self::from_kind(ExprKind::Call(Call { op, args, attrs }))
    }

    pub fn tuple(fields: Vec<Expr>) -> Self {
        Self::from_kind(ExprKind::Tuple(fields))
    }

    /// Projects field `index` out of a tuple-valued expression.
    pub fn tuple_get_item(tuple: Expr, index: usize) -> Self {
        Self::from_kind(ExprKind::TupleGetItem { tuple, index })
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// Stable identity of this node for the lifetime of the allocation.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Returns `true` if both handles point at the same node.
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self.kind() {
            ExprKind::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self.kind() {
            ExprKind::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self.kind() {
            ExprKind::Call(c) => Some(c),
            _ => None,
        }
    }

    /// Direct operands of this node, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self.kind() {
            ExprKind::Var(_) | ExprKind::Constant(_) => Vec::new(),
            ExprKind::Call(call) => call.args.iter().collect(),
            ExprKind::Tuple(fields) => fields.iter().collect(),
            ExprKind::TupleGetItem { tuple, .. } => vec![tuple],
        }
    }

    /// Static type of a leaf, `None` for computed nodes.
    pub fn leaf_type(&self) -> Option<TensorType> {
        match self.kind() {
            ExprKind::Var(v) => Some(v.ty.clone()),
            ExprKind::Constant(c) => Some(c.ty()),
            _ => None,
        }
    }
}

/// Drops operand chains iteratively; the derived drop of nested `Arc`s
/// recurses once per node of depth.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_operands(&mut self.0, &mut pending);
        while let Some(mut operand) = pending.pop() {
            detach_operands(&mut operand.0, &mut pending);
        }
    }
}

fn detach_operands(node: &mut Arc<ExprKind>, out: &mut Vec<Expr>) {
    if let Some(kind) = Arc::get_mut(node) {
        match kind {
            ExprKind::Call(call) => out.append(&mut call.args),
            ExprKind::Tuple(fields) => out.append(fields),
            ExprKind::Var(_) | ExprKind::Constant(_) | ExprKind::TupleGetItem { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_type(dims: Vec<usize>) -> TensorType {
        TensorType::new(Shape::new(dims), DType::Float32)
    }

    #[test]
    fn test_clone_shares_node() {
        let x = Expr::var("x", f32_type(vec![2, 2]));
        let y = x.clone();
        assert!(x.ptr_eq(&y));
        assert_eq!(x.id(), y.id());

        let z = Expr::var("x", f32_type(vec![2, 2]));
        assert!(!x.ptr_eq(&z));
        assert_eq!(x, z);
    }

    #[test]
    fn test_children() {
        let x = Expr::var("x", f32_type(vec![2]));
        let c = Expr::scalar(1.0);
        let call = Expr::call(Op::new("add"), vec![x.clone(), c.clone()], Attrs::new());
        let kids = call.children();
        assert_eq!(kids.len(), 2);
        assert!(kids[0].ptr_eq(&x));
        assert!(kids[1].ptr_eq(&c));

        let item = Expr::tuple_get_item(Expr::tuple(vec![call.clone()]), 0);
        assert_eq!(item.children().len(), 1);
        assert!(x.children().is_empty());
    }

    #[test]
    fn test_leaf_types() {
        let w = Expr::named_constant("w", Arc::new(Tensor::filled(Shape::new(vec![3, 4]), 0.0)));
        assert_eq!(w.leaf_type(), Some(f32_type(vec![3, 4])));
        assert_eq!(w.as_constant().unwrap().name(), Some("w"));

        let call = Expr::call(Op::new("nn.relu"), vec![w], Attrs::new());
        assert_eq!(call.leaf_type(), None);
        assert_eq!(call.as_call().unwrap().op().name(), "nn.relu");
    }

    #[test]
    fn test_tensor_type_display() {
        assert_eq!(
            f32_type(vec![4, 3, 32, 32]).to_string(),
            "Tensor[(4, 3, 32, 32), float32]"
        );
    }
}

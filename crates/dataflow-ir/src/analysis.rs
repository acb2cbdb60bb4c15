// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph traversals over [`Expr`] DAGs.
//!
//! Traversals are iterative so that long operator chains do not grow the
//! call stack, and every shared node is visited exactly once.

use crate::{Expr, ExprKind, Var};
use std::collections::HashSet;

/// Returns every node reachable from `root`, operands before their users.
///
/// Operands are visited left to right; a node reachable along several paths
/// appears once, at its first completed visit.
pub fn post_order(root: &Expr) -> Vec<Expr> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![(root.clone(), false)];

    while let Some((expr, expanded)) = stack.pop() {
        if expanded {
            order.push(expr);
            continue;
        }
        if !seen.insert(expr.id()) {
            continue;
        }
        let children: Vec<Expr> = expr.children().into_iter().cloned().collect();
        stack.push((expr, true));
        for child in children.into_iter().rev() {
            if !seen.contains(&child.id()) {
                stack.push((child, false));
            }
        }
    }

    order
}

/// Collects the free variables of `expr` in first-use order.
///
/// The IR has no binding constructs below the function level, so every
/// reachable [`Var`] is free.
pub fn free_vars(expr: &Expr) -> Vec<Var> {
    post_order(expr)
        .into_iter()
        .filter_map(|e| match e.kind() {
            ExprKind::Var(v) => Some(v.clone()),
            _ => None,
        })
        .collect()
}

/// Number of operator calls reachable from `expr`.
pub fn call_count(expr: &Expr) -> usize {
    post_order(expr)
        .iter()
        .filter(|e| matches!(e.kind(), ExprKind::Call(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{op, TensorType};
    use tensor_core::{DType, Shape};

    fn var(name: &str) -> Expr {
        Expr::var(name, TensorType::new(Shape::new(vec![2, 2]), DType::Float32))
    }

    #[test]
    fn test_post_order_operands_first() {
        let x = var("x");
        let y = var("y");
        let sum = op::add(x.clone(), y.clone());
        let out = op::relu(sum.clone());

        let order = post_order(&out);
        let ids: Vec<usize> = order.iter().map(Expr::id).collect();
        assert_eq!(ids, vec![x.id(), y.id(), sum.id(), out.id()]);
    }

    #[test]
    fn test_shared_node_visited_once() {
        // Diamond: x feeds both branches of the add.
        let x = var("x");
        let a = op::relu(x.clone());
        let b = op::sigmoid(x.clone());
        let out = op::add(a, b);

        let order = post_order(&out);
        assert_eq!(order.len(), 4);
        assert_eq!(order.iter().filter(|e| e.ptr_eq(&x)).count(), 1);
    }

    #[test]
    fn test_free_vars_first_use_order() {
        let x = var("x");
        let y = var("y");
        let out = op::multiply(op::add(y.clone(), x.clone()), y);
        let names: Vec<_> = free_vars(&out).iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn test_constants_are_not_free() {
        let x = var("x");
        let out = op::add(x, Expr::scalar(1.0));
        assert_eq!(free_vars(&out).len(), 1);
        assert_eq!(call_count(&out), 1);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut expr = var("x");
        for _ in 0..10_000 {
            expr = op::relu(expr);
        }
        assert_eq!(call_count(&expr), 10_000);
        assert_eq!(free_vars(&expr).len(), 1);
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Closed functions and their text form.
//!
//! ```text
//! fn (%x: Tensor[(4, 3, 32, 32), float32]) {
//!   %0 = add(%x, meta[w]);
//!   %0
//! }
//! ```

use crate::analysis::{free_vars, post_order};
use crate::{Expr, ExprKind, Var};
use std::collections::HashMap;
use std::fmt::{self, Write};

/// A function whose parameters are exactly the variables its body uses.
#[derive(Debug, Clone)]
pub struct Function {
    params: Vec<Var>,
    body: Expr,
}

impl Function {
    /// Creates a function with explicit parameters.
    pub fn new(params: Vec<Var>, body: Expr) -> Self {
        Self { params, body }
    }

    /// Closes `body` over its free variables, in first-use order.
    pub fn closed(body: Expr) -> Self {
        let params = free_vars(&body);
        Self { params, body }
    }

    pub fn params(&self) -> &[Var] {
        &self.params
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    /// Number of values the function returns: the field count of a tuple
    /// body, 1 otherwise.
    pub fn output_arity(&self) -> usize {
        match self.body.kind() {
            ExprKind::Tuple(fields) => fields.len(),
            _ => 1,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn (")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "%{}: {}", p.name(), p.ty())?;
        }
        writeln!(f, ") {{")?;

        let mut names: HashMap<usize, String> = HashMap::new();
        let mut next_local = 0usize;
        let mut next_const = 0usize;

        for expr in post_order(&self.body) {
            let rhs = match expr.kind() {
                ExprKind::Var(v) => {
                    names.insert(expr.id(), format!("%{}", v.name()));
                    continue;
                }
                ExprKind::Constant(c) => {
                    let label = match (c.name(), c.value().as_scalar()) {
                        (Some(name), _) => format!("meta[{name}]"),
                        (None, Some(v)) if c.value().shape().rank() == 0 => format!("{v:?}f"),
                        (None, _) => {
                            next_const += 1;
                            format!("meta[const.{}]", next_const - 1)
                        }
                    };
                    names.insert(expr.id(), label);
                    continue;
                }
                ExprKind::Call(call) => {
                    let mut rhs = format!("{}(", call.op());
                    let args = call.args().iter().map(|a| lookup(&names, a).to_string());
                    let attrs = call.attrs().iter().map(|(k, v)| format!("{k}={v}"));
                    let operands: Vec<String> = args.chain(attrs).collect();
                    write!(rhs, "{})", operands.join(", "))?;
                    rhs
                }
                ExprKind::Tuple(fields) => {
                    let operands: Vec<&str> = fields.iter().map(|e| lookup(&names, e)).collect();
                    format!("({})", operands.join(", "))
                }
                ExprKind::TupleGetItem { tuple, index } => {
                    format!("{}.{index}", lookup(&names, tuple))
                }
            };
            let local = format!("%{next_local}");
            next_local += 1;
            writeln!(f, "  {local} = {rhs};")?;
            names.insert(expr.id(), local);
        }

        writeln!(f, "  {}", lookup(&names, &self.body))?;
        write!(f, "}}")
    }
}

fn lookup<'a>(names: &'a HashMap<usize, String>, expr: &Expr) -> &'a str {
    names.get(&expr.id()).map(String::as_str).unwrap_or("?")
}

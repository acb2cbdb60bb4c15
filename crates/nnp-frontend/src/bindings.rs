// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Name → IR value table built during one import.

use crate::ImportError;
use dataflow_ir::Expr;
use std::collections::HashMap;

/// Append-only bindings from NNP variable names to IR values.
///
/// Every name is bound at most once; iteration follows binding order.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Expr>,
    order: Vec<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`.
    ///
    /// # Errors
    /// [`ImportError::DuplicateBinding`] if `name` is already bound.
    pub fn bind(&mut self, name: impl Into<String>, value: Expr) -> Result<(), ImportError> {
        let name = name.into();
        if self.values.contains_key(&name) {
            return Err(ImportError::DuplicateBinding { name });
        }
        self.order.push(name.clone());
        self.values.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bound names and values in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.order
            .iter()
            .filter_map(|name| self.values.get(name).map(|v| (name.as_str(), v)))
    }
}

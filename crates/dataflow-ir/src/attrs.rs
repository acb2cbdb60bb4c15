// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator call attributes.

use std::collections::BTreeMap;
use std::fmt;

/// A typed attribute attached to an operator call.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v:?}f"),
            AttrValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            AttrValue::Str(s) => write!(f, "\"{s}\""),
            AttrValue::Ints(v) => write_list(f, v.iter()),
            AttrValue::Floats(v) => write_list(f, v.iter().map(|x| format!("{x:?}f"))),
        }
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Floats(v)
    }
}

/// Attributes of one call, ordered by name so printing is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs(BTreeMap<&'static str, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, name: &'static str, value: impl Into<AttrValue>) -> Self {
        self.0.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::Int(3).to_string(), "3");
        assert_eq!(AttrValue::Float(0.5).to_string(), "0.5f");
        assert_eq!(AttrValue::Bool(true).to_string(), "True");
        assert_eq!(AttrValue::Ints(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(AttrValue::Str("NCHW".into()).to_string(), "\"NCHW\"");
    }

    #[test]
    fn test_set_orders_by_name() {
        let attrs = Attrs::new().set("strides", vec![1i64, 1]).set("groups", 1i64);
        let names: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["groups", "strides"]);
        assert_eq!(attrs.get("groups"), Some(&AttrValue::Int(1)));
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator attribute bundles.
//!
//! Every NNP function type carries its own parameter message
//! (`convolution_param`, `affine_param`, ...). Rather than modelling each
//! message, a node's attributes are kept as an opaque bag of named values.
//! Only the conversion handler registered for the node's operator type
//! interprets the bag, so no common attribute layout is assumed.

use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
///
/// Deserialisation is untagged: `1` is an [`AttrValue::Int`], `1.5` a
/// [`AttrValue::Float`], `[2, 2]` an [`AttrValue::Ints`], and the protobuf
/// shape message form `{"dim": [2, 2]}` a [`AttrValue::Dims`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Dims { dim: Vec<i64> },
}

impl AttrValue {
    /// Integer view of the value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float view of the value; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean view of the value; `0`/`1` integers are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Int(0) => Some(false),
            AttrValue::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Integer-list view of the value. A scalar integer is a one-element list.
    pub fn as_ints(&self) -> Option<Vec<i64>> {
        match self {
            AttrValue::Ints(v) => Some(v.clone()),
            AttrValue::Dims { dim } => Some(dim.clone()),
            AttrValue::Int(v) => Some(vec![*v]),
            _ => None,
        }
    }

    /// Float-list view of the value.
    pub fn as_floats(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Floats(v) => Some(v.clone()),
            AttrValue::Ints(v) => Some(v.iter().map(|&x| x as f64).collect()),
            AttrValue::Float(v) => Some(vec![*v]),
            _ => None,
        }
    }

    /// String view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the stored variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::Ints(_) => "int list",
            AttrValue::Floats(_) => "float list",
            AttrValue::Dims { .. } => "shape",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(s) => write!(f, "\"{s}\""),
            AttrValue::Ints(v) | AttrValue::Dims { dim: v } => write!(f, "{v:?}"),
            AttrValue::Floats(v) => write!(f, "{v:?}"),
        }
    }
}

/// The attribute bag of one function node.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy when constructing descriptors in code.
    pub fn with(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        self.0.insert(key.into(), value);
    }

    /// Looks up a value by name.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_parsing() {
        let attrs: Attributes = serde_json::from_str(
            r#"{
                "axis": 1,
                "eps": 1e-5,
                "alpha": 0.5,
                "channel_last": false,
                "kernel": [2, 2],
                "pad": {"dim": [1, 1]},
                "scales": [0.5, 0.25],
                "mode": "nearest"
            }"#,
        )
        .unwrap();

        assert_eq!(attrs.get("axis"), Some(&AttrValue::Int(1)));
        assert_eq!(attrs.get("eps").and_then(AttrValue::as_float), Some(1e-5));
        assert_eq!(attrs.get("channel_last").and_then(AttrValue::as_bool), Some(false));
        assert_eq!(attrs.get("kernel").and_then(AttrValue::as_ints), Some(vec![2, 2]));
        assert_eq!(attrs.get("pad").and_then(AttrValue::as_ints), Some(vec![1, 1]));
        assert_eq!(
            attrs.get("scales").and_then(AttrValue::as_floats),
            Some(vec![0.5, 0.25])
        );
        assert_eq!(attrs.get("mode").and_then(AttrValue::as_str), Some("nearest"));
    }

    #[test]
    fn test_views_reject_wrong_kind() {
        let v = AttrValue::Str("x".into());
        assert_eq!(v.as_int(), None);
        assert_eq!(v.as_ints(), None);
        assert_eq!(v.kind(), "string");
        assert_eq!(AttrValue::Int(3).as_float(), Some(3.0));
        assert_eq!(AttrValue::Int(2).as_bool(), None);
    }

    #[test]
    fn test_builder_and_iter_order() {
        let attrs = Attributes::new()
            .with("stride", AttrValue::Ints(vec![1, 1]))
            .with("group", AttrValue::Int(1));
        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["group", "stride"]);
        assert!(attrs.contains("group"));
        assert!(!Attributes::new().contains("group"));
    }
}

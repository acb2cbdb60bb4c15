// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Import configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! batch_size = 4          # negative: use the network's declared batch size
//! dtype = "float32"       # or a per-input table, see below
//!
//! [shapes]
//! x = [-1, 3, 32, 32]
//! ```
//!
//! Per-input element types:
//! ```toml
//! [dtype]
//! image = "float32"
//! mask = "uint8"
//! ```

use crate::ImportError;
use std::collections::BTreeMap;
use std::path::Path;
use tensor_core::DType;

/// Element-type override for runtime inputs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum DTypeSpec {
    /// One type for every runtime input.
    Uniform(String),
    /// Types for specific inputs; others keep their declared type.
    PerInput(BTreeMap<String, String>),
}

/// Configuration accepted by the importer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImportConfig {
    /// Batch size substituted for negative dimensions. Negative values defer
    /// to the network's declared batch size.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Element-type override for runtime inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DTypeSpec>,
    /// Explicit shapes that replace (or supply) a variable's declared shape.
    /// Negative entries are resolved against the batch size like declared ones.
    #[serde(default)]
    pub shapes: BTreeMap<String, Vec<i64>>,
}

fn default_batch_size() -> i64 {
    -1
}

impl ImportConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ImportError> {
        toml::from_str(toml_str)
            .map_err(|e| ImportError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ImportError> {
        toml::to_string_pretty(self)
            .map_err(|e| ImportError::Config(format!("TOML serialise error: {e}")))
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_shape(mut self, name: impl Into<String>, dims: Vec<i64>) -> Self {
        self.shapes.insert(name.into(), dims);
        self
    }

    pub fn with_dtype(mut self, spec: DTypeSpec) -> Self {
        self.dtype = Some(spec);
        self
    }

    /// Element type for runtime input `name` whose declared type is
    /// `declared`: per-input entry, then uniform override, then declared.
    pub fn resolve_dtype(&self, name: &str, declared: &str) -> Result<DType, ImportError> {
        let chosen = match &self.dtype {
            Some(DTypeSpec::Uniform(ty)) => ty.as_str(),
            Some(DTypeSpec::PerInput(map)) => map.get(name).map_or(declared, String::as_str),
            None => declared,
        };
        chosen
            .parse()
            .map_err(|e| ImportError::Config(format!("input '{name}': {e}")))
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            dtype: None,
            shapes: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = ImportConfig::default();
        assert_eq!(c.batch_size, -1);
        assert!(c.dtype.is_none());
        assert!(c.shapes.is_empty());
    }

    #[test]
    fn test_from_toml_uniform_dtype() {
        let toml = r#"
batch_size = 4
dtype = "float16"

[shapes]
x = [-1, 3, 32, 32]
"#;
        let c = ImportConfig::from_toml(toml).unwrap();
        assert_eq!(c.batch_size, 4);
        assert_eq!(c.dtype, Some(DTypeSpec::Uniform("float16".into())));
        assert_eq!(c.shapes.get("x"), Some(&vec![-1, 3, 32, 32]));
        assert_eq!(c.resolve_dtype("x", "float32").unwrap(), DType::Float16);
    }

    #[test]
    fn test_from_toml_per_input_dtype() {
        let toml = r#"
[dtype]
mask = "uint8"
"#;
        let c = ImportConfig::from_toml(toml).unwrap();
        assert_eq!(c.batch_size, -1);
        assert_eq!(c.resolve_dtype("mask", "float32").unwrap(), DType::UInt8);
        assert_eq!(c.resolve_dtype("image", "float32").unwrap(), DType::Float32);
    }

    #[test]
    fn test_declared_dtype_used_without_override() {
        let c = ImportConfig::default();
        assert_eq!(c.resolve_dtype("ids", "int64").unwrap(), DType::Int64);
    }

    #[test]
    fn test_unknown_dtype_is_config_error() {
        let c = ImportConfig::default().with_dtype(DTypeSpec::Uniform("complex".into()));
        assert!(matches!(
            c.resolve_dtype("x", "float32"),
            Err(ImportError::Config(_))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ImportConfig::from_toml("batch_size = \"many\""),
            Err(ImportError::Config(_))
        ));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = ImportConfig::default()
            .with_batch_size(8)
            .with_shape("x", vec![-1, 1, 28, 28])
            .with_dtype(DTypeSpec::Uniform("float32".into()));
        let toml = c.to_toml().unwrap();
        let back = ImportConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }
}

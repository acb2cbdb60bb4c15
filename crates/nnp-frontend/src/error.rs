// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph import.

/// Errors that abort an import. None of them are retried and no partial IR
/// is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The model must declare exactly one executor.
    #[error("exactly one executor is supported, model declares {count}")]
    MultipleEntryPointsUnsupported { count: usize },

    /// The executor names a network the model does not contain.
    #[error("executor '{executor}' references network '{network}' which is not in the model")]
    NetworkNotFound { executor: String, network: String },

    /// The batch size used to resolve placeholder dimensions is not positive.
    #[error("invalid batch size {batch_size}: must be a positive integer")]
    InvalidBatchSize { batch_size: i64 },

    /// A runtime input has neither a declared nor a configured shape.
    #[error("no shape is known for input '{name}'; provide one in the import configuration")]
    MissingInputShape { name: String },

    /// One or more operator types have no registered handler.
    #[error("the following operators are not supported: {}", op_types.join(", "))]
    UnsupportedOperator { op_types: Vec<String> },

    /// A node consumes a value that has not been produced.
    #[error("input '{name}' of node '{node}' ({op_type}) is not bound to any value")]
    UnresolvedInput {
        node: String,
        op_type: String,
        name: String,
    },

    /// A handler produced a different number of values than the node declares.
    #[error("number of outputs mismatch: node '{node}' declares {expected}, {op_type} produced {actual}")]
    OutputArityMismatch {
        node: String,
        op_type: String,
        expected: usize,
        actual: usize,
    },

    /// A value name was bound twice. Model outputs are single-assignment, so
    /// this indicates a corrupt model or a converter bug.
    #[error("value '{name}' is bound more than once")]
    DuplicateBinding { name: String },

    /// A declared executor output was never produced.
    #[error("declared output '{name}' was never produced by the graph")]
    UnresolvedOutput { name: String },

    /// The network is structurally inconsistent (cycle, duplicate or
    /// undeclared names, bad parameter data).
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// A handler rejected its node (bad attribute, operand count, layout).
    #[error("cannot convert node '{node}' ({op_type}): {detail}")]
    Conversion {
        node: String,
        op_type: String,
        detail: String,
    },

    /// An operator type was registered twice in the same registry.
    #[error("a handler for operator '{op_type}' is already registered")]
    DuplicateRegistration { op_type: String },

    /// The import configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The model descriptor could not be loaded.
    #[error("model error: {0}")]
    Model(#[from] nnp_model::ModelError),

    /// Building a tensor failed.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_operator_lists_all() {
        let err = ImportError::UnsupportedOperator {
            op_types: vec!["Bar".into(), "Foo".into()],
        };
        assert_eq!(
            err.to_string(),
            "the following operators are not supported: Bar, Foo"
        );
    }

    #[test]
    fn test_arity_message_has_context() {
        let err = ImportError::OutputArityMismatch {
            node: "split0".into(),
            op_type: "Split".into(),
            expected: 2,
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("split0"));
        assert!(msg.contains("Split"));
        assert!(msg.contains("declares 2"));
        assert!(msg.contains("produced 1"));
    }
}

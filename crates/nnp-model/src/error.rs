// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for loading model descriptors.

/// Errors that can occur when reading a decoded model descriptor.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The descriptor file could not be read.
    #[error("failed to read model descriptor: {0}")]
    ReadError(#[from] std::io::Error),

    /// The descriptor JSON is malformed.
    #[error("failed to parse model descriptor: {0}")]
    ParseError(#[from] serde_json::Error),
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # nnp-import
//!
//! Command-line interface for the NNP graph importer.
//!
//! ## Usage
//! ```bash
//! # Summarise a model and list operators without a handler
//! nnp-import inspect --model ./lenet.json
//!
//! # Convert to IR text with a concrete batch size
//! nnp-import convert --model ./lenet.json --batch-size 8
//!
//! # Shapes and element types from a TOML file
//! nnp-import --config import.toml convert --model ./lenet.json -o lenet.ir
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nnp-import",
    about = "Import NNP neural-network graphs into a dataflow IR",
    version,
    author
)]
struct Cli {
    /// Path to a TOML import configuration (batch size, shapes, dtypes).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print networks, executors, parameters and the operator histogram.
    Inspect {
        /// Path to the model descriptor (JSON).
        #[arg(short, long)]
        model: std::path::PathBuf,
    },

    /// Convert the model and print the IR function and parameter table.
    Convert {
        /// Path to the model descriptor (JSON).
        #[arg(short, long)]
        model: std::path::PathBuf,

        /// Batch size for placeholder dimensions; overrides the config file.
        /// Negative values use the network's declared batch size.
        #[arg(short, long, allow_hyphen_values = true)]
        batch_size: Option<i64>,

        /// Write the IR text to this file instead of stdout.
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { model } => commands::inspect::execute(model),
        Commands::Convert {
            model,
            batch_size,
            output,
        } => commands::convert::execute(model, cli.config, batch_size, output),
    }
}

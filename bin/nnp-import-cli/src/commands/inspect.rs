// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nnp-import inspect`: summarise a model descriptor.

use nnp_frontend::builtin;
use std::path::PathBuf;

pub fn execute(model: PathBuf) -> anyhow::Result<()> {
    let descriptor = super::load_model(&model)?;
    let registry = builtin();

    println!("  Model: {}", model.display());
    println!();

    // ── Networks ───────────────────────────────────────────────
    println!("  {:<24} {:>10} {:>10} {:>8}", "Network", "Variables", "Functions", "Batch");
    println!("  {}", "-".repeat(56));
    for net in &descriptor.networks {
        let batch = net
            .batch_size
            .map_or_else(|| "-".to_string(), |b| b.to_string());
        println!(
            "  {:<24} {:>10} {:>10} {:>8}",
            truncate(&net.name, 24),
            net.variables.len(),
            net.functions.len(),
            batch,
        );
    }
    println!();

    // ── Executors ──────────────────────────────────────────────
    for exec in &descriptor.executors {
        println!("  Executor '{}' → network '{}'", exec.name, exec.network_name);
        println!("    inputs:     {}", join(exec.data_names().chain(exec.generator_names())));
        println!("    outputs:    {}", join(exec.output_names()));
    }
    if descriptor.executors.len() != 1 {
        println!(
            "  ! {} executors declared; import needs exactly one",
            descriptor.executors.len()
        );
    }
    println!();

    // ── Parameters ─────────────────────────────────────────────
    let floats: usize = descriptor.parameters.iter().map(|p| p.data.len()).sum();
    println!(
        "  Parameters: {} tensors, {:.2} MB",
        descriptor.parameters.len(),
        (floats * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0),
    );
    println!();

    // ── Operators ──────────────────────────────────────────────
    println!("  {:<28} {:>6}  {}", "Operator", "Count", "Handler");
    println!("  {}", "-".repeat(46));
    let histogram = descriptor.op_histogram();
    for (op_type, count) in &histogram {
        let mark = if registry.supports(op_type) { "yes" } else { "MISSING" };
        println!("  {:<28} {:>6}  {}", truncate(op_type, 28), count, mark);
    }
    println!();

    match registry.check_supported(histogram.keys().copied()) {
        Ok(()) => println!("  All operators are supported."),
        Err(e) => println!("  {e}"),
    }
    Ok(())
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

/// Truncates a string to `max_len` characters with ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

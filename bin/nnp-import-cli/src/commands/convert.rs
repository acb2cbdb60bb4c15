// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nnp-import convert`: run the importer and emit IR text.

use nnp_frontend::{from_nnp, ImportConfig};
use std::path::PathBuf;

pub fn execute(
    model: PathBuf,
    config: Option<PathBuf>,
    batch_size: Option<i64>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut import_config = match &config {
        Some(path) => ImportConfig::from_file(path)?,
        None => ImportConfig::default(),
    };
    if let Some(batch_size) = batch_size {
        import_config.batch_size = batch_size;
    }

    let descriptor = super::load_model(&model)?;
    let start = std::time::Instant::now();
    let module = from_nnp(&descriptor, &import_config)
        .map_err(|e| anyhow::anyhow!("failed to import '{}': {e}", model.display()))?;
    tracing::info!(
        params = module.function.params().len(),
        outputs = module.function.output_arity(),
        constants = module.params.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "import finished"
    );

    let text = module.to_string();
    match output {
        Some(path) => {
            std::fs::write(&path, &text)
                .map_err(|e| anyhow::anyhow!("cannot write '{}': {e}", path.display()))?;
            println!(
                "  Wrote {} ({} constants, {:.2} MB)",
                path.display(),
                module.params.len(),
                module.param_bytes() as f64 / (1024.0 * 1024.0),
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Habituation Mapping Tool

Runs the full habituation pipeline described by a `neurohab.toml`
configuration: scan the input directory, index the per-block beta volumes,
compute REG or FmL habituation maps, and write one NIfTI map per
subject/condition/region cell.

Usage:
  cargo run --bin hab_map                      # discover neurohab.toml
  cargo run --bin hab_map -- <path/to/config>  # explicit config file

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use neurohab::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 2 || args.get(1).map(|a| a == "--help" || a == "-h").unwrap_or(false) {
        eprintln!("Usage: {} [config_path]", args[0]);
        eprintln!("\nWithout an argument, neurohab.toml is discovered from the");
        eprintln!("NEUROHAB_CONFIG_PATH environment variable or the current directory.");
        std::process::exit(1);
    }

    let config_path = args.get(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    validate_config(&config)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let subjects = config.study.subject_list();
    let pad = config.study.effective_pad_width();

    println!("🧠 NEUROHAB Habituation Mapper");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:    {}", config.study.input_dir.display());
    println!("📂 Output:   {}", config.study.output_dir.display());
    println!(
        "   Subjects: {}   Blocks: {}   Regions: {}   Pad: {}",
        subjects.len(),
        config.study.conditions.len(),
        config.study.regions.len(),
        pad
    );
    println!("   Method:   {:?}", config.run.method);
    println!();

    let files = scan_input_dir(&config.study.input_dir)?;
    println!("📖 Found {} candidate volumes", files.len());

    let index = FileIndex::build(
        &files,
        &config.study.conditions,
        &config.study.regions,
        &subjects,
        pad,
    );

    let source = NiftiSource::new(config.volume.shape);
    let grid = match config.run.method {
        HabMethod::Reg => reg(&source, &index, config.run.replace_nan)?,
        HabMethod::Fml => fml(&source, &index)?,
    };

    std::fs::create_dir_all(&config.study.output_dir)?;
    save_maps(
        &config.study.output_dir,
        &grid,
        config.volume.shape,
        config.volume.affine,
        pad,
    )?;

    println!(
        "✅ Wrote {} habituation maps to {}",
        grid.len(),
        config.study.output_dir.display()
    );
    Ok(())
}

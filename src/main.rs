//! Main entry point for the mlx-remove-code CLI application.

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use mlx_remove_code::{Cli, logging, process_mlx_file};

/// Application entry point.
///
/// Work is strictly sequential, so a single-threaded runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level());

    let output_file = cli.output_file();
    let config = cli.config();

    process_mlx_file(Path::new(&cli.input_file), Path::new(&output_file), &config).await?;

    println!("Processed {} and created {}", cli.input_file, output_file);
    Ok(())
}

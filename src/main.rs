use std::fs;
use std::fs::File;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use materializer::config::{Cli, Settings};
use materializer::pipeline::materialize;
use tracing::error;
use tracing_subscriber::EnvFilter;


fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_cli(cli)?;

    let document = fs::read_to_string(&settings.mapping_file)?;
    let plan = materializer::compile(&document)?;
    println!("Compiled {} triples map(s) from {}", plan.triples_maps.len(), settings.mapping_file);

    let out = File::create(&settings.output_file)?;

    let start = Instant::now();
    let summary = materialize(&plan, &settings.run_options(), out)?;
    let elapsed = start.elapsed();

    println!("Wrote {} quads to {} in {} ms", summary.written, settings.output_file, elapsed.as_millis());
    if settings.dedup {
        println!("Dropped {} duplicate quads ({}-bit hashes)", summary.duplicates, summary.width.bits());
    }

    Ok(())
}

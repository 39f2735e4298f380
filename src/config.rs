//! Operator surface: CLI flags and the optional key=value config file.
//!
//! The config file, when given, wins over every other flag, mirroring how
//! the engine is driven in batch setups.

use std::fs;

use clap::Parser;

use crate::dedup::HashWidth;
use crate::errors::ConfigError;
use crate::pipeline::RunOptions;
use crate::template::SkipTokens;


#[derive(Parser, Debug, Default)]
#[command(name = "materializer", about = "Materialize an RDF graph from CSV sources using an RML mapping")]
pub struct Cli {
    /// Path to the RML mapping document.
    #[arg(short = 'm', value_name = "PATH")]
    pub mapping: Option<String>,

    /// Output path for the generated N-Quads.
    #[arg(short = 'o', value_name = "PATH", default_value = "output.nq")]
    pub output: String,

    /// Deduplicate whole quads before writing.
    #[arg(short = 'd')]
    pub dedup: bool,

    /// Run one worker per triples map.
    #[arg(short = 't')]
    pub threading: bool,

    /// Thread count; 0 means hardware concurrency.
    #[arg(long = "tc", value_name = "N", default_value_t = 0)]
    pub thread_count: usize,

    /// Pick the dedup hash width by sampling the inputs.
    #[arg(short = 'a')]
    pub adaptive: bool,

    /// Fixed dedup hash width in bits (32, 64 or 128); overrides -a.
    #[arg(short = 'b', value_name = "BITS")]
    pub hash_width: Option<u32>,

    /// Bernoulli sampling probability for the estimator.
    #[arg(short = 'p', value_name = "FLOAT", default_value_t = 0.05)]
    pub sampling_probability: f64,

    /// Comma-separated tokens treated as empty field values.
    #[arg(short = 'r', value_name = "CSV")]
    pub skip_tokens: Option<String>,

    /// key=value config file; overrides all other flags when present.
    #[arg(short = 'c', value_name = "PATH")]
    pub config: Option<String>,
}


/// The validated, merged run configuration.
#[derive(Debug)]
pub struct Settings {
    pub mapping_file: String,
    pub output_file: String,
    pub dedup: bool,
    pub threading: bool,
    pub thread_count: usize,
    pub adaptive: bool,
    pub hash_width: Option<HashWidth>,
    pub sampling_probability: f64,
    pub skip_tokens: SkipTokens,
}

impl Settings {
    pub fn from_cli(mut cli: Cli) -> Result<Settings, ConfigError> {
        if let Some(path) = cli.config.take() {
            let contents = fs::read_to_string(path)?;
            apply_config_file(&mut cli, &contents)?;
        }

        let mapping_file = cli.mapping.ok_or_else(|| ConfigError::InvalidValue {
            key: "m".to_string(),
            value: "the mapping file path is required".to_string(),
        })?;

        let hash_width = match cli.hash_width {
            None => None,
            Some(32) => Some(HashWidth::W32),
            Some(64) => Some(HashWidth::W64),
            Some(128) => Some(HashWidth::W128),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "b".to_string(),
                    value: other.to_string(),
                })
            }
        };

        if cli.sampling_probability <= 0.0 || cli.sampling_probability >= 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "p".to_string(),
                value: cli.sampling_probability.to_string(),
            });
        }

        Ok(Settings {
            mapping_file,
            output_file: cli.output,
            dedup: cli.dedup,
            threading: cli.threading,
            thread_count: cli.thread_count,
            adaptive: cli.adaptive,
            hash_width,
            sampling_probability: cli.sampling_probability,
            skip_tokens: cli
                .skip_tokens
                .as_deref()
                .map(SkipTokens::from_list)
                .unwrap_or_default(),
        })
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dedup: self.dedup,
            threading: self.threading,
            thread_count: self.thread_count,
            adaptive: self.adaptive,
            fixed_width: self.hash_width,
            sampling_probability: self.sampling_probability,
            skips: self.skip_tokens.clone(),
            ..RunOptions::default()
        }
    }
}

fn apply_config_file(cli: &mut Cli, contents: &str) -> Result<(), ConfigError> {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedLine(line.to_string()))?;
        let (key, value) = (key.trim(), value.trim());

        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "mapping" => cli.mapping = Some(value.to_string()),
            "output" => cli.output = value.to_string(),
            "dedup" => cli.dedup = value.parse().map_err(|_| invalid())?,
            "threading" => cli.threading = value.parse().map_err(|_| invalid())?,
            "thread_count" => cli.thread_count = value.parse().map_err(|_| invalid())?,
            "adaptive" => cli.adaptive = value.parse().map_err(|_| invalid())?,
            "hash_width" => cli.hash_width = Some(value.parse().map_err(|_| invalid())?),
            "sampling_probability" => cli.sampling_probability = value.parse().map_err(|_| invalid())?,
            "skip_tokens" => cli.skip_tokens = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
    }

    Ok(())
}

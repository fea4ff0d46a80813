//! DES3 host command-line interface
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use anyhow::anyhow;
use clap::Parser;
use des3_host::{
    config::DemoConfig,
    demo::{self, DemoReport},
    platforms::BackendKind,
    Des3HostResult,
};
use env_logger;
use log::{info, warn};
use std::{fs, io, path, process};

#[derive(Parser, Debug)]
#[clap(rename_all = "kebab")]
struct Args {
    /// TEE backend to drive the trusted application through
    #[arg(long, value_enum, default_value_t = BackendKind::default())]
    backend: BackendKind,

    /// Optional path to a JSON configuration file
    ///
    /// Recognised fields are "uuid", "key" and "iv" (hex) and "buffer_size".
    /// Flags given on the command line take precedence.
    #[arg(long)]
    config: Option<path::PathBuf>,

    /// UUID of the trusted application
    #[arg(long)]
    uuid: Option<String>,

    /// 24-byte Triple-DES key, in hex
    #[arg(long)]
    key: Option<String>,

    /// 8-byte initialization vector, in hex
    #[arg(long)]
    iv: Option<String>,

    /// Size of the buffer to encode and decode, a multiple of 8
    #[arg(long)]
    buffer_size: Option<usize>,
}

fn load_config(args: &Args) -> anyhow::Result<DemoConfig> {
    let config = match &args.config {
        Some(config_path) => {
            info!("Loading configuration {:?}", config_path);
            let json = fs::read_to_string(config_path).map_err(|err| anyhow!(err))?;
            DemoConfig::from_json(&json)?
        }
        None => DemoConfig::default(),
    };
    Ok(config.with_overrides(
        args.uuid.as_deref(),
        args.key.as_deref(),
        args.iv.as_deref(),
        args.buffer_size,
    )?)
}

#[cfg(feature = "tz")]
fn run_optee(config: &DemoConfig, out: &mut impl io::Write) -> Des3HostResult<DemoReport> {
    demo::run(&des3_host::platforms::optee::OpteeBackend, config, out)
}

#[cfg(not(feature = "tz"))]
fn run_optee(_config: &DemoConfig, _out: &mut impl io::Write) -> Des3HostResult<DemoReport> {
    Err(des3_host::Des3HostError::BackendUnavailable("optee"))
}

#[cfg(feature = "sim")]
fn run_simulator(config: &DemoConfig, out: &mut impl io::Write) -> Des3HostResult<DemoReport> {
    demo::run(&des3_host::platforms::simulator::SimulatedTee::new(), config, out)
}

#[cfg(not(feature = "sim"))]
fn run_simulator(_config: &DemoConfig, _out: &mut impl io::Write) -> Des3HostResult<DemoReport> {
    Err(des3_host::Des3HostError::BackendUnavailable("simulator"))
}

/// Entry point
fn main() {
    // parse args
    let args = Args::parse();

    // setup logger
    env_logger::init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    info!("Running DES3 demo on the {} backend", args.backend);
    if args.backend == BackendKind::Simulator {
        warn!("The simulator runs in-process: no trusted application is involved");
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match args.backend {
        BackendKind::Optee => run_optee(&config, &mut out),
        BackendKind::Simulator => run_simulator(&config, &mut out),
    };
    match result {
        // A verification mismatch is already in the transcript.
        Ok(_) => {}
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_defaults() {
        let args = Args::try_parse_from(&[
            "des3-host",
            "--backend",
            "simulator",
            "--buffer-size",
            "64",
            "--iv",
            "0000000000000000",
        ])
        .unwrap();
        assert_eq!(args.backend, BackendKind::Simulator);
        let config = load_config(&args).unwrap();
        assert_eq!(config.buffer_size, 64);
        assert_eq!(config.iv, vec![0; 8]);
        assert_eq!(config.key, DemoConfig::default().key);
    }

    #[test]
    fn unknown_backend_is_a_usage_error() {
        assert!(Args::try_parse_from(&["des3-host", "--backend", "sgx"]).is_err());
    }

    #[test]
    fn invalid_override_fails_to_load() {
        let args = Args::try_parse_from(&["des3-host", "--buffer-size", "12"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}

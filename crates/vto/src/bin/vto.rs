use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vto::core::{compute_pose, compute_sizing, NodeIdAllocator, OccluderSpec, WindowSize};
use vto::occlusion::{build_occluder, InMemoryLoader, OcclusionError};
use vto::session::{ConfigError, ConfigIoError, VtoConfig};

#[derive(Parser, Debug)]
#[command(name = "vto")]
#[command(version)]
#[command(about = "Inspect virtual try-on mode and model tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Emit JSON log lines (tracing builds only)
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_log: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print (or write) the built-in configuration as JSON
    Config {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate a configuration file
    Check {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the tracker-space placement of a model
    Pose {
        #[arg(long)]
        model: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the canvas geometry for a window size
    Sizing {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Print the occluder a mode would attach
    Occluder {
        #[arg(long)]
        mode: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    ConfigIo(#[from] ConfigIoError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Occlusion(#[from] OcclusionError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to install logger: {0}")]
    Logger(String),
}

fn load_config(path: Option<&Path>) -> Result<VtoConfig, CliError> {
    match path {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            Ok(VtoConfig::load_json(path)?)
        }
        None => Ok(VtoConfig::builtin()),
    }
}

fn init_logging(cli: &Cli) -> Result<(), CliError> {
    #[cfg(feature = "tracing")]
    {
        let _ = cli.log_level;
        vto::core::init_tracing(cli.json_log);
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        vto::core::init_with_level(cli.log_level.into())
            .map_err(|e| CliError::Logger(e.to_string()))?;
        Ok(())
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config { out } => {
            let config = VtoConfig::builtin();
            match out {
                Some(path) => {
                    config.write_json(&path)?;
                    log::info!("wrote {}", path.display());
                }
                None => print_json(&config)?,
            }
        }
        Command::Check { config } => {
            let cfg = VtoConfig::load_json(&config)?;
            println!(
                "ok: {} modes, {} models, initial `{}`",
                cfg.modes.len(),
                cfg.models.len(),
                cfg.initial_model
            );
        }
        Command::Pose { model, config } => {
            let cfg = load_config(config.as_deref())?;
            let descriptor = cfg.model(&model)?;
            print_json(&compute_pose(descriptor))?;
        }
        Command::Sizing { width, height } => {
            print_json(&compute_sizing(WindowSize::new(width, height)))?;
        }
        Command::Occluder { mode, config } => {
            let cfg = load_config(config.as_deref())?;
            let spec = &cfg.mode(&mode)?.occluder;
            // Mesh occluders need the asset; only the reference is shown.
            let node = match spec {
                OccluderSpec::Model { .. } => None,
                _ => {
                    let mut ids = NodeIdAllocator::new();
                    build_occluder(spec, &mut InMemoryLoader::new(), &mut ids)?
                }
            };
            print_json(&serde_json::json!({
                "mode": mode,
                "spec": spec,
                "node": node,
            }))?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

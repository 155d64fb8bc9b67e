//! Strata Agent - Entry point
//!
//! Resolves the agent configuration, prints it as JSON and exits non-zero if
//! it cannot be resolved.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use strata_agent::{init_logging, resolve, BootstrapOptions, LogConfig, LogFormat};
use strata_config::{Classpath, FailurePolicy, SystemProperties};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "strata-agent",
    version,
    about = "Resolve the Strata agent configuration",
    after_help = "ENVIRONMENT VARIABLES:\n    STRATA_PORT          Agent port (default: 8080)\n    STRATA_WATCH_PATHS   Comma separated folders to watch\n    CONFIG_CLASSPATH     Classpath roots when --classpath is not given"
)]
struct Cli {
    /// YAML configuration file, consulted before classpath resources.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Define a system property.
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    define: Vec<String>,

    /// Classpath root directory (repeatable).
    #[arg(long, value_name = "DIR")]
    classpath: Vec<PathBuf>,

    /// Skip sources whose data is rejected instead of aborting.
    #[arg(long)]
    fall_through: bool,

    /// Verbose logging with file and line info.
    #[arg(long)]
    dev: bool,

    /// Log filter directive [default: info, debug with --dev].
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format [default: pretty].
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn bootstrap_options(&self) -> BootstrapOptions {
        let classpath = if self.classpath.is_empty() {
            Classpath::from_env()
        } else {
            self.classpath
                .iter()
                .fold(Classpath::new(), |classpath, root| classpath.with_root(root))
        };

        BootstrapOptions {
            config_file: self.config.clone(),
            classpath,
            failure_policy: if self.fall_through {
                FailurePolicy::FallThrough
            } else {
                FailurePolicy::Abort
            },
        }
    }

    fn log_config(&self) -> LogConfig {
        let base = if self.dev {
            LogConfig::development()
        } else {
            LogConfig::default()
        };
        LogConfig {
            level: self.log_level.clone().unwrap_or_else(|| base.level.clone()),
            format: self.log_format.unwrap_or(base.format),
            ..base
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    for definition in &cli.define {
        SystemProperties::define(definition)
            .with_context(|| format!("invalid system property definition `{definition}`"))?;
    }

    let resolution = resolve(&cli.bootstrap_options()).context("failed to resolve agent configuration")?;
    println!("{}", resolution.to_json()?);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_config()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    info!("Starting Strata agent v{}", strata_agent::VERSION);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

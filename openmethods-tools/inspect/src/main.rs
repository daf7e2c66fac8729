//! om-inspect Binary
//!
//! Run with: `om-inspect [COMMAND]`

mod samples;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use openmethods::{AmbiguityPolicy, HierarchyCheck, RebuildOptions, UnknownClassPolicy};
use tracing::info;
use tracing_subscriber::EnvFilter;

use samples::Sample;

#[derive(Parser)]
#[command(name = "om-inspect")]
#[command(about = "Build sample open-method registries and print their dispatch tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Rebuild options file (TOML)
    #[arg(short, long, global = true, env = "OM_INSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled samples
    List,

    /// Build a sample and print its report
    Build {
        /// Sample to build
        #[arg(value_enum)]
        sample: Sample,

        /// Print the compiled tables
        #[arg(short, long)]
        tables: bool,

        /// Call every method on every sample class and print the outcomes
        #[arg(short, long)]
        probe: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the effective rebuild options
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Command-line overrides of the rebuild options.
#[derive(Args)]
struct Overrides {
    /// How to treat ambiguous combinations
    #[arg(long, value_enum)]
    ambiguity: Option<AmbiguityArg>,

    /// How to treat declared bases never registered with their derived class
    #[arg(long, value_enum)]
    hierarchy_check: Option<HierarchyArg>,

    /// What a call does with a class missing from the table
    #[arg(long, value_enum)]
    unknown_class: Option<UnknownClassArg>,

    /// Log every compiled table
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum AmbiguityArg {
    Fail,
    Defer,
}

#[derive(Clone, Copy, ValueEnum)]
enum HierarchyArg {
    Ignore,
    Warn,
    Deny,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnknownClassArg {
    Abort,
    Error,
}

impl Overrides {
    fn apply(&self, mut options: RebuildOptions) -> RebuildOptions {
        if let Some(ambiguity) = self.ambiguity {
            options.ambiguity = match ambiguity {
                AmbiguityArg::Fail => AmbiguityPolicy::Fail,
                AmbiguityArg::Defer => AmbiguityPolicy::Defer,
            };
        }
        if let Some(check) = self.hierarchy_check {
            options.hierarchy_check = match check {
                HierarchyArg::Ignore => HierarchyCheck::Ignore,
                HierarchyArg::Warn => HierarchyCheck::Warn,
                HierarchyArg::Deny => HierarchyCheck::Deny,
            };
        }
        if let Some(policy) = self.unknown_class {
            options.unknown_class = match policy {
                UnknownClassArg::Abort => UnknownClassPolicy::Abort,
                UnknownClassArg::Error => UnknownClassPolicy::Error,
            };
        }
        if self.trace {
            options.trace = true;
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Build {
            sample,
            tables,
            probe,
            overrides,
        } => {
            let options = overrides.apply(load_options(cli.config.as_deref())?);
            cmd_build(sample, &options, tables, probe)
        }
        Commands::Config { overrides } => {
            let options = overrides.apply(load_options(cli.config.as_deref())?);
            cmd_config(&options)
        }
    }
}

/// Options from the config file if given, the environment otherwise.
///
/// Without a file, unknown classes are reported rather than aborting, so
/// probing the split sample prints every outcome.
fn load_options(path: Option<&Path>) -> Result<RebuildOptions> {
    match path {
        Some(path) => {
            info!("Loading options from {}", path.display());
            let options = RebuildOptions::from_file(path)
                .with_context(|| format!("Failed to load options: {}", path.display()))?;
            Ok(options.with_env())
        }
        None => Ok(RebuildOptions::from_env().with_unknown_class(UnknownClassPolicy::Error)),
    }
}

fn cmd_list() -> Result<()> {
    for sample in Sample::value_variants() {
        if let Some(value) = sample.to_possible_value() {
            let help = value.get_help().map(ToString::to_string).unwrap_or_default();
            println!("{:<10} {}", value.get_name(), help);
        }
    }
    Ok(())
}

fn cmd_build(sample: Sample, options: &RebuildOptions, tables: bool, probe: bool) -> Result<()> {
    info!("Building sample {:?}", sample);
    let built = sample
        .build()
        .with_context(|| format!("Failed to register sample {sample:?}"))?;
    let dispatcher = built
        .registry
        .update_methods_with(options)
        .with_context(|| format!("Failed to build sample {sample:?}"))?;

    print!("{}", dispatcher.report());

    if tables {
        println!();
        print!("{}", dispatcher.describe());
    }

    if probe {
        println!();
        for (label, outcome) in built.probe(&dispatcher) {
            match outcome {
                Ok(value) => println!("{label} = {value}"),
                Err(err) => println!("{label} ! {err}"),
            }
        }
    }
    Ok(())
}

fn cmd_config(options: &RebuildOptions) -> Result<()> {
    let text = options
        .to_toml_string()
        .context("Failed to serialize options")?;
    print!("{text}");
    Ok(())
}

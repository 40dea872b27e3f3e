use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use mixer::{
    compose_catalog, describe_catalog, load_catalog, resolve_options, save_catalog, CatalogFormat,
    Selection,
};

#[derive(Parser)]
#[command(name = "mixer")]
#[command(about = "Compose class-like units from mixin parts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose mixin targets of a catalog
    Compose {
        /// Input catalog (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Compose only this unit
        #[arg(short, long)]
        target: Option<String>,

        /// Parts to compose the target from, overriding its declared mixins
        #[arg(short, long, value_delimiter = ',', requires = "target")]
        parts: Vec<String>,

        /// Output catalog; printed in the input format when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Composition options file (TOML)
        #[arg(short, long, env = "MIXER_CONFIG")]
        config: Option<PathBuf>,

        /// How to treat fields already present in the target (keep-all, keep-first, reject)
        #[arg(long)]
        field_policy: Option<String>,

        /// Do not record where composed members came from
        #[arg(long)]
        no_trace: bool,
    },

    /// List the units of a catalog and their declared mixins
    Inspect {
        /// Input catalog (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compose {
            input,
            target,
            parts,
            output,
            config,
            field_policy,
            no_trace,
        } => {
            let options = resolve_options(config.as_deref(), field_policy.as_deref(), no_trace)?;
            let mut catalog = load_catalog(&input)?;
            let composed = compose_catalog(&mut catalog, &Selection { target, parts }, options)?;

            for (name, summary) in &composed {
                info!(
                    "{}: {} method(s), {} terminator(s), {} field(s), {} binding(s), {} retyped reference(s)",
                    name,
                    summary.methods,
                    summary.terminators,
                    summary.fields,
                    summary.bindings,
                    summary.type_refs
                );
            }

            match output {
                Some(path) => save_catalog(&path, &catalog),
                None => {
                    print!("{}", CatalogFormat::from_path(&input)?.render(&catalog)?);
                    Ok(())
                }
            }
        }
        Commands::Inspect { input } => {
            let catalog = load_catalog(&input)?;
            print!("{}", describe_catalog(&catalog));
            Ok(())
        }
    }
}

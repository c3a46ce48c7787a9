//! Type Registry CLI
//!
//! Loads a type manifest into a registry and inspects the result.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use foreign_type_registry::{Manifest, RegistryConfig, TypeRegistry, TypeVersion};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "type-registry")]
#[command(about = "Inspect versioned foreign type descriptors")]
struct Cli {
    /// Type manifest (TOML, or JSON by extension)
    #[arg(short, long, default_value = "types.toml")]
    manifest: PathBuf,

    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which historical versions each type still reads
    Matrix {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate registry statistics
    Stats,

    /// Show the version history of a type
    History {
        name: String,
    },

    /// Check whether data at a version is readable, and whether it needs migration
    Check {
        name: String,
        #[arg(value_name = "VERSION")]
        data_version: TypeVersion,
    },

    /// Check a buffer size against a type's validation rule
    Validate {
        name: String,
        #[arg(short, long)]
        size: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match RegistryConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: RegistryConfig) -> anyhow::Result<()> {
    let manifest = Manifest::load(&cli.manifest)
        .with_context(|| format!("loading manifest {}", cli.manifest.display()))?;

    let mut registry = TypeRegistry::with_config(config);
    for applied in manifest.apply(&mut registry) {
        if let Err(e) = applied.result {
            eprintln!("⚠️  {} v{} skipped: {}", applied.name, applied.version, e);
        }
    }

    match cli.command {
        Commands::Matrix { json } => {
            let matrix = registry.build_compatibility_matrix();
            if json {
                println!("{}", matrix.to_json_pretty()?);
                return Ok(());
            }

            for entry in matrix.iter() {
                let readable: Vec<String> =
                    entry.compatible_versions.iter().map(|v| v.to_string()).collect();
                println!(
                    "{} v{} (floor v{}{})",
                    entry.name,
                    entry.current,
                    entry.min_compatible,
                    if entry.supports_migration { ", migratable" } else { "" }
                );
                println!("   └─ reads: {}", readable.join(", "));
            }
            Ok(())
        }

        Commands::Stats => {
            let stats = registry.statistics();
            println!("📊 {}", stats);
            println!("   default size policy: {}", registry.config().validation.default_policy);
            Ok(())
        }

        Commands::History { name } => {
            let Some(history) = registry.history(&name) else {
                bail!("unknown type '{}'", name);
            };
            for v in history {
                println!("v{}", v);
            }
            Ok(())
        }

        Commands::Check { name, data_version: version } => {
            let descriptor = registry
                .lookup(&name, Some(&version))?
                .with_context(|| format!("unknown type '{}'", name))?;

            if descriptor.needs_migration(&version) {
                println!(
                    "🔄 {} v{} is readable after migration to v{}",
                    name, version, descriptor.version
                );
            } else {
                println!("✅ {} v{} is readable by v{}", name, version, descriptor.version);
            }
            Ok(())
        }

        Commands::Validate { name, size } => {
            if !registry.contains(&name) {
                bail!("unknown type '{}'", name);
            }
            let buffer = vec![0u8; size];
            if registry.validate(&name, &buffer, size) {
                println!("✅ {} accepts {} bytes", name, size);
                Ok(())
            } else {
                println!("❌ {} rejects {} bytes", name, size);
                std::process::exit(1);
            }
        }
    }
}

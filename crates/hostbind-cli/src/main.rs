//! hostbind command-line tool
//!
//! Inspects the IDL document a host publishes and dry-runs the binders
//! against it: document layout, path queries, type-string resolution,
//! inconsistent property records, and a bind report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hostbind_engine::{BindingConfig, IdlDocument};

mod commands;

#[derive(Parser)]
#[command(name = "hostbind")]
#[command(about = "Inspect host IDL documents and their bindings", long_about = None)]
#[command(version)]
struct Cli {
    /// IDL document (JSON)
    #[arg(long, global = true, default_value = "extension_api.json")]
    api: PathBuf,

    /// Binding configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the top-level sections of the document
    Layout,

    /// Pretty-print the node at a dotted path (`classes.Node.methods`)
    Query {
        /// Path from the document root; empty for the root
        #[arg(default_value = "")]
        path: String,
        /// Nesting levels printed before eliding
        #[arg(short = 'd', long, default_value_t = 2)]
        max_depth: usize,
        /// Print the raw JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Resolve IDL type-strings and show their property descriptors
    Resolve {
        /// Type-strings (`int`, `enum::Error`, `typedarray::Node`, ...)
        #[arg(required = true)]
        types: Vec<String>,
    },

    /// List property records whose type or accessors do not resolve
    BrokenProperties {
        /// Only check these classes
        classes: Vec<String>,
    },

    /// Bind classes against a host with no native handles and report
    /// every member that could not be bound
    Bind {
        /// Classes to bind; every class when empty
        classes: Vec<String>,
        /// Abort a class at its first failure
        #[arg(long)]
        strict: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<BindingConfig> {
    match path {
        Some(path) => BindingConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(BindingConfig::default()),
    }
}

fn load_api(path: &PathBuf) -> anyhow::Result<Arc<IdlDocument>> {
    let doc = IdlDocument::load(path)
        .with_context(|| format!("failed to load IDL document {}", path.display()))?;
    log::info!("loaded {}", path.display());
    Ok(Arc::new(doc))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let api = load_api(&cli.api)?;

    match cli.command {
        Commands::Layout => commands::layout::execute(&api),

        Commands::Query {
            path,
            max_depth,
            json,
        } => commands::query::execute(&api, &path, max_depth, json),

        Commands::Resolve { types } => commands::resolve::execute(api, &types),

        Commands::BrokenProperties { classes } => {
            let broken = commands::broken::execute(api, &classes)?;
            if broken > 0 {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Bind { classes, strict } => {
            let config = load_config(cli.config.as_ref())?;
            commands::bind::execute(api, config, &classes, strict)
        }
    }
}

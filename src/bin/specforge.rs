//! specforge CLI
//!
//! Loads store snapshots and data specifications from disk and generates
//! their artefacts into a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use specforge::store::JsonFileConnector;
use specforge::{
    ArtefactConfigurator, CancellationToken, DataSpecification, DirectoryOutputSink, FederatedStore, ForgeConfig,
    Generator, MemoryStore, OutputFormat,
};

#[derive(Parser)]
#[command(name = "specforge")]
#[command(about = "Generate schema artefacts from data specifications")]
struct Cli {
    /// Configuration file (defaults to specforge.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate artefacts of data specifications
    Generate {
        /// Directory of store snapshot files (*.json)
        #[arg(short, long)]
        stores: PathBuf,

        /// JSON file with an array of data specifications
        #[arg(short = 'S', long)]
        specifications: PathBuf,

        /// Output directory (overrides configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only this specification
        #[arg(long)]
        only: Option<String>,

        /// Base URL for default artefacts of specifications that list none
        #[arg(long, default_value = "")]
        base_url: String,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ForgeConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Generate {
            stores,
            specifications,
            output,
            only,
            base_url,
            compact,
        } => {
            let store = load_stores(&stores, &config.store.base_iri).await?;
            let specifications = load_specifications(&specifications, &base_url).await?;
            let targets: Vec<String> = match only {
                Some(iri) => vec![iri],
                None => specifications.iter().map(|specification| specification.iri.clone()).collect(),
            };

            let format = if compact { OutputFormat::Compact } else { config.output.format };
            let generator = Generator::new(
                Arc::new(store),
                specforge::specification::index_specifications(specifications),
            )
            .with_config(config.generation.clone())
            .with_format(format);

            let directory = output.unwrap_or_else(|| config.output_directory());
            let sink = DirectoryOutputSink::new(directory.clone());

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping after the current stage");
                    on_interrupt.cancel();
                }
            });

            for iri in &targets {
                let generated = generator
                    .generate_specification(iri, &sink, &cancel)
                    .await
                    .with_context(|| format!("failed to generate {}", iri))?;
                println!("{}: {} artefacts", iri, generated.len());
            }
            println!("Output written to {}", directory.display());
            Ok(())
        }
    }
}

/// Every snapshot file becomes one member of a federated store
async fn load_stores(directory: &Path, base_iri: &str) -> anyhow::Result<FederatedStore> {
    if !directory.is_dir() {
        bail!("store directory {} does not exist", directory.display());
    }

    let federated = FederatedStore::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |extension| extension != "json") {
            continue;
        }
        let store = MemoryStore::new(base_iri).with_connector(
            path.display().to_string(),
            Arc::new(JsonFileConnector::new(path)),
        );
        store
            .load()
            .await
            .with_context(|| format!("failed to load store {}", path.display()))?;
        federated.add_store(Arc::new(store)).await?;
        info!(path = %path.display(), "Loaded store");
    }
    Ok(federated)
}

async fn load_specifications(path: &Path, base_url: &str) -> anyhow::Result<Vec<DataSpecification>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut specifications: Vec<DataSpecification> = serde_json::from_str(&content)?;

    let configurator = ArtefactConfigurator::new(base_url);
    for specification in &mut specifications {
        if specification.artefacts.is_empty() {
            specification.artefacts = configurator.default_artefacts(specification);
        }
    }
    Ok(specifications)
}

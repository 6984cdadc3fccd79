use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use scanflow::engine::{ModeCode, Services};
use scanflow::{
    init_telemetry, shutdown_telemetry, warehouse_registry, InMemoryDocumentStore, ScanFlowConfig,
    ScanSession, TracingEffectExecutor, WarehouseBasis,
};

#[derive(Parser)]
#[command(name = "scanflow")]
#[command(about = "Barcode-driven scanning workflows for warehouse operators")]
#[command(long_about = "ScanFlow drives an operator through scan modes one barcode at a time. \
                       Use 'scanflow modes' to see what is registered and 'scanflow replay' to \
                       run a recorded scan script against a document file.")]
struct Cli {
    /// Configuration file (defaults to ./scanflow.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every registered mode with its states, commands and redirects as JSON
    Modes,
    /// Feed a scan script through one session, one JSON outcome per line
    Replay {
        /// Script with one barcode per line; blank lines and '#' comments are skipped
        script: PathBuf,
        /// JSON file with the documents the session may look up
        #[arg(long, help = "Documents as a JSON array or {\"documents\": [...]}")]
        documents: Option<PathBuf>,
        /// Mode to start in (defaults to engine.initial_mode)
        #[arg(long)]
        mode: Option<String>,
        /// Print the final session snapshot after the script
        #[arg(long)]
        snapshot: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    ScanFlowConfig::load_env_file().context("Failed to load .env file")?;
    let config = match &cli.config {
        Some(path) => ScanFlowConfig::load_from(path)?,
        None => ScanFlowConfig::load()?,
    };
    init_telemetry(&config.observability)?;

    let result = match cli.command {
        Commands::Modes => modes_command(&config),
        Commands::Replay {
            script,
            documents,
            mode,
            snapshot,
        } => replay_command(&config, &script, documents.as_deref(), mode, snapshot),
    };

    shutdown_telemetry();
    result
}

fn modes_command(config: &ScanFlowConfig) -> Result<()> {
    let registry = warehouse_registry(&config.printing)?;
    println!("{}", serde_json::to_string_pretty(&registry.describe())?);
    Ok(())
}

fn replay_command(
    config: &ScanFlowConfig,
    script: &std::path::Path,
    documents: Option<&std::path::Path>,
    mode: Option<String>,
    snapshot: bool,
) -> Result<()> {
    let lines = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read scan script {}", script.display()))?;
    let store = match documents {
        Some(path) => InMemoryDocumentStore::from_file(path)?,
        None => InMemoryDocumentStore::new(),
    };

    let registry = Arc::new(warehouse_registry(&config.printing)?);
    let services = Services::new(Arc::new(store), Arc::new(TracingEffectExecutor::new()));
    let initial_mode = ModeCode::from(mode.unwrap_or_else(|| config.engine.initial_mode.clone()));
    let mut session = ScanSession::new(registry, services, WarehouseBasis::default(), &initial_mode)?
        .with_settings(config.session_settings());

    for (index, line) in lines.lines().enumerate() {
        let scan = line.trim();
        if scan.is_empty() || scan.starts_with('#') {
            continue;
        }

        let record = match session.process_scan(scan) {
            Ok(outcome) => json!({ "line": index + 1, "scan": scan, "result": outcome }),
            Err(error) => json!({
                "line": index + 1,
                "scan": scan,
                "error": error.to_string(),
                "message": error.message().render(),
            }),
        };
        println!("{}", serde_json::to_string(&record)?);
    }

    if snapshot {
        let basis = serde_json::to_value(session.basis())?;
        let mut state = serde_json::to_value(session.snapshot())?;
        if let Some(map) = state.as_object_mut() {
            map.insert("basis".to_string(), basis);
        }
        println!("{}", serde_json::to_string(&state)?);
    }
    Ok(())
}

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::SessionSettings;

/// Main configuration structure for ScanFlow
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScanFlowConfig {
    /// Session host settings
    pub engine: EngineConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// What the print-labels command sends to the printer
    pub printing: PrintSetup,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Prefix that marks command, mode and control barcodes
    pub command_prefix: String,
    /// Size of the per-session report log
    pub max_reports: usize,
    /// Mode a new session starts in
    pub initial_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON lines instead of compact human output
    pub json_logs: bool,
}

/// Per-user print preferences
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrintSetup {
    pub print_labels_automatically: bool,
    /// Inventory labels report; labels are skipped when unset.
    /// Stored as an empty string when unset so a saved file keeps it off.
    #[serde(default, with = "report_id")]
    pub labels_report_id: Option<String>,
    pub print_receipt_automatically: bool,
    /// Purchase receipt report
    pub receipt_report_id: String,
}

mod report_id {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|id| !id.trim().is_empty()))
    }
}

impl Default for PrintSetup {
    fn default() -> Self {
        Self {
            print_labels_automatically: true,
            labels_report_id: Some("IN619200".to_string()),
            print_receipt_automatically: false,
            receipt_report_id: "PO646000".to_string(),
        }
    }
}

impl Default for ScanFlowConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                command_prefix: "@".to_string(),
                max_reports: 50,
                initial_mode: "RECV".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
            printing: PrintSetup::default(),
        }
    }
}

impl From<&EngineConfig> for SessionSettings {
    fn from(engine: &EngineConfig) -> Self {
        Self {
            command_prefix: engine.command_prefix.clone(),
            max_reports: engine.max_reports,
        }
    }
}

impl ScanFlowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (scanflow.toml)
    /// 3. Environment variables (prefixed with SCANFLOW_, `__` between levels)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("scanflow.toml"))
    }

    /// Same as [`ScanFlowConfig::load`] with an explicit file location
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Config::try_from(&ScanFlowConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("SCANFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let scanflow_config: ScanFlowConfig = config.try_deserialize()?;

        if scanflow_config.engine.max_reports == 0 {
            anyhow::bail!("engine.max_reports must be at least 1");
        }

        Ok(scanflow_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::from(&self.engine)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ScanFlowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = ScanFlowConfig::load_env_file();
        ScanFlowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ScanFlowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

// ScanFlow Library - Barcode-Driven Scanning Workflows
// This exposes the engine, the warehouse customization and the ambient stack

pub mod engine;
pub mod store;
pub mod warehouse;
pub mod config;
pub mod telemetry;

// Re-export key types for easy access
pub use engine::{
    EngineError, ModeCode, ModeRegistry, RegistryBuilder, ScanExtension, ScanMode, ScanOutcome,
    ScanSession, SessionSettings,
};
pub use store::{InMemoryDocumentStore, TracingEffectExecutor};
pub use warehouse::{warehouse_registry, WarehouseBasis};
pub use config::{ScanFlowConfig, PrintSetup, config, init_config};
pub use telemetry::{init_telemetry, shutdown_telemetry, generate_correlation_id, create_session_span};

// Scan Engine Module - Barcode-Driven Workflow State Machine
//
// Modes compose states, transitions, commands and redirects. A session drives
// one operator through them, validating every scan before it moves.

pub mod types;
pub mod errors;
pub mod traits;
pub mod state;
pub mod transition;
pub mod substitution;
pub mod command;
pub mod redirect;
pub mod lifecycle;
pub mod mode;
pub mod registry;
pub mod session;

#[cfg(test)]
pub mod mocks;

#[cfg(test)]
pub mod tests;

pub use command::{CommandContext, CommandInfo, ScanCommand};
pub use errors::{ConstructionError, EngineError, ValidationError};
pub use lifecycle::{RedirectOutcome, RedirectPhase};
pub use mode::{BoxedCommand, BoxedRedirect, BoxedState, BuiltMode, Capability, ModeDefinition, ScanMode};
pub use redirect::{ArmedRedirect, RedirectContext, ResumeToken, Resumption, ScanRedirect};
pub use registry::{ModeRegistry, ModeSummary, RegistryBuilder, ScanExtension};
pub use session::{ScanOutcome, ScanSession, SessionSettings, SessionSnapshot};
pub use state::{ScanContext, ScanState};
pub use substitution::StateSubstitutionRule;
pub use traits::{
    DocumentRecord, DocumentStatus, DocumentStore, EffectSource, Services, SideEffectError,
    SideEffectExecutor, SideEffectRequest, StoreError,
};
pub use transition::{state_flow, Next, StateFlow, Transition};
pub use types::{
    CommandCode, IdentifierScheme, Message, ModeCode, Position, RedirectCode, Report, ReportKind,
    ScannedValue, StateCode, ValueKind,
};

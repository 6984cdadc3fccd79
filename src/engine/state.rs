// A single step of a scan mode

use std::collections::BTreeMap;

use super::errors::ValidationError;
use super::traits::Services;
use super::types::{ModeCode, ScannedValue, StateCode, ValueKind};

/// Read-only view of a session handed to validation and enablement checks
pub struct ScanContext<'a, B> {
    pub basis: &'a B,
    pub services: &'a Services,
    pub mode: &'a ModeCode,
    pub values: &'a BTreeMap<StateCode, ScannedValue>,
}

impl<'a, B> ScanContext<'a, B> {
    pub fn value_of(&self, state: &str) -> Option<&'a ScannedValue> {
        self.values.get(&StateCode::from(state))
    }
}

/// One step of a workflow: parses and validates one unit of scanned input.
///
/// `validate` must not have side effects: it checks the raw scan for
/// well-formedness, then checks it against the basis and the document store.
/// Only after it succeeds does the host call `apply` to write the value into
/// the basis.
pub trait ScanState<B>: Send + Sync {
    fn code(&self) -> StateCode;

    fn expects(&self) -> ValueKind;

    fn validate(&self, raw: &str, ctx: &ScanContext<'_, B>) -> Result<ScannedValue, ValidationError>;

    /// Store an accepted value in the basis
    fn apply(&self, _value: &ScannedValue, _basis: &mut B) {}

    /// Clear what this state keeps in the basis.
    ///
    /// A full reset also clears identity fields that scope the whole mode.
    fn on_reset(&self, _basis: &mut B, _full_reset: bool) {}
}

// Cross-mode redirects: enter mode B from inside mode A, then resume A

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::errors::ValidationError;
use super::registry::ModeRegistry;
use super::state::ScanContext;
use super::substitution::StateSubstitutionRule;
use super::traits::Services;
use super::types::{ModeCode, RedirectCode, ScannedValue, StateCode};

/// Captured reference that lets a redirect resume its source mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(String);

impl ResumeToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the source mode is re-driven once the target completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumption {
    pub state: StateCode,
    pub value: String,
    pub rule: StateSubstitutionRule,
}

/// The session's single armed-redirect slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedRedirect {
    pub redirect: RedirectCode,
    pub source: ModeCode,
    pub target: ModeCode,
    pub token: ResumeToken,
}

/// Read-only view handed to redirect pre-checks
pub struct RedirectContext<'a, B> {
    pub basis: &'a B,
    pub services: &'a Services,
    pub source: &'a ModeCode,
    pub values: &'a BTreeMap<StateCode, ScannedValue>,
    registry: &'a ModeRegistry<B>,
}

impl<'a, B> RedirectContext<'a, B> {
    pub fn new(
        basis: &'a B,
        services: &'a Services,
        source: &'a ModeCode,
        values: &'a BTreeMap<StateCode, ScannedValue>,
        registry: &'a ModeRegistry<B>,
    ) -> Self {
        Self {
            basis,
            services,
            source,
            values,
            registry,
        }
    }

    /// Validate `raw` against a state of any registered mode without
    /// touching the session.
    pub fn try_validate(&self, mode: &str, state: &str, raw: &str) -> Result<ScannedValue, ValidationError> {
        let mode_code = ModeCode::from(mode);
        let scan_state = self
            .registry
            .get(&mode_code)
            .and_then(|built| built.state(&StateCode::from(state)))
            .ok_or_else(|| ValidationError::with_args("Mode {0} has no state {1}.", [mode, state]))?;

        let empty = BTreeMap::new();
        let ctx = ScanContext {
            basis: self.basis,
            services: self.services,
            mode: &mode_code,
            values: &empty,
        };
        scan_state.validate(raw, &ctx)
    }
}

/// A rule describing how to enter another mode from the mode that owns it.
///
/// Redirect definitions are shared by every session; whatever they need to
/// remember between `prepare` and `complete` goes into the returned
/// [`ResumeToken`], which the session keeps.
pub trait ScanRedirect<B>: Send + Sync {
    fn code(&self) -> RedirectCode;

    fn display_name(&self) -> &str;

    fn target_mode(&self) -> ModeCode;

    fn is_possible(&self, _ctx: &RedirectContext<'_, B>) -> bool {
        true
    }

    /// Pre-check run before leaving the source mode.
    ///
    /// `Err` vetoes the redirect. `Ok(Some(token))` arms post-completion
    /// compensation; `Ok(None)` enters the target without it.
    fn prepare(&self, ctx: &RedirectContext<'_, B>) -> Result<Option<ResumeToken>, ValidationError>;

    /// Called once the target mode completes while the token is armed
    fn complete(&self, _token: &ResumeToken) -> Option<Resumption> {
        None
    }
}

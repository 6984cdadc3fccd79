// Error taxonomy for the scanning engine
//
// Per-scan and per-command failures are values returned to the host; only a
// malformed mode definition is fatal, and it surfaces before any session runs.

use thiserror::Error;

use super::types::{CommandCode, Message, ModeCode, RedirectCode, StateCode};

/// A scan or record that a state refused.
///
/// Carries a message template and its arguments rather than a rendered string
/// so the operator layer can localize it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: Message,
}

impl ValidationError {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            message: Message::new(template),
        }
    }

    pub fn with_args<I, S>(template: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: Message::with_args(template, args),
        }
    }
}

impl From<Message> for ValidationError {
    fn from(message: Message) -> Self {
        Self { message }
    }
}

/// Invalid mode definitions detected while building the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("Mode {mode}: state {from} has conflicting transitions to {existing} and {conflicting}")]
    ConflictingTransition {
        mode: ModeCode,
        from: StateCode,
        existing: StateCode,
        conflicting: StateCode,
    },
    #[error("Mode {mode}: transition references unknown state {state}")]
    UnknownTransitionState { mode: ModeCode, state: StateCode },
    #[error("Mode {mode}: duplicate state {state}")]
    DuplicateState { mode: ModeCode, state: StateCode },
    #[error("Mode {mode}: duplicate command {command}")]
    DuplicateCommand { mode: ModeCode, command: CommandCode },
    #[error("Mode {mode}: duplicate redirect {redirect}")]
    DuplicateRedirect { mode: ModeCode, redirect: RedirectCode },
    #[error("Duplicate mode {0}")]
    DuplicateMode(ModeCode),
    #[error("Mode {0} defines no states")]
    EmptyMode(ModeCode),
    #[error("Mode {mode}: redirect {redirect} targets unknown mode {target}")]
    UnknownRedirectTarget {
        mode: ModeCode,
        redirect: RedirectCode,
        target: ModeCode,
    },
    #[error("No modes registered")]
    NoModes,
}

/// Errors returned by session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Redirect {redirect} vetoed: {reason}")]
    RedirectVeto {
        redirect: RedirectCode,
        reason: ValidationError,
    },
    #[error("Redirect {redirect} is not possible in the current context")]
    RedirectNotPossible { redirect: RedirectCode },
    #[error("Redirect {armed} is still pending; cannot arm {requested}")]
    RedirectAlreadyArmed {
        armed: RedirectCode,
        requested: RedirectCode,
    },
    #[error("Command {command} failed{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    CommandFailure {
        command: CommandCode,
        reason: Option<ValidationError>,
    },
    #[error("Command {0} is disabled")]
    CommandDisabled(CommandCode),
    #[error("Unknown mode {0}")]
    UnknownMode(ModeCode),
    #[error("Mode {mode} has no state {state}")]
    UnknownState { mode: ModeCode, state: StateCode },
    #[error("Mode {mode} has no command {command}")]
    UnknownCommand { mode: ModeCode, command: CommandCode },
    #[error("Mode {mode} has no redirect {redirect}")]
    UnknownRedirect {
        mode: ModeCode,
        redirect: RedirectCode,
    },
    #[error("Mode definition error: {0}")]
    Construction(#[from] ConstructionError),
}

impl EngineError {
    /// Whether the operator can simply retry; construction errors are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Construction(_))
    }

    /// The operator-facing message for this error
    pub fn message(&self) -> Message {
        match self {
            EngineError::Validation(v) | EngineError::RedirectVeto { reason: v, .. } => {
                v.message.clone()
            }
            EngineError::CommandFailure {
                reason: Some(v), ..
            } => v.message.clone(),
            other => Message::new(other.to_string()),
        }
    }
}

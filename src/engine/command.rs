// Operator commands available while a mode is active

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::ValidationError;
use super::state::ScanContext;
use super::traits::Services;
use super::types::{CommandCode, Message, ModeCode, RedirectCode, Report, ScannedValue, StateCode};

/// Mutable view handed to a running command.
///
/// `basis` is a working copy: the host commits it only if the command
/// succeeds, so a failing command never leaves partial changes behind.
pub struct CommandContext<'a, B> {
    pub basis: &'a mut B,
    pub services: &'a Services,
    pub mode: &'a ModeCode,
    pub values: &'a BTreeMap<StateCode, ScannedValue>,
    reports: Vec<Report>,
    redirect: Option<RedirectCode>,
}

impl<'a, B> CommandContext<'a, B> {
    pub fn new(
        basis: &'a mut B,
        services: &'a Services,
        mode: &'a ModeCode,
        values: &'a BTreeMap<StateCode, ScannedValue>,
    ) -> Self {
        Self {
            basis,
            services,
            mode,
            values,
            reports: Vec::new(),
            redirect: None,
        }
    }

    pub fn report_info(&mut self, message: Message) {
        self.reports.push(Report::info(message));
    }

    pub fn report_warning(&mut self, message: Message) {
        self.reports.push(Report::warning(message));
    }

    /// Ask the host to enter another mode through one of the current mode's
    /// redirects once the command succeeds.
    pub fn redirect_to(&mut self, redirect: impl Into<RedirectCode>) {
        self.redirect = Some(redirect.into());
    }

    pub(crate) fn into_outcome(self) -> (Vec<Report>, Option<RedirectCode>) {
        (self.reports, self.redirect)
    }
}

/// An out-of-band operator action (a button on the scanner screen)
pub trait ScanCommand<B>: Send + Sync {
    fn code(&self) -> CommandCode;

    fn button_name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Evaluated fresh before every render and before execution
    fn is_enabled(&self, _ctx: &ScanContext<'_, B>) -> bool {
        true
    }

    /// Run the command. `Ok(false)` and `Err(_)` both count as failure.
    fn process(&self, ctx: &mut CommandContext<'_, B>) -> Result<bool, ValidationError>;
}

/// Render-ready description of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub code: CommandCode,
    pub button_name: String,
    pub display_name: String,
    pub enabled: bool,
}

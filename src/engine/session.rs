// Session host - owns the active mode, the state pointer, scanned values,
// the basis and the armed-redirect slot of one operator workflow

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::command::{CommandContext, CommandInfo};
use super::errors::EngineError;
use super::lifecycle::{RedirectEvent, RedirectOutcome, RedirectPhase, RedirectTracker};
use super::mode::BuiltMode;
use super::redirect::{ArmedRedirect, RedirectContext};
use super::registry::ModeRegistry;
use super::state::ScanContext;
use super::substitution::StateSubstitutionRule;
use super::traits::Services;
use super::transition::Next;
use super::types::{
    CommandCode, Message, ModeCode, Position, RedirectCode, Report, ScannedValue, StateCode,
};

const CANCEL_BARCODE: &str = "CANCEL";
const RESET_BARCODE: &str = "RESET";

/// Per-session knobs, usually taken from `EngineConfig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Marks a scan as a command, mode or control barcode
    pub command_prefix: String,
    /// Oldest reports are dropped past this many
    pub max_reports: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            command_prefix: "@".to_string(),
            max_reports: 50,
        }
    }
}

/// What a scan or an operator action did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Accepted {
        state: StateCode,
        value: ScannedValue,
        next: Position,
    },
    ModeCompleted {
        completed: ModeCode,
        mode: ModeCode,
        position: Position,
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect: Option<RedirectOutcome>,
    },
    CommandExecuted {
        command: CommandCode,
        mode: ModeCode,
    },
    RedirectEntered {
        redirect: RedirectCode,
        mode: ModeCode,
        armed: bool,
    },
    ModeSwitched {
        mode: ModeCode,
    },
    Cancelled {
        cancelled: ModeCode,
        mode: ModeCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect: Option<RedirectOutcome>,
    },
    Reset {
        full: bool,
    },
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mode: ModeCode,
    pub position: Position,
    pub values: BTreeMap<StateCode, ScannedValue>,
    pub reports: Vec<Report>,
    pub armed: Option<ArmedRedirect>,
    pub redirect_phase: RedirectPhase,
    pub last_redirect_outcome: Option<RedirectOutcome>,
}

/// One operator's workflow instance.
///
/// Everything runs synchronously: a scan or a command is fully processed,
/// including any external lookups, before the next one is accepted. Failed
/// operations push an error report and leave mode, pointer, basis and the
/// redirect slot as they were.
pub struct ScanSession<B> {
    id: Uuid,
    registry: Arc<ModeRegistry<B>>,
    services: Services,
    settings: SessionSettings,
    basis: B,
    mode: Arc<BuiltMode<B>>,
    position: Position,
    values: BTreeMap<StateCode, ScannedValue>,
    reports: Vec<Report>,
    armed: Option<ArmedRedirect>,
    tracker: RedirectTracker,
    span: tracing::Span,
}

impl<B: Clone + 'static> ScanSession<B> {
    pub fn new(
        registry: Arc<ModeRegistry<B>>,
        services: Services,
        basis: B,
        initial_mode: &ModeCode,
    ) -> Result<Self, EngineError> {
        let mode = registry
            .get_shared(initial_mode)
            .ok_or_else(|| EngineError::UnknownMode(initial_mode.clone()))?;
        let id = Uuid::new_v4();
        let span = crate::telemetry::create_session_span(&id.to_string(), initial_mode.as_str());
        let position = Position::At(mode.default_state().clone());

        tracing::info!(session_id = %id, mode = %initial_mode, "Scan session started");
        Ok(Self {
            id,
            registry,
            services,
            settings: SessionSettings::default(),
            basis,
            mode,
            position,
            values: BTreeMap::new(),
            reports: Vec::new(),
            armed: None,
            tracker: RedirectTracker::default(),
            span,
        })
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Route one raw scan: control, command, redirect and mode barcodes
    /// first, anything else is a value for the current state.
    pub fn process_scan(&mut self, raw: &str) -> Result<ScanOutcome, EngineError> {
        let span = self.span.clone();
        let _enter = span.enter();
        let raw = raw.trim();

        let prefix = self.settings.command_prefix.clone();
        let code = match raw.strip_prefix(prefix.as_str()) {
            Some(code) if !prefix.is_empty() => code.trim(),
            _ => return self.process_value(raw),
        };

        if code == CANCEL_BARCODE {
            return self.cancel();
        }
        if code == RESET_BARCODE {
            return Ok(self.reset(true));
        }
        let command = CommandCode::from(code);
        if self.mode.command(&command).is_some() {
            return self.execute_command(&command);
        }
        let redirect = RedirectCode::from(code);
        if self.mode.redirect(&redirect).is_some() {
            return self.redirect(&redirect);
        }
        let mode = ModeCode::from(code);
        if self.registry.contains(&mode) {
            return self.switch_mode(&mode);
        }

        let error = EngineError::UnknownCommand {
            mode: self.mode.code().clone(),
            command,
        };
        Err(self.fail(error))
    }

    /// Validate `raw` against the current state and advance on success
    pub fn process_value(&mut self, raw: &str) -> Result<ScanOutcome, EngineError> {
        let mode = Arc::clone(&self.mode);
        let state = self.current_state().clone();

        let value = match self.accept(&mode, &state, raw) {
            Ok(value) => value,
            Err(error) => return Err(self.fail(error)),
        };

        match mode.next(&state) {
            Next::State(next) => {
                tracing::info!(
                    session_id = %self.id,
                    mode = %mode.code(),
                    from = %state,
                    to = %next,
                    "State advanced"
                );
                self.position = Position::At(next);
                Ok(ScanOutcome::Accepted {
                    state,
                    value,
                    next: self.position.clone(),
                })
            }
            Next::Complete => {
                self.position = Position::Completed;
                Ok(self.on_mode_completed())
            }
        }
    }

    /// Check the armed redirect against the current position.
    ///
    /// Runs whenever the session re-enters a decision point. Completion of
    /// the target replays into the source once; cancellation abandons the
    /// token without replay. Either way the slot is empty afterwards, so a
    /// second poll is a no-op.
    pub fn poll_redirect(&mut self) -> Option<RedirectOutcome> {
        let targets_current = self
            .armed
            .as_ref()
            .is_some_and(|armed| &armed.target == self.mode.code());
        if !targets_current {
            return None;
        }

        match self.position.clone() {
            Position::Completed => {
                let armed = self.armed.take()?;
                Some(self.resume(armed))
            }
            Position::Cancelled => {
                let armed = self.armed.take()?;
                Some(self.abandon(armed))
            }
            Position::At(_) => None,
        }
    }

    pub fn execute_command(&mut self, code: &CommandCode) -> Result<ScanOutcome, EngineError> {
        let mode = Arc::clone(&self.mode);
        let Some(command) = mode.command(code) else {
            let error = EngineError::UnknownCommand {
                mode: mode.code().clone(),
                command: code.clone(),
            };
            return Err(self.fail(error));
        };

        if !command.is_enabled(&self.scan_context(mode.code())) {
            return Err(self.fail(EngineError::CommandDisabled(code.clone())));
        }

        let mut working = self.basis.clone();
        let mut ctx = CommandContext::new(&mut working, &self.services, mode.code(), &self.values);
        let result = command.process(&mut ctx);
        let (reports, redirect) = ctx.into_outcome();

        let failure = match result {
            Ok(true) => None,
            Ok(false) => Some(None),
            Err(reason) => Some(Some(reason)),
        };
        if let Some(reason) = failure {
            tracing::debug!(session_id = %self.id, command = %code, "Command failed; working basis discarded");
            let error = EngineError::CommandFailure {
                command: code.clone(),
                reason,
            };
            return Err(self.fail(error));
        }

        let previous = std::mem::replace(&mut self.basis, working);
        if let Some(redirect) = redirect {
            if let Err(error) = self.redirect(&redirect) {
                self.basis = previous;
                return Err(error);
            }
        }
        for report in reports {
            self.push_report(report);
        }

        tracing::info!(session_id = %self.id, mode = %mode.code(), command = %code, "Command executed");
        Ok(ScanOutcome::CommandExecuted {
            command: code.clone(),
            mode: self.mode.code().clone(),
        })
    }

    /// Enter another mode through one of the current mode's redirects.
    ///
    /// Either the target is entered (with the token armed when `prepare`
    /// returned one) or nothing changes.
    pub fn redirect(&mut self, code: &RedirectCode) -> Result<ScanOutcome, EngineError> {
        let mode = Arc::clone(&self.mode);
        let Some(redirect) = mode.redirect(code) else {
            let error = EngineError::UnknownRedirect {
                mode: mode.code().clone(),
                redirect: code.clone(),
            };
            return Err(self.fail(error));
        };

        if let Some(armed) = &self.armed {
            let error = EngineError::RedirectAlreadyArmed {
                armed: armed.redirect.clone(),
                requested: code.clone(),
            };
            return Err(self.fail(error));
        }

        let target = redirect.target_mode();
        let Some(target_mode) = self.registry.get_shared(&target) else {
            return Err(self.fail(EngineError::UnknownMode(target)));
        };

        let registry = Arc::clone(&self.registry);
        let ctx = RedirectContext::new(&self.basis, &self.services, mode.code(), &self.values, &registry);
        if !redirect.is_possible(&ctx) {
            return Err(self.fail(EngineError::RedirectNotPossible { redirect: code.clone() }));
        }

        self.tracker.handle(RedirectEvent::Prepare { redirect: code.clone() });
        let prepared = redirect.prepare(&ctx);
        let token = match prepared {
            Ok(token) => token,
            Err(reason) => {
                self.tracker.handle(RedirectEvent::Veto);
                tracing::info!(session_id = %self.id, redirect = %code, reason = %reason, "Redirect vetoed");
                let error = EngineError::RedirectVeto {
                    redirect: code.clone(),
                    reason,
                };
                return Err(self.fail(error));
            }
        };

        self.enter_mode(target_mode);
        let armed = token.is_some();
        match token {
            Some(token) => {
                self.armed = Some(ArmedRedirect {
                    redirect: code.clone(),
                    source: mode.code().clone(),
                    target: target.clone(),
                    token,
                });
                self.tracker.handle(RedirectEvent::EnterArmed);
            }
            None => self.tracker.handle(RedirectEvent::EnterUnarmed),
        }

        tracing::info!(
            session_id = %self.id,
            redirect = %code,
            source = %mode.code(),
            target = %target,
            armed,
            "Redirect entered"
        );
        Ok(ScanOutcome::RedirectEntered {
            redirect: code.clone(),
            mode: target,
            armed,
        })
    }

    /// Operator mode switch. Leaving a redirect target this way abandons it.
    pub fn switch_mode(&mut self, code: &ModeCode) -> Result<ScanOutcome, EngineError> {
        let Some(target) = self.registry.get_shared(code) else {
            return Err(self.fail(EngineError::UnknownMode(code.clone())));
        };

        if let Some(armed) = self.armed.take() {
            self.tracker.handle(RedirectEvent::Abandon);
            tracing::info!(
                session_id = %self.id,
                redirect = %armed.redirect,
                token = %armed.token,
                "Redirect abandoned by mode switch"
            );
        }

        self.enter_mode(target);
        Ok(ScanOutcome::ModeSwitched { mode: code.clone() })
    }

    /// Cancel the current mode. A cancelled redirect target hands control
    /// back to its source without replay; otherwise the mode restarts.
    pub fn cancel(&mut self) -> Result<ScanOutcome, EngineError> {
        let cancelled = self.mode.code().clone();
        self.position = Position::Cancelled;

        let redirect = self.poll_redirect();
        if redirect.is_none() {
            self.restart();
        }

        tracing::info!(session_id = %self.id, mode = %cancelled, "Mode cancelled");
        Ok(ScanOutcome::Cancelled {
            cancelled,
            mode: self.mode.code().clone(),
            redirect,
        })
    }

    /// Reset the current mode. A full reset also clears mode-scoped
    /// identity fields of the basis.
    pub fn reset(&mut self, full_reset: bool) -> ScanOutcome {
        self.mode.reset(&mut self.basis, full_reset);
        self.values.clear();
        self.set_default_state();
        tracing::debug!(session_id = %self.id, mode = %self.mode.code(), full_reset, "Mode reset");
        ScanOutcome::Reset { full: full_reset }
    }

    pub fn set_default_state(&mut self) {
        self.position = Position::At(self.mode.default_state().clone());
    }

    /// Push `value` into `state` of the current mode programmatically.
    ///
    /// Reports not kept by `rule` are dropped once the value is accepted.
    /// Returns `Ok(false)` when the value does not validate; pointer and
    /// prior reports then stay as they were, plus the error report.
    ///
    /// Substituting into the last state of the mode with `KEEP_STATE_CHANGE`
    /// moves the pointer back to the default state. It does not count as a
    /// completion: no follow-up mode is entered and no armed redirect is
    /// polled.
    pub fn try_process_by(
        &mut self,
        state: &StateCode,
        value: &str,
        rule: StateSubstitutionRule,
    ) -> Result<bool, EngineError> {
        let mode = Arc::clone(&self.mode);
        if mode.state(state).is_none() {
            let error = EngineError::UnknownState {
                mode: mode.code().clone(),
                state: state.clone(),
            };
            return Err(self.fail(error));
        }

        // prior reports are pruned only once the value is accepted
        let prior = std::mem::take(&mut self.reports);
        let accepted = self.accept(&mode, state, value);
        let fresh = std::mem::replace(&mut self.reports, prior);
        if let Err(error) = accepted {
            self.fail(error);
            return Ok(false);
        }

        self.reports.retain(|report| {
            if report.kind.is_negative() {
                rule.keeps_negative_reports()
            } else {
                rule.keeps_positive_reports()
            }
        });
        for report in fresh {
            self.push_report(report);
        }

        if rule.keeps_state_change() {
            self.position = match mode.next(state) {
                Next::State(next) => Position::At(next),
                Next::Complete => {
                    tracing::debug!(
                        session_id = %self.id,
                        mode = %mode.code(),
                        state = %state,
                        "Substituted into last state; back to default state without completing"
                    );
                    Position::At(mode.default_state().clone())
                }
            };
        }
        tracing::debug!(session_id = %self.id, mode = %mode.code(), state = %state, rule = ?rule, "Value substituted");
        Ok(true)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    pub fn current_mode(&self) -> &ModeCode {
        self.mode.code()
    }

    pub fn mode(&self) -> &BuiltMode<B> {
        &self.mode
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The state the next data scan goes to
    pub fn current_state(&self) -> &StateCode {
        self.position.state().unwrap_or_else(|| self.mode.default_state())
    }

    pub fn values(&self) -> &BTreeMap<StateCode, ScannedValue> {
        &self.values
    }

    pub fn value_of(&self, state: &str) -> Option<&ScannedValue> {
        self.values.get(&StateCode::from(state))
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn clear_reports(&mut self) {
        self.reports.clear();
    }

    pub fn armed_redirect(&self) -> Option<&ArmedRedirect> {
        self.armed.as_ref()
    }

    pub fn redirect_phase(&self) -> RedirectPhase {
        self.tracker.phase()
    }

    pub fn last_redirect_outcome(&self) -> Option<RedirectOutcome> {
        self.tracker.last_outcome()
    }

    /// Commands of the current mode with their enablement evaluated now
    pub fn available_commands(&self) -> Vec<CommandInfo> {
        let ctx = self.scan_context(self.mode.code());
        self.mode
            .commands()
            .map(|command| CommandInfo {
                code: command.code(),
                button_name: command.button_name().to_string(),
                display_name: command.display_name().to_string(),
                enabled: command.is_enabled(&ctx),
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            mode: self.mode.code().clone(),
            position: self.position.clone(),
            values: self.values.clone(),
            reports: self.reports.clone(),
            armed: self.armed.clone(),
            redirect_phase: self.tracker.phase(),
            last_redirect_outcome: self.tracker.last_outcome(),
        }
    }

    fn scan_context<'a>(&'a self, mode: &'a ModeCode) -> ScanContext<'a, B> {
        ScanContext {
            basis: &self.basis,
            services: &self.services,
            mode,
            values: &self.values,
        }
    }

    /// Validate and apply one value; reports warnings and the acceptance
    fn accept(&mut self, mode: &BuiltMode<B>, state: &StateCode, raw: &str) -> Result<ScannedValue, EngineError> {
        let scan_state = mode.state(state).ok_or_else(|| EngineError::UnknownState {
            mode: mode.code().clone(),
            state: state.clone(),
        })?;

        let value = scan_state
            .validate(raw, &self.scan_context(mode.code()))
            .map_err(EngineError::from)?;
        scan_state.apply(&value, &mut self.basis);

        for warning in &value.warnings {
            self.push_report(Report::warning(warning.clone()));
        }
        self.push_report(Report::info(Message::with_args(
            "{0}: {1} accepted.",
            [state.as_str(), value.value.as_str()],
        )));
        self.values.insert(state.clone(), value.clone());
        Ok(value)
    }

    fn on_mode_completed(&mut self) -> ScanOutcome {
        let completed = self.mode.code().clone();
        tracing::info!(session_id = %self.id, mode = %completed, "Mode completed");

        let redirect = self.poll_redirect();
        if redirect.is_none() {
            match self.mode.follow_up().and_then(|code| self.registry.get_shared(&code)) {
                Some(next) => self.enter_mode(next),
                None => self.restart(),
            }
        }

        ScanOutcome::ModeCompleted {
            completed,
            mode: self.mode.code().clone(),
            position: self.position.clone(),
            redirect,
        }
    }

    fn resume(&mut self, armed: ArmedRedirect) -> RedirectOutcome {
        let Some(source) = self.registry.get_shared(&armed.source) else {
            self.tracker.handle(RedirectEvent::Abandon);
            return RedirectOutcome::Abandoned;
        };
        self.enter_mode(source);

        let resumption = self
            .mode
            .redirect(&armed.redirect)
            .and_then(|redirect| redirect.complete(&armed.token));
        if let Some(resumption) = resumption {
            match self.try_process_by(&resumption.state, &resumption.value, resumption.rule) {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    tracing::warn!(
                        session_id = %self.id,
                        redirect = %armed.redirect,
                        state = %resumption.state,
                        "Redirect replay did not validate"
                    );
                }
            }
        }
        self.set_default_state();
        self.tracker.handle(RedirectEvent::Complete);

        tracing::info!(
            session_id = %self.id,
            redirect = %armed.redirect,
            source = %armed.source,
            "Redirect resumed source mode"
        );
        RedirectOutcome::Resumed
    }

    fn abandon(&mut self, armed: ArmedRedirect) -> RedirectOutcome {
        if let Some(source) = self.registry.get_shared(&armed.source) {
            self.enter_mode(source);
        }
        self.tracker.handle(RedirectEvent::Abandon);
        tracing::info!(session_id = %self.id, redirect = %armed.redirect, "Redirect abandoned");
        RedirectOutcome::Abandoned
    }

    /// Same mode again from the default state; identity fields survive
    fn restart(&mut self) {
        self.mode.reset(&mut self.basis, false);
        self.values.clear();
        self.set_default_state();
    }

    /// Activate `mode` keeping the basis
    fn enter_mode(&mut self, mode: Arc<BuiltMode<B>>) {
        let from = std::mem::replace(&mut self.mode, mode);
        self.values.clear();
        self.mode.reset(&mut self.basis, false);
        self.set_default_state();
        tracing::info!(session_id = %self.id, from = %from.code(), to = %self.mode.code(), "Entered mode");
    }

    fn push_report(&mut self, report: Report) {
        self.reports.push(report);
        if self.reports.len() > self.settings.max_reports {
            let excess = self.reports.len() - self.settings.max_reports;
            self.reports.drain(..excess);
        }
    }

    fn fail(&mut self, error: EngineError) -> EngineError {
        tracing::warn!(session_id = %self.id, mode = %self.mode.code(), error = %error, "Scan operation failed");
        self.push_report(Report::error(error.message()));
        error
    }
}

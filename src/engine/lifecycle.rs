// Redirect protocol phases: Idle -> Preparing -> {Vetoed | Entered} ->
// TargetRunning -> {Resumed | Abandoned}

use serde::{Deserialize, Serialize};
use statig::prelude::*;

use super::types::RedirectCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectEvent {
    Prepare { redirect: RedirectCode },
    Veto,
    /// Entered the target with a resumption token
    EnterArmed,
    /// Entered the target without post-completion compensation
    EnterUnarmed,
    Complete,
    Abandon,
}

/// How the last redirect attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectOutcome {
    Vetoed,
    Entered,
    Resumed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPhase {
    Idle,
    Preparing,
    TargetRunning,
}

#[derive(Debug, Default)]
pub struct RedirectLifecycle {
    pub pending: Option<RedirectCode>,
    pub last_outcome: Option<RedirectOutcome>,
}

#[state_machine(initial = "State::idle()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl RedirectLifecycle {
    #[state]
    fn idle(&mut self, event: &RedirectEvent) -> Outcome<State> {
        match event {
            RedirectEvent::Prepare { redirect } => {
                self.pending = Some(redirect.clone());
                tracing::debug!(redirect = %redirect, "Preparing redirect");
                Transition(State::preparing())
            }
            _ => Handled,
        }
    }

    #[state]
    fn preparing(&mut self, event: &RedirectEvent) -> Outcome<State> {
        match event {
            RedirectEvent::Veto => {
                self.finish(RedirectOutcome::Vetoed);
                Transition(State::idle())
            }
            RedirectEvent::EnterUnarmed => {
                self.finish(RedirectOutcome::Entered);
                Transition(State::idle())
            }
            RedirectEvent::EnterArmed => {
                tracing::debug!(redirect = ?self.pending, "Redirect target running");
                Transition(State::target_running())
            }
            _ => Handled,
        }
    }

    #[state]
    fn target_running(&mut self, event: &RedirectEvent) -> Outcome<State> {
        match event {
            RedirectEvent::Complete => {
                self.finish(RedirectOutcome::Resumed);
                Transition(State::idle())
            }
            RedirectEvent::Abandon => {
                self.finish(RedirectOutcome::Abandoned);
                Transition(State::idle())
            }
            _ => Handled,
        }
    }
}

impl RedirectLifecycle {
    fn finish(&mut self, outcome: RedirectOutcome) {
        tracing::debug!(redirect = ?self.pending, outcome = ?outcome, "Redirect finished");
        self.pending = None;
        self.last_outcome = Some(outcome);
    }
}

/// Owns the statig machine and exposes its phase in engine terms
pub struct RedirectTracker {
    machine: StateMachine<RedirectLifecycle>,
}

impl Default for RedirectTracker {
    fn default() -> Self {
        Self {
            machine: RedirectLifecycle::default().state_machine(),
        }
    }
}

impl RedirectTracker {
    pub fn handle(&mut self, event: RedirectEvent) {
        self.machine.handle(&event);
    }

    pub fn phase(&self) -> RedirectPhase {
        match self.machine.state() {
            State::Idle {} => RedirectPhase::Idle,
            State::Preparing {} => RedirectPhase::Preparing,
            State::TargetRunning {} => RedirectPhase::TargetRunning,
        }
    }

    pub fn last_outcome(&self) -> Option<RedirectOutcome> {
        self.machine.inner().last_outcome
    }

    pub fn pending(&self) -> Option<&RedirectCode> {
        self.machine.inner().pending.as_ref()
    }
}

impl std::fmt::Debug for RedirectTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectTracker")
            .field("phase", &self.phase())
            .field("last_outcome", &self.last_outcome())
            .finish()
    }
}

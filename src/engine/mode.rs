// Scan modes and the interception pipeline customizations use to extend them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::command::ScanCommand;
use super::errors::ConstructionError;
use super::redirect::ScanRedirect;
use super::state::ScanState;
use super::transition::{Next, Transition, TransitionTable};
use super::types::{CommandCode, ModeCode, RedirectCode, StateCode};

/// Optional capabilities a mode advertises to customizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Extensions may inject redirects into this mode
    AcceptsRedirects,
    /// The mode works on one document identified in the basis
    DocumentScoped,
}

pub type BoxedState<B> = Box<dyn ScanState<B>>;
pub type BoxedCommand<B> = Box<dyn ScanCommand<B>>;
pub type BoxedRedirect<B> = Box<dyn ScanRedirect<B>>;

/// A named, orderable workflow definition.
///
/// The four factories are called once, when the registry is built; the
/// result is frozen into a [`BuiltMode`].
pub trait ScanMode<B>: Send + Sync {
    fn code(&self) -> ModeCode;

    fn description(&self) -> &str;

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    fn create_states(&self) -> Vec<BoxedState<B>>;

    fn create_transitions(&self) -> Vec<Transition>;

    fn create_commands(&self) -> Vec<BoxedCommand<B>> {
        Vec::new()
    }

    fn create_redirects(&self) -> Vec<BoxedRedirect<B>> {
        Vec::new()
    }

    /// Mode-level reset, run after every state's own reset
    fn reset_mode(&self, _basis: &mut B, _full_reset: bool) {}

    /// Mode to enter when this one completes; `None` restarts it
    fn follow_up(&self) -> Option<ModeCode> {
        None
    }
}

enum Interception<T> {
    Append(Box<dyn Fn() -> Vec<T>>),
    Remove(Box<dyn Fn(&T) -> bool>),
    Replace(Box<dyn Fn(Vec<T>) -> Vec<T>>),
}

/// Ordered list of interceptions applied to one factory's output
pub struct FactoryIntercept<T> {
    steps: Vec<Interception<T>>,
}

impl<T> Default for FactoryIntercept<T> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<T> FactoryIntercept<T> {
    /// `base ++ extra()`
    pub fn by_append(&mut self, extra: impl Fn() -> Vec<T> + 'static) -> &mut Self {
        self.steps.push(Interception::Append(Box::new(extra)));
        self
    }

    /// Drop the items matching `predicate`, keeping the order of the rest
    pub fn by_remove(&mut self, predicate: impl Fn(&T) -> bool + 'static) -> &mut Self {
        self.steps.push(Interception::Remove(Box::new(predicate)));
        self
    }

    /// Replace the whole sequence; `base` is what the previous steps produced
    pub fn by_replace(&mut self, replace: impl Fn(Vec<T>) -> Vec<T> + 'static) -> &mut Self {
        self.steps.push(Interception::Replace(Box::new(replace)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn apply(&self, base: Vec<T>) -> Vec<T> {
        self.steps.iter().fold(base, |mut items, step| match step {
            Interception::Append(extra) => {
                items.extend(extra());
                items
            }
            Interception::Remove(predicate) => {
                items.retain(|item| !predicate(item));
                items
            }
            Interception::Replace(replace) => replace(items),
        })
    }
}

/// Interception points, one per factory
pub struct Intercept<B> {
    pub create_states: FactoryIntercept<BoxedState<B>>,
    pub create_transitions: FactoryIntercept<Transition>,
    pub create_commands: FactoryIntercept<BoxedCommand<B>>,
    pub create_redirects: FactoryIntercept<BoxedRedirect<B>>,
}

impl<B> Default for Intercept<B> {
    fn default() -> Self {
        Self {
            create_states: FactoryIntercept::default(),
            create_transitions: FactoryIntercept::default(),
            create_commands: FactoryIntercept::default(),
            create_redirects: FactoryIntercept::default(),
        }
    }
}

/// A mode together with the interceptions registered against it
pub struct ModeDefinition<B> {
    mode: Box<dyn ScanMode<B>>,
    pub intercept: Intercept<B>,
}

impl<B: 'static> ModeDefinition<B> {
    pub fn new(mode: Box<dyn ScanMode<B>>) -> Self {
        Self {
            mode,
            intercept: Intercept::default(),
        }
    }

    pub fn code(&self) -> ModeCode {
        self.mode.code()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.mode.capabilities().contains(&capability)
    }

    /// Run the factories through the interceptions and validate the result
    pub fn build(self) -> Result<BuiltMode<B>, ConstructionError> {
        let code = self.mode.code();

        let states = self.intercept.create_states.apply(self.mode.create_states());
        if states.is_empty() {
            return Err(ConstructionError::EmptyMode(code));
        }
        let mut state_index = BTreeMap::new();
        let mut state_codes = Vec::with_capacity(states.len());
        for (index, state) in states.iter().enumerate() {
            let state_code = state.code();
            if state_index.insert(state_code.clone(), index).is_some() {
                return Err(ConstructionError::DuplicateState {
                    mode: code,
                    state: state_code,
                });
            }
            state_codes.push(state_code);
        }

        let transitions = self.intercept.create_transitions.apply(self.mode.create_transitions());
        let known: BTreeSet<StateCode> = state_codes.iter().cloned().collect();
        let table = TransitionTable::build(&code, &transitions, &known)?;

        let commands = self.intercept.create_commands.apply(self.mode.create_commands());
        let mut command_index = BTreeMap::new();
        for (index, command) in commands.iter().enumerate() {
            let command_code = command.code();
            if command_index.insert(command_code.clone(), index).is_some() {
                return Err(ConstructionError::DuplicateCommand {
                    mode: code,
                    command: command_code,
                });
            }
        }

        let redirects = self.intercept.create_redirects.apply(self.mode.create_redirects());
        let mut redirect_index = BTreeMap::new();
        for (index, redirect) in redirects.iter().enumerate() {
            let redirect_code = redirect.code();
            if redirect_index.insert(redirect_code.clone(), index).is_some() {
                return Err(ConstructionError::DuplicateRedirect {
                    mode: code,
                    redirect: redirect_code,
                });
            }
        }

        tracing::debug!(
            mode = %code,
            states = states.len(),
            transitions = table.len(),
            commands = commands.len(),
            redirects = redirects.len(),
            "Mode built"
        );

        Ok(BuiltMode {
            code,
            definition: self.mode,
            states,
            state_index,
            state_codes,
            table,
            commands,
            command_index,
            redirects,
            redirect_index,
        })
    }
}

/// A finalized, immutable mode shared by all sessions
pub struct BuiltMode<B> {
    code: ModeCode,
    definition: Box<dyn ScanMode<B>>,
    states: Vec<BoxedState<B>>,
    state_index: BTreeMap<StateCode, usize>,
    state_codes: Vec<StateCode>,
    table: TransitionTable,
    commands: Vec<BoxedCommand<B>>,
    command_index: BTreeMap<CommandCode, usize>,
    redirects: Vec<BoxedRedirect<B>>,
    redirect_index: BTreeMap<RedirectCode, usize>,
}

impl<B> BuiltMode<B> {
    pub fn code(&self) -> &ModeCode {
        &self.code
    }

    pub fn description(&self) -> &str {
        self.definition.description()
    }

    pub fn capabilities(&self) -> &[Capability] {
        self.definition.capabilities()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// The first state of the mode
    pub fn default_state(&self) -> &StateCode {
        &self.state_codes[0]
    }

    pub fn state_codes(&self) -> &[StateCode] {
        &self.state_codes
    }

    pub fn state(&self, code: &StateCode) -> Option<&dyn ScanState<B>> {
        self.state_index.get(code).map(|&i| self.states[i].as_ref())
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.table
    }

    pub fn next(&self, current: &StateCode) -> Next {
        self.table.next(current)
    }

    pub fn command(&self, code: &CommandCode) -> Option<&dyn ScanCommand<B>> {
        self.command_index.get(code).map(|&i| self.commands[i].as_ref())
    }

    pub fn commands(&self) -> impl Iterator<Item = &dyn ScanCommand<B>> + '_ {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn redirect(&self, code: &RedirectCode) -> Option<&dyn ScanRedirect<B>> {
        self.redirect_index.get(code).map(|&i| self.redirects[i].as_ref())
    }

    pub fn redirects(&self) -> impl Iterator<Item = &dyn ScanRedirect<B>> + '_ {
        self.redirects.iter().map(|r| r.as_ref())
    }

    pub fn follow_up(&self) -> Option<ModeCode> {
        self.definition.follow_up()
    }

    /// Reset every state, then the mode itself
    pub fn reset(&self, basis: &mut B, full_reset: bool) {
        for state in &self.states {
            state.on_reset(basis, full_reset);
        }
        self.definition.reset_mode(basis, full_reset);
    }
}

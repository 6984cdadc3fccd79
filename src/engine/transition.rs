// Transition table - the legal-move table of a mode

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::errors::ConstructionError;
use super::types::{ModeCode, StateCode};

/// A directed edge between two states of one mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: StateCode,
    pub to: StateCode,
}

impl Transition {
    pub fn new(from: impl Into<StateCode>, to: impl Into<StateCode>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Declarative flow description: `from(A).next_to(B).next_to(C)` yields
/// A→B and B→C. Calling `from` again starts a new chain.
#[derive(Debug, Default, Clone)]
pub struct StateFlow {
    transitions: Vec<Transition>,
    cursor: Option<StateCode>,
}

impl StateFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, state: impl Into<StateCode>) -> Self {
        self.cursor = Some(state.into());
        self
    }

    pub fn next_to(mut self, state: impl Into<StateCode>) -> Self {
        let to = state.into();
        match self.cursor.take() {
            Some(from) => self.transitions.push(Transition { from, to: to.clone() }),
            None => {
                tracing::debug!(state = %to, "next_to without from; starting chain");
            }
        }
        self.cursor = Some(to);
        self
    }

    pub fn build(self) -> Vec<Transition> {
        self.transitions
    }
}

/// Build a transition list from a flow description
pub fn state_flow(describe: impl FnOnce(StateFlow) -> StateFlow) -> Vec<Transition> {
    describe(StateFlow::new()).build()
}

/// Result of looking up the successor of a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    State(StateCode),
    Complete,
}

/// Function from current state to at most one next state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    edges: BTreeMap<StateCode, StateCode>,
}

impl TransitionTable {
    /// Build the table, rejecting a source with two outgoing edges and edges
    /// whose endpoints are not states of the mode.
    pub fn build(
        mode: &ModeCode,
        transitions: &[Transition],
        states: &BTreeSet<StateCode>,
    ) -> Result<Self, ConstructionError> {
        let mut edges: BTreeMap<StateCode, StateCode> = BTreeMap::new();
        for transition in transitions {
            for endpoint in [&transition.from, &transition.to] {
                if !states.contains(endpoint) {
                    return Err(ConstructionError::UnknownTransitionState {
                        mode: mode.clone(),
                        state: endpoint.clone(),
                    });
                }
            }
            if let Some(existing) = edges.get(&transition.from) {
                return Err(ConstructionError::ConflictingTransition {
                    mode: mode.clone(),
                    from: transition.from.clone(),
                    existing: existing.clone(),
                    conflicting: transition.to.clone(),
                });
            }
            edges.insert(transition.from.clone(), transition.to.clone());
        }
        Ok(Self { edges })
    }

    pub fn next(&self, current: &StateCode) -> Next {
        match self.edges.get(current) {
            Some(next) => Next::State(next.clone()),
            None => Next::Complete,
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Transition> + '_ {
        self.edges.iter().map(|(from, to)| Transition {
            from: from.clone(),
            to: to.clone(),
        })
    }
}

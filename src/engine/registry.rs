// Mode registry and the extension points customizations plug into

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::ConstructionError;
use super::mode::{BuiltMode, Capability, ModeDefinition, ScanMode};
use super::transition::Transition;
use super::types::{CommandCode, ModeCode, RedirectCode, StateCode, ValueKind};

/// A customization that adds modes or decorates existing ones without
/// touching their code.
pub trait ScanExtension<B> {
    fn name(&self) -> &str;

    /// Receive the modes registered so far and return the new list.
    /// Implementations normally yield `base` unchanged and append their own.
    fn create_scan_modes(&self, base: Vec<Box<dyn ScanMode<B>>>) -> Vec<Box<dyn ScanMode<B>>> {
        base
    }

    /// Install interceptions on a mode before it is built
    fn decorate_scan_mode(&self, _mode: &mut ModeDefinition<B>) {}
}

pub struct RegistryBuilder<B> {
    modes: Vec<Box<dyn ScanMode<B>>>,
    extensions: Vec<Box<dyn ScanExtension<B>>>,
}

impl<B: 'static> Default for RegistryBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: 'static> RegistryBuilder<B> {
    pub fn new() -> Self {
        Self {
            modes: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: impl ScanMode<B> + 'static) -> Self {
        self.modes.push(Box::new(mode));
        self
    }

    pub fn extension(mut self, extension: impl ScanExtension<B> + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Apply extensions in registration order, build every mode and check
    /// cross-mode references. Any malformed definition fails the whole build.
    pub fn build(self) -> Result<ModeRegistry<B>, ConstructionError> {
        let mut modes = self.modes;
        for extension in &self.extensions {
            let before = modes.len();
            modes = extension.create_scan_modes(modes);
            tracing::debug!(
                extension = extension.name(),
                added = modes.len().saturating_sub(before),
                "Extension contributed modes"
            );
        }
        if modes.is_empty() {
            return Err(ConstructionError::NoModes);
        }

        let mut built = BTreeMap::new();
        let mut order = Vec::with_capacity(modes.len());
        for mode in modes {
            let mut definition = ModeDefinition::new(mode);
            for extension in &self.extensions {
                extension.decorate_scan_mode(&mut definition);
            }
            let mode = definition.build()?;
            let code = mode.code().clone();
            if built.contains_key(&code) {
                return Err(ConstructionError::DuplicateMode(code));
            }
            order.push(code.clone());
            built.insert(code, Arc::new(mode));
        }

        for mode in built.values() {
            for redirect in mode.redirects() {
                let target = redirect.target_mode();
                if !built.contains_key(&target) {
                    return Err(ConstructionError::UnknownRedirectTarget {
                        mode: mode.code().clone(),
                        redirect: redirect.code(),
                        target,
                    });
                }
            }
        }

        tracing::info!(modes = order.len(), extensions = self.extensions.len(), "Mode registry built");
        Ok(ModeRegistry { modes: built, order })
    }
}

/// Immutable set of built modes, shared read-only by every session
pub struct ModeRegistry<B> {
    modes: BTreeMap<ModeCode, Arc<BuiltMode<B>>>,
    order: Vec<ModeCode>,
}

impl<B> ModeRegistry<B> {
    pub fn get(&self, code: &ModeCode) -> Option<&BuiltMode<B>> {
        self.modes.get(code).map(Arc::as_ref)
    }

    pub(crate) fn get_shared(&self, code: &ModeCode) -> Option<Arc<BuiltMode<B>>> {
        self.modes.get(code).cloned()
    }

    pub fn contains(&self, code: &ModeCode) -> bool {
        self.modes.contains_key(code)
    }

    /// Mode codes in registration order
    pub fn codes(&self) -> &[ModeCode] {
        &self.order
    }

    pub fn modes(&self) -> impl Iterator<Item = &BuiltMode<B>> + '_ {
        self.order.iter().filter_map(|code| self.get(code))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn describe(&self) -> Vec<ModeSummary> {
        self.modes()
            .map(|mode| ModeSummary {
                code: mode.code().clone(),
                description: mode.description().to_string(),
                capabilities: mode.capabilities().to_vec(),
                states: mode
                    .state_codes()
                    .iter()
                    .filter_map(|code| {
                        mode.state(code).map(|state| StateSummary {
                            code: code.clone(),
                            expects: state.expects(),
                        })
                    })
                    .collect(),
                transitions: mode.transitions().iter().collect(),
                commands: mode.commands().map(|c| c.code()).collect(),
                redirects: mode
                    .redirects()
                    .map(|r| RedirectSummary {
                        code: r.code(),
                        target: r.target_mode(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub code: StateCode,
    pub expects: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectSummary {
    pub code: RedirectCode,
    pub target: ModeCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub code: ModeCode,
    pub description: String,
    pub capabilities: Vec<Capability>,
    pub states: Vec<StateSummary>,
    pub transitions: Vec<Transition>,
    pub commands: Vec<CommandCode>,
    pub redirects: Vec<RedirectSummary>,
}

// Traits for dependency injection - the engine reads records and fires side
// effects only through these seams

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Status flags of an external document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Hold,
    Balanced,
    Released,
    Cancelled,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentStatus::Hold => "On Hold",
            DocumentStatus::Balanced => "Balanced",
            DocumentStatus::Released => "Released",
            DocumentStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// A record of the system of record, as far as the engine needs to see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub ref_nbr: String,
    pub doc_type: String,
    pub status: DocumentStatus,
    /// Free-form fields (vendor id, linked inventory document, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl DocumentRecord {
    pub fn new(ref_nbr: impl Into<String>, doc_type: impl Into<String>, status: DocumentStatus) -> Self {
        Self {
            ref_nbr: ref_nbr.into(),
            doc_type: doc_type.into(),
            status,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

/// Document/record store interface
pub trait DocumentStore: Send + Sync {
    /// Find a document by its reference number
    fn find(&self, ref_nbr: &str) -> Result<Option<DocumentRecord>, StoreError>;
}

/// Classifier telling the side-effect executor where an effect originates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "id")]
pub enum EffectSource {
    None,
    Vendor(String),
    Custom(String),
}

/// A side effect requested by a command (a report to print, a notification)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectRequest {
    /// What to run, e.g. a report id
    pub action: String,
    pub parameters: BTreeMap<String, String>,
    pub source: EffectSource,
}

impl SideEffectRequest {
    pub fn new(action: impl Into<String>, source: EffectSource) -> Self {
        Self {
            action: action.into(),
            parameters: BTreeMap::new(),
            source,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SideEffectError {
    #[error("Side effect {action} failed: {reason}")]
    Failed { action: String, reason: String },
}

/// Side-effect executor interface (printing, notifications)
#[cfg_attr(test, automock)]
pub trait SideEffectExecutor: Send + Sync {
    fn execute(&self, request: &SideEffectRequest) -> Result<(), SideEffectError>;
}

/// External collaborators handed to states, commands and redirects
#[derive(Clone)]
pub struct Services {
    pub documents: Arc<dyn DocumentStore>,
    pub effects: Arc<dyn SideEffectExecutor>,
}

impl Services {
    pub fn new(documents: Arc<dyn DocumentStore>, effects: Arc<dyn SideEffectExecutor>) -> Self {
        Self { documents, effects }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("documents", &"Arc<dyn DocumentStore>")
            .field("effects", &"Arc<dyn SideEffectExecutor>")
            .finish()
    }
}

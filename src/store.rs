// Ready-made collaborators: an in-memory document store and a side-effect
// executor that only logs

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use thiserror::Error;

use crate::engine::{
    DocumentRecord, DocumentStore, SideEffectError, SideEffectExecutor, SideEffectRequest, StoreError,
};

#[derive(Debug, Error)]
pub enum StoreLoadError {
    #[error("Failed to read document file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Accepts either a bare array of records or `{ "documents": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    List(Vec<DocumentRecord>),
    Wrapped { documents: Vec<DocumentRecord> },
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<String, DocumentRecord>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = DocumentRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn from_json(json: &str) -> Result<Self, StoreLoadError> {
        let records = match serde_json::from_str::<DocumentFile>(json)? {
            DocumentFile::List(records) | DocumentFile::Wrapped { documents: records } => records,
        };
        Ok(Self::from_records(records))
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreLoadError> {
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), documents = store.len(), "Loaded documents");
        Ok(store)
    }

    /// Insert or replace a record, keyed by upper-cased reference number
    pub fn insert(&self, record: DocumentRecord) {
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(record.ref_nbr.to_uppercase(), record);
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn find(&self, ref_nbr: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Unavailable("document map poisoned".to_string()))?;
        Ok(documents.get(&ref_nbr.to_uppercase()).cloned())
    }
}

/// Logs each request instead of printing it and keeps a copy
#[derive(Debug, Default)]
pub struct TracingEffectExecutor {
    executed: Mutex<Vec<SideEffectRequest>>,
}

impl TracingEffectExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> Vec<SideEffectRequest> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl SideEffectExecutor for TracingEffectExecutor {
    fn execute(&self, request: &SideEffectRequest) -> Result<(), SideEffectError> {
        tracing::info!(
            action = %request.action,
            source = ?request.source,
            parameters = ?request.parameters,
            "Side effect requested"
        );
        let mut executed = self.executed.lock().map_err(|_| SideEffectError::Failed {
            action: request.action.clone(),
            reason: "executor log poisoned".to_string(),
        })?;
        executed.push(request.clone());
        Ok(())
    }
}

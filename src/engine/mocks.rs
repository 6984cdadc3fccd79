// Mock implementations for testing - no side effects

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::engine::command::{CommandContext, ScanCommand};
use crate::engine::errors::ValidationError;
use crate::engine::mode::{BoxedCommand, BoxedRedirect, BoxedState, Capability, ScanMode};
use crate::engine::redirect::{RedirectContext, ResumeToken, Resumption, ScanRedirect};
use crate::engine::state::{ScanContext, ScanState};
use crate::engine::substitution::StateSubstitutionRule;
use crate::engine::traits::*;
use crate::engine::transition::{state_flow, Transition};
use crate::engine::types::*;

/// Synthetic basis with one mode-scoped identity field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestBasis {
    pub doc_nbr: Option<String>,
    pub last_item: Option<String>,
    pub notes: Vec<String>,
}

/// `DOC`: a document number looked up in the store
pub struct DocState;

impl ScanState<TestBasis> for DocState {
    fn code(&self) -> StateCode {
        StateCode::from("DOC")
    }

    fn expects(&self) -> ValueKind {
        ValueKind::DocumentRef
    }

    fn validate(&self, raw: &str, ctx: &ScanContext<'_, TestBasis>) -> Result<ScannedValue, ValidationError> {
        let value = raw.trim().to_uppercase();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::with_args("{0} is not a document number.", [raw]));
        }
        let record = ctx
            .services
            .documents
            .find(&value)
            .map_err(|e| ValidationError::new(e.to_string()))?
            .ok_or_else(|| ValidationError::with_args("{0} not found.", [value.as_str()]))?;

        match record.status {
            DocumentStatus::Cancelled => Err(ValidationError::with_args("{0} is cancelled.", [value.as_str()])),
            DocumentStatus::Hold => Ok(ScannedValue::new(ValueKind::DocumentRef, raw, value.clone())
                .with_warning(Message::with_args("{0} is on hold.", [value]))),
            _ => Ok(ScannedValue::new(ValueKind::DocumentRef, raw, value)),
        }
    }

    fn apply(&self, value: &ScannedValue, basis: &mut TestBasis) {
        basis.doc_nbr = Some(value.value.clone());
    }

    fn on_reset(&self, basis: &mut TestBasis, full_reset: bool) {
        if full_reset {
            basis.doc_nbr = None;
        }
    }
}

/// `ITEM`: anything starting with `ITEM-`
pub struct ItemState;

impl ScanState<TestBasis> for ItemState {
    fn code(&self) -> StateCode {
        StateCode::from("ITEM")
    }

    fn expects(&self) -> ValueKind {
        ValueKind::Item {
            scheme: IdentifierScheme::Any,
        }
    }

    fn validate(&self, raw: &str, ctx: &ScanContext<'_, TestBasis>) -> Result<ScannedValue, ValidationError> {
        if !raw.starts_with("ITEM-") {
            return Err(ValidationError::with_args("{0} is not an item barcode.", [raw]));
        }
        let value = ScannedValue::new(self.expects(), raw, raw);
        if ctx.basis.last_item.as_deref() == Some(raw) {
            return Ok(value.with_warning(Message::with_args("Item {0} scanned twice in a row.", [raw])));
        }
        Ok(value)
    }

    fn apply(&self, value: &ScannedValue, basis: &mut TestBasis) {
        basis.last_item = Some(value.value.clone());
    }

    fn on_reset(&self, basis: &mut TestBasis, _full_reset: bool) {
        basis.last_item = None;
    }
}

pub type CommandFactory = Arc<dyn Fn() -> BoxedCommand<TestBasis> + Send + Sync>;
pub type RedirectFactory = Arc<dyn Fn() -> BoxedRedirect<TestBasis> + Send + Sync>;

/// Configurable synthetic mode: `DOC -> ITEM` plus a `NOTE` command
pub struct TestMode {
    code: ModeCode,
    capabilities: Vec<Capability>,
    follow_up: Option<ModeCode>,
    commands: Vec<CommandFactory>,
    redirects: Vec<RedirectFactory>,
}

impl TestMode {
    pub fn two_state(code: &str) -> Self {
        Self {
            code: ModeCode::from(code),
            capabilities: Vec::new(),
            follow_up: None,
            commands: vec![Arc::new(|| Box::new(NoteCommand::new("NOTE", "noted")) as BoxedCommand<TestBasis>)],
            redirects: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: &[Capability]) -> Self {
        self.capabilities = capabilities.to_vec();
        self
    }

    pub fn with_follow_up(mut self, mode: &str) -> Self {
        self.follow_up = Some(ModeCode::from(mode));
        self
    }

    pub fn with_command(mut self, factory: impl Fn() -> BoxedCommand<TestBasis> + Send + Sync + 'static) -> Self {
        self.commands.push(Arc::new(factory));
        self
    }

    pub fn with_redirect(mut self, factory: impl Fn() -> BoxedRedirect<TestBasis> + Send + Sync + 'static) -> Self {
        self.redirects.push(Arc::new(factory));
        self
    }
}

impl ScanMode<TestBasis> for TestMode {
    fn code(&self) -> ModeCode {
        self.code.clone()
    }

    fn description(&self) -> &str {
        "Synthetic two-state mode"
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn create_states(&self) -> Vec<BoxedState<TestBasis>> {
        vec![Box::new(DocState), Box::new(ItemState)]
    }

    fn create_transitions(&self) -> Vec<Transition> {
        state_flow(|f| f.from("DOC").next_to("ITEM"))
    }

    fn create_commands(&self) -> Vec<BoxedCommand<TestBasis>> {
        self.commands.iter().map(|factory| factory()).collect()
    }

    fn create_redirects(&self) -> Vec<BoxedRedirect<TestBasis>> {
        self.redirects.iter().map(|factory| factory()).collect()
    }

    fn reset_mode(&self, basis: &mut TestBasis, full_reset: bool) {
        if full_reset {
            basis.notes.clear();
        }
    }

    fn follow_up(&self) -> Option<ModeCode> {
        self.follow_up.clone()
    }
}

/// In-memory document store that records every lookup
#[derive(Debug, Default)]
pub struct MockDocumentStore {
    pub documents: Mutex<BTreeMap<String, DocumentRecord>>,
    pub lookups: Mutex<Vec<String>>,
    pub unavailable: Mutex<bool>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `D-1` balanced, `D-2` on hold, `D-3` cancelled
    pub fn seeded() -> Self {
        let store = Self::new();
        store.add("D-1", DocumentStatus::Balanced);
        store.add("D-2", DocumentStatus::Hold);
        store.add("D-3", DocumentStatus::Cancelled);
        store
    }

    pub fn add(&self, ref_nbr: &str, status: DocumentStatus) {
        self.documents
            .lock()
            .unwrap()
            .insert(ref_nbr.to_string(), DocumentRecord::new(ref_nbr, "DOC", status));
    }

    pub fn set_status(&self, ref_nbr: &str, status: DocumentStatus) {
        if let Some(record) = self.documents.lock().unwrap().get_mut(ref_nbr) {
            record.status = status;
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn get_lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl DocumentStore for MockDocumentStore {
    fn find(&self, ref_nbr: &str) -> Result<Option<DocumentRecord>, StoreError> {
        self.lookups.lock().unwrap().push(ref_nbr.to_string());
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(self.documents.lock().unwrap().get(ref_nbr).cloned())
    }
}

/// Side-effect executor that stores every request it receives
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub requests: Mutex<Vec<SideEffectRequest>>,
    pub fail: Mutex<bool>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn get_requests(&self) -> Vec<SideEffectRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl SideEffectExecutor for RecordingExecutor {
    fn execute(&self, request: &SideEffectRequest) -> Result<(), SideEffectError> {
        if *self.fail.lock().unwrap() {
            return Err(SideEffectError::Failed {
                action: request.action.clone(),
                reason: "mock executor failure".to_string(),
            });
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub fn mock_services(store: Arc<MockDocumentStore>, effects: Arc<RecordingExecutor>) -> Services {
    Services::new(store, effects)
}

/// Appends a note to the basis
pub struct NoteCommand {
    code: CommandCode,
    note: String,
}

impl NoteCommand {
    pub fn new(code: &str, note: &str) -> Self {
        Self {
            code: CommandCode::from(code),
            note: note.to_string(),
        }
    }
}

impl ScanCommand<TestBasis> for NoteCommand {
    fn code(&self) -> CommandCode {
        self.code.clone()
    }

    fn button_name(&self) -> &str {
        "Note"
    }

    fn display_name(&self) -> &str {
        "Add note"
    }

    fn process(&self, ctx: &mut CommandContext<'_, TestBasis>) -> Result<bool, ValidationError> {
        ctx.basis.notes.push(self.note.clone());
        ctx.report_info(Message::with_args("Noted {0}.", [self.note.as_str()]));
        Ok(true)
    }
}

/// Dirties the basis, then reports failure either way `process` can
pub struct FailingCommand {
    code: CommandCode,
    reason: Option<&'static str>,
}

impl FailingCommand {
    pub fn returning_false(code: &str) -> Self {
        Self {
            code: CommandCode::from(code),
            reason: None,
        }
    }

    pub fn rejecting(code: &str, reason: &'static str) -> Self {
        Self {
            code: CommandCode::from(code),
            reason: Some(reason),
        }
    }
}

impl ScanCommand<TestBasis> for FailingCommand {
    fn code(&self) -> CommandCode {
        self.code.clone()
    }

    fn button_name(&self) -> &str {
        "Fail"
    }

    fn display_name(&self) -> &str {
        "Always fails"
    }

    fn process(&self, ctx: &mut CommandContext<'_, TestBasis>) -> Result<bool, ValidationError> {
        ctx.basis.notes.push("dirty".to_string());
        ctx.basis.doc_nbr = None;
        match self.reason {
            Some(reason) => Err(ValidationError::new(reason)),
            None => Ok(false),
        }
    }
}

/// Enabled only once a document is in progress
pub struct DocumentCommand {
    code: CommandCode,
}

impl DocumentCommand {
    pub fn new(code: &str) -> Self {
        Self {
            code: CommandCode::from(code),
        }
    }
}

impl ScanCommand<TestBasis> for DocumentCommand {
    fn code(&self) -> CommandCode {
        self.code.clone()
    }

    fn button_name(&self) -> &str {
        "Doc"
    }

    fn display_name(&self) -> &str {
        "Needs a document"
    }

    fn is_enabled(&self, ctx: &ScanContext<'_, TestBasis>) -> bool {
        ctx.basis.doc_nbr.is_some()
    }

    fn process(&self, ctx: &mut CommandContext<'_, TestBasis>) -> Result<bool, ValidationError> {
        ctx.basis.notes.push("document".to_string());
        Ok(true)
    }
}

/// Notes the jump, then asks the host to follow a redirect
pub struct RedirectCommand {
    code: CommandCode,
    redirect: RedirectCode,
}

impl RedirectCommand {
    pub fn new(code: &str, redirect: &str) -> Self {
        Self {
            code: CommandCode::from(code),
            redirect: RedirectCode::from(redirect),
        }
    }
}

impl ScanCommand<TestBasis> for RedirectCommand {
    fn code(&self) -> CommandCode {
        self.code.clone()
    }

    fn button_name(&self) -> &str {
        "Go"
    }

    fn display_name(&self) -> &str {
        "Jump to another mode"
    }

    fn process(&self, ctx: &mut CommandContext<'_, TestBasis>) -> Result<bool, ValidationError> {
        ctx.basis.notes.push(format!("jump {}", self.redirect));
        ctx.redirect_to(self.redirect.clone());
        Ok(true)
    }
}

/// Arms with the current document when there is one, re-validating it
/// against the target's `DOC` state first
pub struct TestRedirect {
    code: RedirectCode,
    target: ModeCode,
    resume_state: StateCode,
    possible: bool,
}

impl TestRedirect {
    pub fn new(code: &str, target: &str, resume_state: &str) -> Self {
        Self {
            code: RedirectCode::from(code),
            target: ModeCode::from(target),
            resume_state: StateCode::from(resume_state),
            possible: true,
        }
    }

    pub fn impossible(mut self) -> Self {
        self.possible = false;
        self
    }
}

impl ScanRedirect<TestBasis> for TestRedirect {
    fn code(&self) -> RedirectCode {
        self.code.clone()
    }

    fn display_name(&self) -> &str {
        "Test redirect"
    }

    fn target_mode(&self) -> ModeCode {
        self.target.clone()
    }

    fn is_possible(&self, _ctx: &RedirectContext<'_, TestBasis>) -> bool {
        self.possible
    }

    fn prepare(&self, ctx: &RedirectContext<'_, TestBasis>) -> Result<Option<ResumeToken>, ValidationError> {
        match &ctx.basis.doc_nbr {
            Some(doc) => {
                ctx.try_validate(self.target.as_str(), "DOC", doc)?;
                Ok(Some(ResumeToken::new(doc.clone())))
            }
            None => Ok(None),
        }
    }

    fn complete(&self, token: &ResumeToken) -> Option<Resumption> {
        Some(Resumption {
            state: self.resume_state.clone(),
            value: token.as_str().to_string(),
            rule: StateSubstitutionRule::KEEP_ALL & !StateSubstitutionRule::KEEP_POSITIVE_REPORTS,
        })
    }
}

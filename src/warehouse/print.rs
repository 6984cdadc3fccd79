// Print-labels mode and the redirect that reaches it from receive and put-away

use super::basis::WarehouseBasis;
use super::modes::{PutAwayMode, ReceiveMode};
use super::states::*;
use crate::config::PrintSetup;
use crate::engine::{
    state_flow, BoxedCommand, BoxedRedirect, BoxedState, Capability, CommandCode, CommandContext,
    ConstructionError, DocumentRecord, DocumentStatus, EffectSource, IdentifierScheme, Message,
    ModeCode, ModeDefinition, ModeRegistry, RedirectCode, RedirectContext, RegistryBuilder,
    ResumeToken, Resumption, ScanCommand, ScanContext, ScanExtension, ScanMode, ScanRedirect,
    SideEffectError, SideEffectExecutor, SideEffectRequest, StateCode, StateSubstitutionRule,
    Transition, ValidationError,
};

pub const PRINT_MODE: &str = "PRTLBL";
pub const PRINT_COMMAND: &str = "PRINT";

/// `PRTLBL`: receipt, then item by customer part number
pub struct PrintMode {
    setup: PrintSetup,
}

impl PrintMode {
    pub fn new(setup: PrintSetup) -> Self {
        Self { setup }
    }
}

impl ScanMode<WarehouseBasis> for PrintMode {
    fn code(&self) -> ModeCode {
        ModeCode::from(PRINT_MODE)
    }

    fn description(&self) -> &str {
        "Print Labels"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::DocumentScoped]
    }

    fn create_states(&self) -> Vec<BoxedState<WarehouseBasis>> {
        vec![
            Box::new(ReceiptState::new(&[DocumentStatus::Balanced, DocumentStatus::Released])),
            Box::new(InventoryItemState::with_scheme(IdentifierScheme::CustomerPart)),
        ]
    }

    fn create_transitions(&self) -> Vec<Transition> {
        state_flow(|flow| flow.from(RECEIPT_STATE).next_to(ITEM_STATE))
    }

    fn create_commands(&self) -> Vec<BoxedCommand<WarehouseBasis>> {
        vec![Box::new(PrintCommand::new(LabelPrinter::new(self.setup.clone())))]
    }

    fn reset_mode(&self, basis: &mut WarehouseBasis, full_reset: bool) {
        if full_reset {
            basis.po_nbr = None;
            basis.prev_inventory_id = None;
        }
    }
}

/// Turns the print setup into side-effect requests for one receipt
#[derive(Debug, Clone)]
pub struct LabelPrinter {
    setup: PrintSetup,
}

impl LabelPrinter {
    pub fn new(setup: PrintSetup) -> Self {
        Self { setup }
    }

    pub fn requests(&self, receipt: &DocumentRecord) -> Vec<SideEffectRequest> {
        let mut requests = Vec::new();

        let labels_report = self
            .setup
            .labels_report_id
            .as_deref()
            .filter(|id| self.setup.print_labels_automatically && !id.is_empty());
        if let Some(report_id) = labels_report {
            match receipt.attribute(super::basis::INVENTORY_REF_ATTRIBUTE) {
                Some(inventory_ref) => requests.push(
                    SideEffectRequest::new(report_id, EffectSource::None).with_parameter("RefNbr", inventory_ref),
                ),
                None => tracing::debug!(receipt = %receipt.ref_nbr, "No inventory receipt yet; labels skipped"),
            }
        }

        if self.setup.print_receipt_automatically {
            let vendor = receipt
                .attribute(super::basis::VENDOR_ATTRIBUTE)
                .unwrap_or_default()
                .to_string();
            requests.push(
                SideEffectRequest::new(self.setup.receipt_report_id.as_str(), EffectSource::Vendor(vendor))
                    .with_parameter("ReceiptType", receipt.doc_type.as_str())
                    .with_parameter("ReceiptNbr", receipt.ref_nbr.as_str()),
            );
        }

        requests
    }

    /// Send every request; stops at the first failure
    pub fn print(&self, receipt: &DocumentRecord, executor: &dyn SideEffectExecutor) -> Result<usize, SideEffectError> {
        let requests = self.requests(receipt);
        for request in &requests {
            executor.execute(request)?;
            tracing::info!(receipt = %receipt.ref_nbr, report = %request.action, "Print job sent");
        }
        Ok(requests.len())
    }
}

pub struct PrintCommand {
    printer: LabelPrinter,
}

impl PrintCommand {
    pub fn new(printer: LabelPrinter) -> Self {
        Self { printer }
    }
}

impl ScanCommand<WarehouseBasis> for PrintCommand {
    fn code(&self) -> CommandCode {
        CommandCode::from(PRINT_COMMAND)
    }

    fn button_name(&self) -> &str {
        "printLabels"
    }

    fn display_name(&self) -> &str {
        "Print Labels"
    }

    fn is_enabled(&self, ctx: &ScanContext<'_, WarehouseBasis>) -> bool {
        ctx.basis.receipt.is_some()
    }

    fn process(&self, ctx: &mut CommandContext<'_, WarehouseBasis>) -> Result<bool, ValidationError> {
        let Some(receipt) = ctx.basis.receipt.clone() else {
            return Err(ValidationError::new("Scan a receipt before printing."));
        };

        let sent = self
            .printer
            .print(&receipt, ctx.services.effects.as_ref())
            .map_err(|e| ValidationError::new(e.to_string()))?;

        if sent == 0 {
            ctx.report_warning(Message::with_args(
                "Nothing printed for receipt {0}; automatic printing is off.",
                [receipt.ref_nbr.as_str()],
            ));
        } else {
            ctx.report_info(Message::with_args(
                "Sent {0} print job(s) for receipt {1}.",
                [sent.to_string(), receipt.ref_nbr.clone()],
            ));
        }
        Ok(true)
    }
}

/// Enters print-labels from a receive or put-away session and comes back to
/// the same receipt afterwards
#[derive(Debug, Default)]
pub struct PrintRedirect;

impl ScanRedirect<WarehouseBasis> for PrintRedirect {
    fn code(&self) -> RedirectCode {
        RedirectCode::from(PRINT_MODE)
    }

    fn display_name(&self) -> &str {
        "Print Label"
    }

    fn target_mode(&self) -> ModeCode {
        ModeCode::from(PRINT_MODE)
    }

    fn prepare(&self, ctx: &RedirectContext<'_, WarehouseBasis>) -> Result<Option<ResumeToken>, ValidationError> {
        let Some(ref_nbr) = &ctx.basis.ref_nbr else {
            return Ok(None);
        };
        ctx.try_validate(PRINT_MODE, RECEIPT_STATE, ref_nbr)?;
        Ok(Some(ResumeToken::new(ref_nbr.clone())))
    }

    fn complete(&self, token: &ResumeToken) -> Option<Resumption> {
        Some(Resumption {
            state: StateCode::from(RECEIPT_STATE),
            value: token.as_str().to_string(),
            rule: StateSubstitutionRule::KEEP_ALL & !StateSubstitutionRule::KEEP_POSITIVE_REPORTS,
        })
    }
}

/// Registers the print-labels mode and wires its redirect into every mode
/// that accepts redirects
pub struct PrintLabelsExtension {
    setup: PrintSetup,
}

impl PrintLabelsExtension {
    pub fn new(setup: PrintSetup) -> Self {
        Self { setup }
    }
}

impl ScanExtension<WarehouseBasis> for PrintLabelsExtension {
    fn name(&self) -> &str {
        "print-labels"
    }

    fn create_scan_modes(
        &self,
        base: Vec<Box<dyn ScanMode<WarehouseBasis>>>,
    ) -> Vec<Box<dyn ScanMode<WarehouseBasis>>> {
        let mut modes = base;
        modes.push(Box::new(PrintMode::new(self.setup.clone())));
        modes
    }

    fn decorate_scan_mode(&self, mode: &mut ModeDefinition<WarehouseBasis>) {
        if mode.has_capability(Capability::AcceptsRedirects) {
            mode.intercept
                .create_redirects
                .by_append(|| vec![Box::new(PrintRedirect) as BoxedRedirect<WarehouseBasis>]);
        }
    }
}

/// Receive and put-away with the print-labels customization installed
pub fn warehouse_registry(setup: &PrintSetup) -> Result<ModeRegistry<WarehouseBasis>, ConstructionError> {
    RegistryBuilder::new()
        .mode(ReceiveMode)
        .mode(PutAwayMode)
        .extension(PrintLabelsExtension::new(setup.clone()))
        .build()
}

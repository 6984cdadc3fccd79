// Receive and put-away modes

use super::basis::WarehouseBasis;
use super::states::*;
use crate::engine::{
    state_flow, BoxedState, Capability, DocumentStatus, ModeCode, ScanMode, Transition,
};

pub const RECEIVE_MODE: &str = "RECV";
pub const PUT_AWAY_MODE: &str = "PTAW";

const WAREHOUSE_CAPABILITIES: &[Capability] = &[Capability::AcceptsRedirects, Capability::DocumentScoped];

/// `RECV`: receipt, item, quantity
#[derive(Debug, Default)]
pub struct ReceiveMode;

impl ScanMode<WarehouseBasis> for ReceiveMode {
    fn code(&self) -> ModeCode {
        ModeCode::from(RECEIVE_MODE)
    }

    fn description(&self) -> &str {
        "Receive"
    }

    fn capabilities(&self) -> &[Capability] {
        WAREHOUSE_CAPABILITIES
    }

    fn create_states(&self) -> Vec<BoxedState<WarehouseBasis>> {
        vec![
            Box::new(ReceiptState::new(&[DocumentStatus::Hold, DocumentStatus::Balanced])),
            Box::new(InventoryItemState::new()),
            Box::new(QuantityState),
        ]
    }

    fn create_transitions(&self) -> Vec<Transition> {
        state_flow(|flow| flow.from(RECEIPT_STATE).next_to(ITEM_STATE).next_to(QUANTITY_STATE))
    }

    fn reset_mode(&self, basis: &mut WarehouseBasis, full_reset: bool) {
        if full_reset {
            basis.po_nbr = None;
        }
    }
}

/// `PTAW`: released receipt, item, location
#[derive(Debug, Default)]
pub struct PutAwayMode;

impl ScanMode<WarehouseBasis> for PutAwayMode {
    fn code(&self) -> ModeCode {
        ModeCode::from(PUT_AWAY_MODE)
    }

    fn description(&self) -> &str {
        "Put Away"
    }

    fn capabilities(&self) -> &[Capability] {
        WAREHOUSE_CAPABILITIES
    }

    fn create_states(&self) -> Vec<BoxedState<WarehouseBasis>> {
        vec![
            Box::new(ReceiptState::new(&[DocumentStatus::Released])),
            Box::new(InventoryItemState::new()),
            Box::new(LocationState),
        ]
    }

    fn create_transitions(&self) -> Vec<Transition> {
        state_flow(|flow| flow.from(RECEIPT_STATE).next_to(ITEM_STATE).next_to(LOCATION_STATE))
    }
}

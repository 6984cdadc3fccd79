// Scan states of the receive / put-away family of modes

use regex::Regex;
use std::sync::LazyLock;

use super::basis::{WarehouseBasis, ITEMS_ATTRIBUTE, PO_NBR_ATTRIBUTE};
use crate::engine::{
    DocumentStatus, IdentifierScheme, Message, ScanContext, ScanState, ScannedValue, StateCode,
    ValidationError, ValueKind,
};

pub const RECEIPT_STATE: &str = "RNBR";
pub const ITEM_STATE: &str = "ITEM";
pub const LOCATION_STATE: &str = "LOC";
pub const QUANTITY_STATE: &str = "QTY";

static RECEIPT_NBR: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9-]{0,14}$"));
static INVENTORY_ID: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9._-]{0,29}$"));
static LOCATION_CD: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9-]{1,9}$"));

fn is_match(pattern: &LazyLock<Result<Regex, regex::Error>>, value: &str) -> bool {
    pattern.as_ref().map(|re| re.is_match(value)).unwrap_or(false)
}

fn scheme_label(scheme: IdentifierScheme) -> &'static str {
    match scheme {
        IdentifierScheme::Any => "inventory item",
        IdentifierScheme::Barcode => "item barcode",
        IdentifierScheme::CustomerPart => "customer part number",
        IdentifierScheme::VendorPart => "vendor part number",
    }
}

/// `RNBR`: purchase receipt number
pub struct ReceiptState {
    allowed: Vec<DocumentStatus>,
}

impl ReceiptState {
    pub fn new(allowed: &[DocumentStatus]) -> Self {
        Self {
            allowed: allowed.to_vec(),
        }
    }
}

impl ScanState<WarehouseBasis> for ReceiptState {
    fn code(&self) -> StateCode {
        StateCode::from(RECEIPT_STATE)
    }

    fn expects(&self) -> ValueKind {
        ValueKind::DocumentRef
    }

    fn validate(&self, raw: &str, ctx: &ScanContext<'_, WarehouseBasis>) -> Result<ScannedValue, ValidationError> {
        let ref_nbr = raw.trim().to_uppercase();
        if !is_match(&RECEIPT_NBR, &ref_nbr) {
            return Err(ValidationError::with_args("{0} is not a receipt number.", [raw]));
        }

        let receipt = ctx
            .services
            .documents
            .find(&ref_nbr)
            .map_err(|e| ValidationError::new(e.to_string()))?
            .ok_or_else(|| ValidationError::with_args("Receipt {0} not found.", [ref_nbr.as_str()]))?;

        if !self.allowed.contains(&receipt.status) {
            return Err(ValidationError::with_args(
                "Receipt {0} has the {1} status.",
                [ref_nbr.clone(), receipt.status.to_string()],
            ));
        }

        let mut value = ScannedValue::new(ValueKind::DocumentRef, raw, ref_nbr.clone());
        if let (Some(current), Some(po_nbr)) = (&ctx.basis.po_nbr, receipt.attribute(PO_NBR_ATTRIBUTE)) {
            if current != po_nbr {
                value = value.with_warning(Message::with_args(
                    "Receipt {0} belongs to order {1}, not {2}.",
                    [ref_nbr.as_str(), po_nbr, current.as_str()],
                ));
            }
        }
        Ok(value.with_document(receipt))
    }

    fn apply(&self, value: &ScannedValue, basis: &mut WarehouseBasis) {
        basis.ref_nbr = Some(value.value.clone());
        if let Some(receipt) = &value.document {
            basis.po_nbr = receipt.attribute(PO_NBR_ATTRIBUTE).map(str::to_string);
            basis.receipt = Some(receipt.clone());
        }
    }

    fn on_reset(&self, basis: &mut WarehouseBasis, full_reset: bool) {
        if full_reset {
            basis.ref_nbr = None;
            basis.receipt = None;
        }
    }
}

/// `ITEM`: inventory id, or an alternate id of the configured scheme
pub struct InventoryItemState {
    scheme: IdentifierScheme,
}

impl InventoryItemState {
    pub fn new() -> Self {
        Self {
            scheme: IdentifierScheme::Any,
        }
    }

    pub fn with_scheme(scheme: IdentifierScheme) -> Self {
        Self { scheme }
    }

    /// Strip the alternate-id prefix the scheme calls for
    fn resolve<'a>(&self, barcode: &'a str) -> Option<&'a str> {
        match self.scheme.prefix() {
            Some(prefix) => barcode.strip_prefix(prefix),
            None => {
                let alternates = [
                    IdentifierScheme::Barcode,
                    IdentifierScheme::CustomerPart,
                    IdentifierScheme::VendorPart,
                ];
                Some(
                    alternates
                        .iter()
                        .filter_map(|s| s.prefix())
                        .find_map(|prefix| barcode.strip_prefix(prefix))
                        .unwrap_or(barcode),
                )
            }
        }
    }
}

impl Default for InventoryItemState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanState<WarehouseBasis> for InventoryItemState {
    fn code(&self) -> StateCode {
        StateCode::from(ITEM_STATE)
    }

    fn expects(&self) -> ValueKind {
        ValueKind::Item { scheme: self.scheme }
    }

    fn validate(&self, raw: &str, ctx: &ScanContext<'_, WarehouseBasis>) -> Result<ScannedValue, ValidationError> {
        let barcode = raw.trim().to_uppercase();
        let inventory_id = match self.resolve(&barcode) {
            Some(id) if is_match(&INVENTORY_ID, id) => id.to_string(),
            Some(_) => return Err(ValidationError::with_args("{0} is not an inventory item.", [raw])),
            None => {
                return Err(ValidationError::with_args(
                    "{0} is not a {1}.",
                    [raw, scheme_label(self.scheme)],
                ))
            }
        };

        let listed = ctx
            .basis
            .receipt
            .as_ref()
            .and_then(|receipt| receipt.attribute(ITEMS_ATTRIBUTE));
        if let Some(listed) = listed {
            if !listed.split(',').any(|item| item.trim().eq_ignore_ascii_case(&inventory_id)) {
                let ref_nbr = ctx.basis.ref_nbr.clone().unwrap_or_default();
                return Err(ValidationError::with_args(
                    "Item {0} is not on receipt {1}.",
                    [inventory_id, ref_nbr],
                ));
            }
        }

        let mut value = ScannedValue::new(self.expects(), raw, inventory_id.clone());
        if ctx.basis.prev_inventory_id.as_deref() == Some(inventory_id.as_str()) {
            value = value.with_warning(Message::with_args("Item {0} was scanned last time as well.", [inventory_id]));
        }
        Ok(value)
    }

    fn apply(&self, value: &ScannedValue, basis: &mut WarehouseBasis) {
        if let Some(previous) = basis.inventory_id.replace(value.value.clone()) {
            basis.prev_inventory_id = Some(previous);
        }
    }

    fn on_reset(&self, basis: &mut WarehouseBasis, _full_reset: bool) {
        if let Some(previous) = basis.inventory_id.take() {
            basis.prev_inventory_id = Some(previous);
        }
    }
}

/// `LOC`: put-away location
pub struct LocationState;

impl ScanState<WarehouseBasis> for LocationState {
    fn code(&self) -> StateCode {
        StateCode::from(LOCATION_STATE)
    }

    fn expects(&self) -> ValueKind {
        ValueKind::Location
    }

    fn validate(&self, raw: &str, _ctx: &ScanContext<'_, WarehouseBasis>) -> Result<ScannedValue, ValidationError> {
        let location = raw.trim().to_uppercase();
        if !is_match(&LOCATION_CD, &location) {
            return Err(ValidationError::with_args("{0} is not a location.", [raw]));
        }
        Ok(ScannedValue::new(ValueKind::Location, raw, location))
    }

    fn apply(&self, value: &ScannedValue, basis: &mut WarehouseBasis) {
        basis.location = Some(value.value.clone());
    }

    fn on_reset(&self, basis: &mut WarehouseBasis, _full_reset: bool) {
        basis.location = None;
    }
}

/// `QTY`: positive whole quantity
pub struct QuantityState;

impl ScanState<WarehouseBasis> for QuantityState {
    fn code(&self) -> StateCode {
        StateCode::from(QUANTITY_STATE)
    }

    fn expects(&self) -> ValueKind {
        ValueKind::Quantity
    }

    fn validate(&self, raw: &str, _ctx: &ScanContext<'_, WarehouseBasis>) -> Result<ScannedValue, ValidationError> {
        match raw.trim().parse::<u32>() {
            Ok(0) => Err(ValidationError::new("Quantity must be greater than zero.")),
            Ok(qty) => Ok(ScannedValue::new(ValueKind::Quantity, raw, qty.to_string())),
            Err(_) => Err(ValidationError::with_args("{0} is not a quantity.", [raw])),
        }
    }

    fn apply(&self, value: &ScannedValue, basis: &mut WarehouseBasis) {
        basis.qty = value.value.parse().ok();
    }

    fn on_reset(&self, basis: &mut WarehouseBasis, _full_reset: bool) {
        basis.qty = None;
    }
}

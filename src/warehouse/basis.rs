use serde::{Deserialize, Serialize};

use crate::engine::DocumentRecord;

/// Receipt attribute naming the purchase order it was created from
pub const PO_NBR_ATTRIBUTE: &str = "PONbr";
/// Receipt attribute naming its vendor
pub const VENDOR_ATTRIBUTE: &str = "VendorID";
/// Receipt attribute naming the linked inventory receipt
pub const INVENTORY_REF_ATTRIBUTE: &str = "InvtRefNbr";
/// Comma-separated inventory ids expected on the receipt
pub const ITEMS_ATTRIBUTE: &str = "Items";

/// Fields shared by the receive, put-away and print-labels modes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseBasis {
    pub ref_nbr: Option<String>,
    pub receipt: Option<DocumentRecord>,
    pub po_nbr: Option<String>,
    pub inventory_id: Option<String>,
    pub prev_inventory_id: Option<String>,
    pub location: Option<String>,
    pub qty: Option<u32>,
}

impl WarehouseBasis {
    pub fn vendor_id(&self) -> Option<&str> {
        self.receipt.as_ref().and_then(|r| r.attribute(VENDOR_ATTRIBUTE))
    }

    pub fn inventory_ref_nbr(&self) -> Option<&str> {
        self.receipt.as_ref().and_then(|r| r.attribute(INVENTORY_REF_ATTRIBUTE))
    }
}

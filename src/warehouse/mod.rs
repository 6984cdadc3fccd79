// Warehouse customization - receive and put-away modes plus the
// print-labels extension that plugs into them

pub mod basis;
pub mod states;
pub mod modes;
pub mod print;

pub use basis::WarehouseBasis;
pub use modes::{PutAwayMode, ReceiveMode, PUT_AWAY_MODE, RECEIVE_MODE};
pub use print::{
    warehouse_registry, LabelPrinter, PrintCommand, PrintLabelsExtension, PrintMode, PrintRedirect,
    PRINT_COMMAND, PRINT_MODE,
};
pub use states::{InventoryItemState, LocationState, QuantityState, ReceiptState};

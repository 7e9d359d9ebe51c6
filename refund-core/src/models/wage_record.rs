use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two inputs an estimate is computed from: W-2 box 1 and box 2,
/// essentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageRecord {
    pub gross_wages: Decimal,
    pub federal_withholding: Decimal,
}

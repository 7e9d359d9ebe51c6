use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Computed output of the refund worksheet.
///
/// `estimated_refund` is negative when the taxpayer owes money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEstimate {
    pub taxable_income: Decimal,
    pub federal_tax_liability: Decimal,
    pub estimated_refund: Decimal,
}

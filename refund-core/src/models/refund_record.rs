use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A saved estimate run: the wage inputs plus the computed results.
///
/// The calculated columns are `None` until a worksheet result is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub id: i64,
    pub tax_year: i32,
    pub filing_status_id: i32,

    // Inputs
    pub gross_wages: Decimal,
    pub federal_withholding: Decimal,

    // Calculated values
    pub taxable_income: Option<Decimal>,
    pub federal_tax_liability: Option<Decimal>,
    pub estimated_refund: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new records (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRefundRecord {
    pub tax_year: i32,
    pub filing_status_id: i32,
    pub gross_wages: Decimal,
    pub federal_withholding: Decimal,
    pub taxable_income: Option<Decimal>,
    pub federal_tax_liability: Option<Decimal>,
    pub estimated_refund: Option<Decimal>,
}

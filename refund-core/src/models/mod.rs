mod filing_status;
mod refund_estimate;
mod refund_record;
mod standard_deduction;
mod tax_bracket;
mod wage_record;

pub use filing_status::{FilingStatus, FilingStatusCode};
pub use refund_estimate::RefundEstimate;
pub use refund_record::{NewRefundRecord, RefundRecord};
pub use standard_deduction::StandardDeduction;
pub use tax_bracket::TaxBracket;
pub use wage_record::WageRecord;

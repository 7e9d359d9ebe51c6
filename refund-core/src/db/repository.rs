use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    FilingStatus, NewRefundRecord, RefundRecord, StandardDeduction, TaxBracket,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait RefundRepository: Send + Sync + std::fmt::Debug {
    // Tax years
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError>;

    // Filing status
    async fn get_filing_status(&self, id: i32) -> Result<FilingStatus, RepositoryError>;
    async fn get_filing_status_by_code(
        &self,
        code: &str,
    ) -> Result<FilingStatus, RepositoryError>;
    async fn list_filing_statuses(&self) -> Result<Vec<FilingStatus>, RepositoryError>;

    // Standard deductions
    async fn get_standard_deduction(
        &self,
        tax_year: i32,
        filing_status_id: i32,
    ) -> Result<StandardDeduction, RepositoryError>;

    // Tax brackets
    async fn get_tax_brackets(
        &self,
        tax_year: i32,
        filing_status_id: i32,
    ) -> Result<Vec<TaxBracket>, RepositoryError>;

    async fn insert_tax_bracket(&self, bracket: &TaxBracket) -> Result<(), RepositoryError>;

    async fn delete_tax_brackets(
        &self,
        tax_year: i32,
        filing_status_id: i32,
    ) -> Result<(), RepositoryError>;

    // Refund records
    async fn create_record(
        &self,
        record: NewRefundRecord,
    ) -> Result<RefundRecord, RepositoryError>;

    async fn get_record(&self, id: i64) -> Result<RefundRecord, RepositoryError>;

    async fn update_record(&self, record: &RefundRecord) -> Result<(), RepositoryError>;

    async fn delete_record(&self, id: i64) -> Result<(), RepositoryError>;

    async fn list_records(
        &self,
        tax_year: Option<i32>,
    ) -> Result<Vec<RefundRecord>, RepositoryError>;
}

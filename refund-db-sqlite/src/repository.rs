use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, sqlite::SqlitePool};
use tracing::debug;

use refund_core::{
    FilingStatus, FilingStatusCode, NewRefundRecord, RefundRecord, RefundRepository,
    RepositoryError, StandardDeduction, TaxBracket,
};

#[derive(Debug)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    /// Executes every `.sql` file in `dir`, sorted by file name.
    ///
    /// Seed files use `INSERT OR IGNORE`, so re-running them is harmless.
    pub async fn run_seeds(&self, dir: &Path) -> Result<(), RepositoryError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| {
                RepositoryError::Configuration(format!(
                    "cannot read seeds directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        paths.sort();

        for path in paths {
            debug!(seed = %path.display(), "applying seed file");
            let sql = std::fs::read_to_string(&path).map_err(|e| {
                RepositoryError::Configuration(format!(
                    "cannot read seed file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─── row types ───────────────────────────────────────────────────────────────
// Money columns come back as TEXT and are parsed into Decimal, so values
// round-trip exactly with no float intermediate.

#[derive(FromRow)]
struct FilingStatusRow {
    id: i32,
    status_code: String,
    status_name: String,
}

impl TryFrom<FilingStatusRow> for FilingStatus {
    type Error = RepositoryError;

    fn try_from(row: FilingStatusRow) -> Result<Self, Self::Error> {
        let status_code = FilingStatusCode::parse(&row.status_code).ok_or_else(|| {
            RepositoryError::Database(format!("Invalid status code: {}", row.status_code))
        })?;
        Ok(FilingStatus {
            id: row.id,
            status_code,
            status_name: row.status_name,
        })
    }
}

#[derive(FromRow)]
struct StandardDeductionRow {
    tax_year: i32,
    filing_status_id: i32,
    amount: String,
}

impl TryFrom<StandardDeductionRow> for StandardDeduction {
    type Error = RepositoryError;

    fn try_from(row: StandardDeductionRow) -> Result<Self, Self::Error> {
        Ok(StandardDeduction {
            tax_year: row.tax_year,
            filing_status_id: row.filing_status_id,
            amount: parse_decimal(&row.amount)?,
        })
    }
}

#[derive(FromRow)]
struct TaxBracketRow {
    tax_year: i32,
    filing_status_id: i32,
    min_income: String,
    max_income: Option<String>,
    tax_rate: String,
}

impl TryFrom<TaxBracketRow> for TaxBracket {
    type Error = RepositoryError;

    fn try_from(row: TaxBracketRow) -> Result<Self, Self::Error> {
        Ok(TaxBracket {
            tax_year: row.tax_year,
            filing_status_id: row.filing_status_id,
            min_income: parse_decimal(&row.min_income)?,
            max_income: parse_optional_decimal(&row.max_income)?,
            tax_rate: parse_decimal(&row.tax_rate)?,
        })
    }
}

#[derive(FromRow)]
struct RefundRecordRow {
    id: i64,
    tax_year: i32,
    filing_status_id: i32,
    gross_wages: String,
    federal_withholding: String,
    taxable_income: Option<String>,
    federal_tax_liability: Option<String>,
    estimated_refund: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RefundRecordRow> for RefundRecord {
    type Error = RepositoryError;

    fn try_from(row: RefundRecordRow) -> Result<Self, Self::Error> {
        Ok(RefundRecord {
            id: row.id,
            tax_year: row.tax_year,
            filing_status_id: row.filing_status_id,
            gross_wages: parse_decimal(&row.gross_wages)?,
            federal_withholding: parse_decimal(&row.federal_withholding)?,
            taxable_income: parse_optional_decimal(&row.taxable_income)?,
            federal_tax_liability: parse_optional_decimal(&row.federal_tax_liability)?,
            estimated_refund: parse_optional_decimal(&row.estimated_refund)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, RepositoryError> {
    s.parse::<Decimal>()
        .map_err(|e| RepositoryError::Database(format!("Failed to parse decimal '{}': {}", s, e)))
}

fn parse_optional_decimal(s: &Option<String>) -> Result<Option<Decimal>, RepositoryError> {
    s.as_ref().map(|s| parse_decimal(s)).transpose()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    // Timestamps are written as RFC 3339; accept the bare SQLite format too.
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .map_err(|e| RepositoryError::Database(format!("Failed to parse datetime '{}': {}", s, e)))
}

#[async_trait]
impl RefundRepository for SqliteRepository {
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT DISTINCT tax_year FROM standard_deductions
             UNION
             SELECT DISTINCT tax_year FROM tax_brackets
             ORDER BY tax_year DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(year,)| year).collect())
    }

    async fn get_filing_status(&self, id: i32) -> Result<FilingStatus, RepositoryError> {
        let row: FilingStatusRow =
            sqlx::query_as("SELECT id, status_code, status_name FROM filing_status WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?
                .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn get_filing_status_by_code(
        &self,
        code: &str,
    ) -> Result<FilingStatus, RepositoryError> {
        let row: FilingStatusRow = sqlx::query_as(
            "SELECT id, status_code, status_name FROM filing_status WHERE status_code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn list_filing_statuses(&self) -> Result<Vec<FilingStatus>, RepositoryError> {
        let rows: Vec<FilingStatusRow> =
            sqlx::query_as("SELECT id, status_code, status_name FROM filing_status ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn get_standard_deduction(
        &self,
        tax_year: i32,
        filing_status_id: i32,
    ) -> Result<StandardDeduction, RepositoryError> {
        let row: StandardDeductionRow = sqlx::query_as(
            "SELECT tax_year, filing_status_id, amount
             FROM standard_deductions
             WHERE tax_year = ? AND filing_status_id = ?",
        )
        .bind(tax_year)
        .bind(filing_status_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn get_tax_brackets(
        &self,
        tax_year: i32,
        filing_status_id: i32,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        // min_income is TEXT; cast so '9000' sorts below '11600'.
        let rows: Vec<TaxBracketRow> = sqlx::query_as(
            "SELECT tax_year, filing_status_id, min_income, max_income, tax_rate
             FROM tax_brackets
             WHERE tax_year = ? AND filing_status_id = ?
             ORDER BY CAST(min_income AS REAL)",
        )
        .bind(tax_year)
        .bind(filing_status_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn insert_tax_bracket(&self, bracket: &TaxBracket) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_brackets (tax_year, filing_status_id, min_income, max_income, tax_rate)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(bracket.tax_year)
        .bind(bracket.filing_status_id)
        .bind(bracket.min_income.to_string())
        .bind(bracket.max_income.map(|d| d.to_string()))
        .bind(bracket.tax_rate.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_tax_brackets(
        &self,
        tax_year: i32,
        filing_status_id: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_brackets WHERE tax_year = ? AND filing_status_id = ?")
            .bind(tax_year)
            .bind(filing_status_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn create_record(
        &self,
        record: NewRefundRecord,
    ) -> Result<RefundRecord, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO refund_records (
                tax_year, filing_status_id, gross_wages, federal_withholding,
                taxable_income, federal_tax_liability, estimated_refund,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.tax_year)
        .bind(record.filing_status_id)
        .bind(record.gross_wages.to_string())
        .bind(record.federal_withholding.to_string())
        .bind(record.taxable_income.map(|d| d.to_string()))
        .bind(record.federal_tax_liability.map(|d| d.to_string()))
        .bind(record.estimated_refund.map(|d| d.to_string()))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_record(id).await
    }

    async fn get_record(&self, id: i64) -> Result<RefundRecord, RepositoryError> {
        let row: RefundRecordRow = sqlx::query_as(
            "SELECT id, tax_year, filing_status_id, gross_wages, federal_withholding,
                    taxable_income, federal_tax_liability, estimated_refund,
                    created_at, updated_at
             FROM refund_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn update_record(&self, record: &RefundRecord) -> Result<(), RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE refund_records SET
                tax_year = ?, filing_status_id = ?, gross_wages = ?,
                federal_withholding = ?, taxable_income = ?,
                federal_tax_liability = ?, estimated_refund = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(record.tax_year)
        .bind(record.filing_status_id)
        .bind(record.gross_wages.to_string())
        .bind(record.federal_withholding.to_string())
        .bind(record.taxable_income.map(|d| d.to_string()))
        .bind(record.federal_tax_liability.map(|d| d.to_string()))
        .bind(record.estimated_refund.map(|d| d.to_string()))
        .bind(now.to_rfc3339())
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_record(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM refund_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_records(
        &self,
        tax_year: Option<i32>,
    ) -> Result<Vec<RefundRecord>, RepositoryError> {
        const BASE_QUERY: &str =
            "SELECT id, tax_year, filing_status_id, gross_wages, federal_withholding,
                    taxable_income, federal_tax_liability, estimated_refund,
                    created_at, updated_at
             FROM refund_records";

        let rows: Vec<RefundRecordRow> = match tax_year {
            Some(year) => {
                sqlx::query_as(&format!(
                    "{} WHERE tax_year = ? ORDER BY updated_at DESC",
                    BASE_QUERY
                ))
                .bind(year)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!("{} ORDER BY updated_at DESC", BASE_QUERY))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use refund_core::{RefundRepository, RepositoryError, TaxBracket};

/// Errors that can occur when loading rate schedule data.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Filing status '{0}' not found in database (have you run the seeds?)")]
    FilingStatusNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// Maps IRS schedule codes to filing status codes.
///
/// - Schedule X → Single (S)
/// - Schedule Y-1 → Married Filing Jointly (MFJ) and Qualifying Surviving Spouse (QSS)
/// - Schedule Y-2 → Married Filing Separately (MFS)
/// - Schedule Z → Head of Household (HOH)
fn schedule_to_filing_status_codes(
    schedule: &str
) -> Result<Vec<&'static str>, BracketLoaderError> {
    match schedule {
        "X" => Ok(vec!["S"]),
        "Y-1" => Ok(vec!["MFJ", "QSS"]),
        "Y-2" => Ok(vec!["MFS"]),
        "Z" => Ok(vec!["HOH"]),
        _ => Err(BracketLoaderError::InvalidSchedule(schedule.to_string())),
    }
}

/// A single record from the rate schedule CSV file.
///
/// The CSV format uses IRS schedule designations:
/// - `tax_year`: The tax year (e.g., 2024)
/// - `schedule`: The IRS schedule code (X, Y-1, Y-2, Z)
/// - `min_income`: The minimum income for this bracket
/// - `max_income`: The maximum income for this bracket (empty for unlimited)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketCsvRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for rate schedule data from CSV files.
///
/// This loader reads CSV data and inserts it into the database via the
/// `RefundRepository` trait, allowing it to work with any database backend.
///
/// The CSV uses IRS schedule codes (X, Y-1, Y-2, Z) which are automatically
/// mapped to the appropriate filing status codes.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse rate schedule records from a CSV reader.
    ///
    /// Returns a vector of parsed records. The reader can be any type that
    /// implements `Read`, such as a file or a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketCsvRecord>, BracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketCsvRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load rate schedule records into the database.
    ///
    /// For each unique (tax_year, schedule) combination in the records,
    /// this method will:
    /// 1. Map the schedule to one or more filing status codes
    /// 2. Look up the filing status ID from each code
    /// 3. Delete any existing brackets for that year/status combination
    /// 4. Insert all new brackets for that combination
    ///
    /// This ensures that loading is idempotent - running the same load
    /// multiple times will produce the same result.
    ///
    /// Note: Schedule Y-1 maps to both MFJ and QSS, so those brackets
    /// will be duplicated for both filing statuses.
    pub async fn load<R: RefundRepository>(
        repo: &R,
        records: &[BracketCsvRecord],
    ) -> Result<usize, BracketLoaderError> {
        let mut inserted = 0;

        // Group records by (tax_year, schedule) to delete and re-insert atomically
        let mut groups: std::collections::HashMap<(i32, String), Vec<&BracketCsvRecord>> =
            std::collections::HashMap::new();

        for record in records {
            groups
                .entry((record.tax_year, record.schedule.clone()))
                .or_default()
                .push(record);
        }

        for ((tax_year, schedule), group_records) in groups {
            // Map schedule to filing status codes
            let filing_status_codes = schedule_to_filing_status_codes(&schedule)?;

            for status_code in filing_status_codes {
                // Look up the filing status ID
                let filing_status =
                    repo.get_filing_status_by_code(status_code)
                        .await
                        .map_err(|e| match e {
                            RepositoryError::NotFound => {
                                BracketLoaderError::FilingStatusNotFound(status_code.to_string())
                            }
                            other => BracketLoaderError::Repository(other),
                        })?;

                // Delete existing brackets for this year/status
                repo.delete_tax_brackets(tax_year, filing_status.id).await?;

                // Insert new brackets
                for record in &group_records {
                    let bracket = TaxBracket {
                        tax_year: record.tax_year,
                        filing_status_id: filing_status.id,
                        min_income: record.min_income,
                        max_income: record.max_income,
                        tax_rate: record.rate,
                    };

                    repo.insert_tax_bracket(&bracket).await?;
                    inserted += 1;
                }
            }
        }

        Ok(inserted)
    }
}

//! Command handlers for the refund estimator CLI.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use tracing::debug;

use refund_core::calculations::RefundWorksheet;
use refund_core::db::{DbConfig, RepositoryRegistry};
use refund_core::{FilingStatusCode, NewRefundRecord, RefundRepository, WageRecord};
use refund_db_sqlite::{SqliteRepository, SqliteRepositoryFactory, database_url};

use crate::utils::{format_dollars, opt_dollars_display, parse_decimal};

/// Build the registry of known database backends.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Run migrations and seed files against a SQLite database.
///
/// With no `--seeds` directory the bundled reference data still gets
/// applied on first connect by the sqlite factory; this command exists for
/// explicit control and custom seed directories.
pub async fn setup(
    config: &DbConfig,
    seeds: Option<&Path>,
) -> Result<()> {
    ensure!(
        config.backend == "sqlite",
        "setup supports only the sqlite backend (got '{}')",
        config.backend
    );

    let repo = SqliteRepository::new(&database_url(&config.connection_string))
        .await
        .with_context(|| format!("failed to open database: {}", config.connection_string))?;

    repo.run_migrations()
        .await
        .context("failed to run migrations")?;
    println!("Migrations complete.");

    if let Some(dir) = seeds {
        repo.run_seeds(dir)
            .await
            .with_context(|| format!("failed to run seeds from: {}", dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Database ready: {}", config.connection_string);
    Ok(())
}

/// Estimate a refund and optionally save it as a record.
pub async fn estimate(
    repo: &dyn RefundRepository,
    year: i32,
    status: &str,
    wages: &str,
    withheld: &str,
    save: bool,
) -> Result<()> {
    let code = FilingStatusCode::parse(status).ok_or_else(|| {
        anyhow!("unknown filing status '{status}' (expected S, MFJ, MFS, HOH, or QSS)")
    })?;

    let filing_status = repo
        .get_filing_status_by_code(code.as_str())
        .await
        .context("filing statuses are missing — run `refund-estimator setup` first")?;

    let deduction = repo
        .get_standard_deduction(year, filing_status.id)
        .await
        .with_context(|| {
            format!("no standard deduction for {year} {status} — load reference data for that year")
        })?;

    let brackets = repo.get_tax_brackets(year, filing_status.id).await?;
    ensure!(
        !brackets.is_empty(),
        "no rate schedule for {year} {status} — load reference data for that year"
    );
    debug!(year, status, brackets = brackets.len(), "loaded rate schedule");

    let wage_record = WageRecord {
        gross_wages: parse_decimal(wages)?,
        federal_withholding: parse_decimal(withheld)?,
    };

    let worksheet = RefundWorksheet::new(&brackets, deduction.amount);
    let result = worksheet.estimate(&wage_record)?;

    println!("Tax year:              {} ({})", year, filing_status.status_name);
    println!(
        "Gross wages:           {}",
        format_dollars(wage_record.gross_wages)
    );
    println!(
        "Federal withholding:   {}",
        format_dollars(wage_record.federal_withholding)
    );
    println!(
        "Standard deduction:    {}",
        format_dollars(deduction.amount)
    );
    println!(
        "Taxable income:        {}",
        format_dollars(result.taxable_income)
    );
    println!(
        "Federal tax liability: {}",
        format_dollars(result.federal_tax_liability)
    );
    if result.estimated_refund.is_sign_negative() {
        println!(
            "Estimated amount owed: {}",
            format_dollars(-result.estimated_refund)
        );
    } else {
        println!(
            "Estimated refund:      {}",
            format_dollars(result.estimated_refund)
        );
    }

    if save {
        let record = repo
            .create_record(NewRefundRecord {
                tax_year: year,
                filing_status_id: filing_status.id,
                gross_wages: wage_record.gross_wages,
                federal_withholding: wage_record.federal_withholding,
                taxable_income: Some(result.taxable_income),
                federal_tax_liability: Some(result.federal_tax_liability),
                estimated_refund: Some(result.estimated_refund),
            })
            .await
            .context("failed to save refund record")?;
        println!("Saved as record #{}", record.id);
    }

    Ok(())
}

/// List saved refund records, optionally filtered by tax year.
pub async fn list(
    repo: &dyn RefundRepository,
    year: Option<i32>,
) -> Result<()> {
    let records = repo.list_records(year).await?;
    if records.is_empty() {
        println!("No saved records.");
        return Ok(());
    }

    let status_codes: HashMap<i32, &'static str> = repo
        .list_filing_statuses()
        .await?
        .into_iter()
        .map(|s| (s.id, s.status_code.as_str()))
        .collect();

    println!(
        "{:>5}  {:>4}  {:<6}  {:>14}  {:>14}  {:>14}",
        "id", "year", "status", "wages", "withheld", "refund"
    );
    for record in records {
        println!(
            "{:>5}  {:>4}  {:<6}  {:>14}  {:>14}  {:>14}",
            record.id,
            record.tax_year,
            status_codes
                .get(&record.filing_status_id)
                .copied()
                .unwrap_or("?"),
            format_dollars(record.gross_wages),
            format_dollars(record.federal_withholding),
            opt_dollars_display(&record.estimated_refund),
        );
    }

    Ok(())
}

/// Show one saved refund record in full.
pub async fn show(
    repo: &dyn RefundRepository,
    id: i64,
) -> Result<()> {
    let record = repo
        .get_record(id)
        .await
        .with_context(|| format!("no record with id {id}"))?;
    let filing_status = repo.get_filing_status(record.filing_status_id).await?;

    println!("Record #{}", record.id);
    println!("Tax year:              {} ({})", record.tax_year, filing_status.status_name);
    println!("Gross wages:           {}", format_dollars(record.gross_wages));
    println!(
        "Federal withholding:   {}",
        format_dollars(record.federal_withholding)
    );
    println!(
        "Taxable income:        {}",
        opt_dollars_display(&record.taxable_income)
    );
    println!(
        "Federal tax liability: {}",
        opt_dollars_display(&record.federal_tax_liability)
    );
    println!(
        "Estimated refund:      {}",
        opt_dollars_display(&record.estimated_refund)
    );
    println!(
        "Created:               {}",
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "Updated:               {}",
        record.updated_at.format("%Y-%m-%d %H:%M UTC")
    );

    Ok(())
}

/// Delete a saved refund record.
pub async fn delete(
    repo: &dyn RefundRepository,
    id: i64,
) -> Result<()> {
    repo.delete_record(id)
        .await
        .with_context(|| format!("no record with id {id}"))?;
    println!("Deleted record #{id}");
    Ok(())
}

/// List tax years that have reference data.
pub async fn years(repo: &dyn RefundRepository) -> Result<()> {
    let years = repo.list_tax_years().await?;
    if years.is_empty() {
        println!("No reference data loaded.");
        return Ok(());
    }
    for year in years {
        println!("{year}");
    }
    Ok(())
}

/// List the known filing statuses.
pub async fn statuses(repo: &dyn RefundRepository) -> Result<()> {
    for status in repo.list_filing_statuses().await? {
        println!("{:<4} {}", status.status_code.as_str(), status.status_name);
    }
    Ok(())
}

//! Refund worksheet: estimated refund from wages and withholding.
//!
//! The worksheet subtracts the standard deduction from gross wages, applies
//! a progressive rate schedule to the remainder, and reports the refund as
//! withholding minus liability.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Taxable income (gross wages - standard deduction, minimum 0) |
//! | 2    | Tax per bracket: (income within the bracket) x (bracket rate) |
//! | 3    | Federal tax liability (sum of step 2, rounded to whole dollars) |
//! | 4    | Estimated refund (withholding - liability; negative = owed) |
//!
//! Rounding happens at steps 3 and 4 only, never per bracket, so bracket
//! contributions cannot compound rounding error.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use refund_core::calculations::RefundWorksheet;
//! use refund_core::{TaxBracket, WageRecord};
//!
//! let brackets = vec![
//!     TaxBracket {
//!         tax_year: 2024,
//!         filing_status_id: 1,
//!         min_income: dec!(0),
//!         max_income: Some(dec!(11600)),
//!         tax_rate: dec!(0.10),
//!     },
//!     TaxBracket {
//!         tax_year: 2024,
//!         filing_status_id: 1,
//!         min_income: dec!(11600),
//!         max_income: Some(dec!(47150)),
//!         tax_rate: dec!(0.12),
//!     },
//!     TaxBracket {
//!         tax_year: 2024,
//!         filing_status_id: 1,
//!         min_income: dec!(47150),
//!         max_income: None,
//!         tax_rate: dec!(0.22),
//!     },
//! ];
//!
//! let worksheet = RefundWorksheet::new(&brackets, dec!(14600));
//! let result = worksheet
//!     .estimate(&WageRecord {
//!         gross_wages: dec!(75000),
//!         federal_withholding: dec!(12500),
//!     })
//!     .unwrap();
//!
//! assert_eq!(result.taxable_income, dec!(60400));
//! // 1160 + 4266 + (60400 - 47150) * 0.22 = 8341
//! assert_eq!(result.federal_tax_liability, dec!(8341));
//! assert_eq!(result.estimated_refund, dec!(4159));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::common::{max, round_to_dollar};
use crate::models::{RefundEstimate, TaxBracket, WageRecord};

/// Errors that can occur during refund worksheet calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefundWorksheetError {
    /// No tax brackets were provided for the calculation.
    #[error("no tax brackets provided")]
    NoBrackets,

    /// A bracket's floor does not meet the previous bracket's ceiling
    /// (or the first bracket does not start at zero).
    #[error("bracket table is not contiguous at income {0}")]
    NonContiguousBrackets(Decimal),

    /// The bracket table ends below the taxable income.
    #[error("bracket table does not cover taxable income {0}")]
    UncoveredIncome(Decimal),

    /// Gross wages below zero are rejected rather than clamped.
    #[error("gross wages cannot be negative: {0}")]
    NegativeWages(Decimal),

    /// Withholding below zero is rejected rather than clamped.
    #[error("federal withholding cannot be negative: {0}")]
    NegativeWithholding(Decimal),
}

/// Calculator for the refund worksheet.
///
/// Holds the rate schedule and standard deduction for one
/// (tax year, filing status) pair; `estimate` is a pure function of its
/// `WageRecord` argument.
#[derive(Debug, Clone)]
pub struct RefundWorksheet<'a> {
    brackets: &'a [TaxBracket],
    standard_deduction: Decimal,
}

impl<'a> RefundWorksheet<'a> {
    /// Creates a new refund worksheet over the given rate schedule.
    ///
    /// Brackets must be sorted by `min_income` ascending and contiguous
    /// from zero; the last bracket should have `max_income` as `None`.
    pub fn new(
        brackets: &'a [TaxBracket],
        standard_deduction: Decimal,
    ) -> Self {
        Self {
            brackets,
            standard_deduction,
        }
    }

    /// Calculates the complete refund worksheet.
    ///
    /// # Errors
    ///
    /// Returns [`RefundWorksheetError`] if:
    /// - No tax brackets were provided
    /// - The bracket table has a gap or ends below the taxable income
    /// - Either input is negative
    pub fn estimate(
        &self,
        wages: &WageRecord,
    ) -> Result<RefundEstimate, RefundWorksheetError> {
        if self.brackets.is_empty() {
            return Err(RefundWorksheetError::NoBrackets);
        }
        if wages.gross_wages < Decimal::ZERO {
            return Err(RefundWorksheetError::NegativeWages(wages.gross_wages));
        }
        if wages.federal_withholding < Decimal::ZERO {
            return Err(RefundWorksheetError::NegativeWithholding(
                wages.federal_withholding,
            ));
        }

        let taxable_income = self.taxable_income(wages.gross_wages);
        let federal_tax_liability = round_to_dollar(self.accumulate_tax(taxable_income)?);
        let estimated_refund =
            round_to_dollar(wages.federal_withholding - federal_tax_liability);

        Ok(RefundEstimate {
            taxable_income,
            federal_tax_liability,
            estimated_refund,
        })
    }

    /// Calculates taxable income (exact subtraction, no rounding).
    fn taxable_income(
        &self,
        gross_wages: Decimal,
    ) -> Decimal {
        max(gross_wages - self.standard_deduction, Decimal::ZERO)
    }

    /// Accumulates tax across every bracket the taxable income crosses.
    ///
    /// Income exactly at a bracket ceiling is taxed entirely within that
    /// bracket. The running sum is left unrounded for the caller.
    fn accumulate_tax(
        &self,
        taxable_income: Decimal,
    ) -> Result<Decimal, RefundWorksheetError> {
        if taxable_income <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let mut total = Decimal::ZERO;
        let mut floor = Decimal::ZERO;

        for bracket in self.brackets {
            if bracket.min_income != floor {
                return Err(RefundWorksheetError::NonContiguousBrackets(
                    bracket.min_income,
                ));
            }

            match bracket.max_income {
                Some(ceiling) if taxable_income > ceiling => {
                    total += (ceiling - floor) * bracket.tax_rate;
                    floor = ceiling;
                }
                // Income tops out inside this bracket (or it is unbounded).
                _ => {
                    total += (taxable_income - floor) * bracket.tax_rate;
                    return Ok(total);
                }
            }
        }

        Err(RefundWorksheetError::UncoveredIncome(taxable_income))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn standard_deduction_2024_single() -> Decimal {
        dec!(14600)
    }

    fn bracket(
        min_income: Decimal,
        max_income: Option<Decimal>,
        tax_rate: Decimal,
    ) -> TaxBracket {
        TaxBracket {
            tax_year: 2024,
            filing_status_id: 1,
            min_income,
            max_income,
            tax_rate,
        }
    }

    /// 2024 Schedule X (Single).
    fn brackets_2024_single() -> Vec<TaxBracket> {
        vec![
            bracket(dec!(0), Some(dec!(11600)), dec!(0.10)),
            bracket(dec!(11600), Some(dec!(47150)), dec!(0.12)),
            bracket(dec!(47150), Some(dec!(100525)), dec!(0.22)),
            bracket(dec!(100525), Some(dec!(191950)), dec!(0.24)),
            bracket(dec!(191950), Some(dec!(243725)), dec!(0.32)),
            bracket(dec!(243725), Some(dec!(609350)), dec!(0.35)),
            bracket(dec!(609350), None, dec!(0.37)),
        ]
    }

    fn estimate(
        gross_wages: Decimal,
        federal_withholding: Decimal,
    ) -> Result<RefundEstimate, RefundWorksheetError> {
        let brackets = brackets_2024_single();
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());
        worksheet.estimate(&WageRecord {
            gross_wages,
            federal_withholding,
        })
    }

    // =========================================================================
    // taxable income
    // =========================================================================

    #[test]
    fn zero_wages_produce_zero_income_and_liability() {
        let result = estimate(dec!(0), dec!(6000)).unwrap();

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.federal_tax_liability, dec!(0));
        // Everything withheld comes back.
        assert_eq!(result.estimated_refund, dec!(6000));
    }

    #[test]
    fn wages_equal_to_standard_deduction_produce_zero_income() {
        let result = estimate(dec!(14600), dec!(500)).unwrap();

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.federal_tax_liability, dec!(0));
        assert_eq!(result.estimated_refund, dec!(500));
    }

    #[test]
    fn wages_below_standard_deduction_clamp_income_to_zero() {
        let result = estimate(dec!(9000), dec!(0)).unwrap();

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.federal_tax_liability, dec!(0));
    }

    // =========================================================================
    // liability
    // =========================================================================

    #[test]
    fn estimate_50k_wages() {
        let result = estimate(dec!(50000), dec!(6000)).unwrap();

        // Taxable income: 50000 - 14600 = 35400
        assert_eq!(result.taxable_income, dec!(35400));
        // Liability: 11600 * 0.10 + (35400 - 11600) * 0.12 = 1160 + 2856 = 4016
        assert_eq!(result.federal_tax_liability, dec!(4016));
        assert_eq!(result.estimated_refund, dec!(1984));
    }

    #[test]
    fn estimate_75k_wages() {
        let result = estimate(dec!(75000), dec!(12500)).unwrap();

        // Taxable income: 75000 - 14600 = 60400
        assert_eq!(result.taxable_income, dec!(60400));
        // Liability: 1160 + (47150 - 11600) * 0.12 + (60400 - 47150) * 0.22
        //          = 1160 + 4266 + 2915 = 8341
        assert_eq!(result.federal_tax_liability, dec!(8341));
        assert_eq!(result.estimated_refund, dec!(4159));
    }

    #[test]
    fn estimate_top_bracket() {
        let result = estimate(dec!(700000), dec!(200000)).unwrap();

        // Taxable income: 700000 - 14600 = 685400
        // 1160 + 4266 + 11742.50 + 21942 + 16568 + 127968.75
        //   + (685400 - 609350) * 0.37 = 211785.75, rounded to 211786
        assert_eq!(result.taxable_income, dec!(685400));
        assert_eq!(result.federal_tax_liability, dec!(211786));
        assert_eq!(result.estimated_refund, dec!(-11786));
    }

    #[test]
    fn refund_is_negative_when_underwithheld() {
        let result = estimate(dec!(50000), dec!(1000)).unwrap();

        assert_eq!(result.estimated_refund, dec!(-3016));
    }

    // =========================================================================
    // bracket boundaries
    // =========================================================================

    #[test]
    fn income_at_bracket_ceiling_stays_in_lower_bracket() {
        // Taxable income lands exactly on the 10% ceiling: 26200 - 14600 = 11600.
        let result = estimate(dec!(26200), dec!(0)).unwrap();

        assert_eq!(result.taxable_income, dec!(11600));
        assert_eq!(result.federal_tax_liability, dec!(1160));
    }

    #[test]
    fn one_dollar_past_ceiling_is_taxed_at_next_rate() {
        // Taxable income 11601: the extra dollar is taxed at 12%, and
        // 1160.12 rounds back down to 1160.
        let result = estimate(dec!(26201), dec!(0)).unwrap();

        assert_eq!(result.taxable_income, dec!(11601));
        assert_eq!(result.federal_tax_liability, dec!(1160));
    }

    // =========================================================================
    // rounding
    // =========================================================================

    #[test]
    fn liability_rounds_half_away_from_zero_at_final_step() {
        // Taxable income 5: raw liability 0.50, which rounds up to 1.
        let result = estimate(dec!(14605), dec!(0)).unwrap();

        assert_eq!(result.federal_tax_liability, dec!(1));
        assert_eq!(result.estimated_refund, dec!(-1));
    }

    #[test]
    fn fractional_wages_round_only_after_accumulation() {
        // Taxable income 35400.49: raw liability 1160 + 2856.0588 = 4016.0588.
        let result = estimate(dec!(50000.49), dec!(6000)).unwrap();

        assert_eq!(result.taxable_income, dec!(35400.49));
        assert_eq!(result.federal_tax_liability, dec!(4016));
        assert_eq!(result.estimated_refund, dec!(1984));
    }

    // =========================================================================
    // properties
    // =========================================================================

    #[test]
    fn liability_is_monotonic_in_wages() {
        let brackets = brackets_2024_single();
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());

        let mut previous = Decimal::ZERO;
        for gross in (0..800_000).step_by(2_375) {
            let result = worksheet
                .estimate(&WageRecord {
                    gross_wages: Decimal::from(gross),
                    federal_withholding: dec!(5000),
                })
                .unwrap();

            assert!(
                result.federal_tax_liability >= previous,
                "liability decreased at gross wages {gross}"
            );
            previous = result.federal_tax_liability;
        }
    }

    #[test]
    fn estimate_is_idempotent() {
        let brackets = brackets_2024_single();
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());
        let wages = WageRecord {
            gross_wages: dec!(87500.33),
            federal_withholding: dec!(9100.10),
        };

        let first = worksheet.estimate(&wages).unwrap();
        let second = worksheet.estimate(&wages).unwrap();

        assert_eq!(first, second);
    }

    // =========================================================================
    // errors
    // =========================================================================

    #[test]
    fn empty_brackets_return_error() {
        let worksheet = RefundWorksheet::new(&[], standard_deduction_2024_single());

        let result = worksheet.estimate(&WageRecord {
            gross_wages: dec!(50000),
            federal_withholding: dec!(0),
        });

        assert_eq!(result, Err(RefundWorksheetError::NoBrackets));
    }

    #[test]
    fn negative_wages_are_rejected() {
        let result = estimate(dec!(-1), dec!(0));

        assert_eq!(result, Err(RefundWorksheetError::NegativeWages(dec!(-1))));
    }

    #[test]
    fn negative_withholding_is_rejected() {
        let result = estimate(dec!(50000), dec!(-0.01));

        assert_eq!(
            result,
            Err(RefundWorksheetError::NegativeWithholding(dec!(-0.01)))
        );
    }

    #[test]
    fn gap_in_bracket_table_is_detected() {
        // Second bracket starts at 12000 instead of 11600.
        let brackets = vec![
            bracket(dec!(0), Some(dec!(11600)), dec!(0.10)),
            bracket(dec!(12000), None, dec!(0.12)),
        ];
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());

        let result = worksheet.estimate(&WageRecord {
            gross_wages: dec!(50000),
            federal_withholding: dec!(0),
        });

        assert_eq!(
            result,
            Err(RefundWorksheetError::NonContiguousBrackets(dec!(12000)))
        );
    }

    #[test]
    fn table_not_starting_at_zero_is_detected() {
        let brackets = vec![bracket(dec!(100), None, dec!(0.10))];
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());

        let result = worksheet.estimate(&WageRecord {
            gross_wages: dec!(50000),
            federal_withholding: dec!(0),
        });

        assert_eq!(
            result,
            Err(RefundWorksheetError::NonContiguousBrackets(dec!(100)))
        );
    }

    #[test]
    fn income_above_bounded_table_is_uncovered() {
        let brackets = vec![
            bracket(dec!(0), Some(dec!(11600)), dec!(0.10)),
            bracket(dec!(11600), Some(dec!(47150)), dec!(0.12)),
        ];
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());

        let result = worksheet.estimate(&WageRecord {
            gross_wages: dec!(75000),
            federal_withholding: dec!(0),
        });

        assert_eq!(
            result,
            Err(RefundWorksheetError::UncoveredIncome(dec!(60400)))
        );
    }

    #[test]
    fn gap_below_taxable_income_does_not_matter_for_lower_incomes() {
        // The gap sits above the income, so it is never reached.
        let brackets = vec![
            bracket(dec!(0), Some(dec!(11600)), dec!(0.10)),
            bracket(dec!(12000), None, dec!(0.12)),
        ];
        let worksheet = RefundWorksheet::new(&brackets, standard_deduction_2024_single());

        let result = worksheet
            .estimate(&WageRecord {
                gross_wages: dec!(20000),
                federal_withholding: dec!(0),
            })
            .unwrap();

        assert_eq!(result.federal_tax_liability, dec!(540));
    }
}

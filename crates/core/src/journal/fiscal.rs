//! Financial-year bucketing for ledger entries.

use chrono::{Datelike, NaiveDate};

/// Derives the financial-year bucket for an entry date.
///
/// The fiscal year runs April through March (e.g., 2026-03-31 falls in
/// "2025-2026", 2026-04-01 opens "2026-2027").
#[must_use]
pub fn financial_year(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= 4 {
        format!("{year}-{}", year + 1)
    } else {
        format!("{}-{year}", year - 1)
    }
}

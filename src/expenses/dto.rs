use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use super::{aggregation::ExpenseFilter, repo_types::iso_date};
use crate::error::{parse_id, AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub category_id: String,
    pub amount: Decimal,
    pub description: Option<String>,
    /// `YYYY-MM-DD`; today (UTC) when absent.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditExpenseRequest {
    pub expense_id: String,
    pub category_id: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteExpenseRequest {
    pub expense_id: String,
}

/// Raw query string; every field is optional and blank values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub month: u8,
    pub year: i32,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Largest amount the `NUMERIC(14,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

fn non_negative(amount: Decimal, field: &str) -> AppResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::BadRequest(format!("{field} must be greater than or equal to 0")));
    }
    Ok(amount)
}

/// Stored amounts: non-negative, at most `MAX_AMOUNT`, rounded to cents.
pub fn check_amount(amount: Decimal, field: &str) -> AppResult<Decimal> {
    let amount = non_negative(amount, field)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount > MAX_AMOUNT {
        return Err(AppError::BadRequest(format!("{field} must not exceed {MAX_AMOUNT}")));
    }
    Ok(amount)
}

fn parse_amount(raw: &str, field: &str) -> AppResult<Decimal> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("{field} must be a number")))?;
    non_negative(amount, field)
}

pub fn parse_date(raw: &str, field: &str) -> AppResult<time::Date> {
    iso_date::parse(raw)
        .map_err(|_| AppError::BadRequest(format!("{field} must be a date in YYYY-MM-DD format")))
}

pub fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

impl TryFrom<FilterQuery> for ExpenseFilter {
    type Error = AppError;

    fn try_from(q: FilterQuery) -> Result<Self, Self::Error> {
        Ok(ExpenseFilter {
            start_date: present(q.start_date)
                .map(|d| parse_date(&d, "startDate"))
                .transpose()?,
            end_date: present(q.end_date)
                .map(|d| parse_date(&d, "endDate"))
                .transpose()?,
            category_id: present(q.category_id)
                .map(|id| parse_id(&id, "Category"))
                .transpose()?,
            min_amount: present(q.min_amount)
                .map(|a| parse_amount(&a, "minAmount"))
                .transpose()?,
            max_amount: present(q.max_amount)
                .map(|a| parse_amount(&a, "maxAmount"))
                .transpose()?,
        })
    }
}

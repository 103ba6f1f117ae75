//! Joins, totals and filters over a user's expenses.
//!
//! Everything here is pure: handlers load rows from the stores and hand the
//! slices in. Sums use [`Decimal`] so totals stay exact to the cent no matter
//! how many rows are added.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use time::{error::ComponentRange, Date, Month};
use uuid::Uuid;

use super::repo_types::{iso_date, Expense};
use crate::categories::repo_types::Category;

/// Outcome of resolving an expense's weak category reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryMatch<'a> {
    Found(&'a Category),
    Missing,
}

/// Lookup table over one user's categories.
pub struct CategoryIndex<'a> {
    by_id: HashMap<Uuid, &'a Category>,
}

impl<'a> CategoryIndex<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        Self {
            by_id: categories.iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn lookup(&self, category_id: Uuid) -> CategoryMatch<'a> {
        match self.by_id.get(&category_id) {
            Some(category) => CategoryMatch::Found(category),
            None => CategoryMatch::Missing,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Category> for CategoryDetail {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseWithCategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    /// `null` when the referenced category no longer exists.
    pub category: Option<CategoryDetail>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    pub total_amount: Decimal,
    pub expenses: Vec<ExpenseWithCategory>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub total_expenses: Decimal,
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    InvalidMonth(#[from] ComponentRange),

    #[error("expense total exceeds the decimal range")]
    Overflow,
}

/// Exact sum of the amounts; `Overflow` instead of a panic past `Decimal::MAX`.
pub fn total_amount<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Result<Decimal, AggregateError> {
    expenses
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
        .ok_or(AggregateError::Overflow)
}

/// Left join of expenses onto categories. Rows are never dropped; the total
/// covers every expense whether or not its category resolved.
pub fn with_category_details(
    expenses: &[Expense],
    categories: &[Category],
) -> Result<ExpenseReport, AggregateError> {
    let index = CategoryIndex::new(categories);
    let rows = expenses
        .iter()
        .map(|e| ExpenseWithCategory {
            id: e.id,
            category_id: e.category_id,
            amount: e.amount,
            description: e.description.clone(),
            date: e.date,
            category: match index.lookup(e.category_id) {
                CategoryMatch::Found(c) => Some(CategoryDetail::from(c)),
                CategoryMatch::Missing => None,
            },
        })
        .collect();

    Ok(ExpenseReport {
        total_amount: total_amount(expenses)?,
        expenses: rows,
    })
}

/// Optional constraints combined with AND. All bounds are inclusive, and a
/// zero amount bound is a real bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub category_id: Option<Uuid>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.start_date.map_or(true, |start| expense.date >= start)
            && self.end_date.map_or(true, |end| expense.date <= end)
            && self.category_id.map_or(true, |id| expense.category_id == id)
            && self.min_amount.map_or(true, |min| expense.amount >= min)
            && self.max_amount.map_or(true, |max| expense.amount <= max)
    }

    /// Matching expenses in their original order.
    pub fn apply(&self, expenses: &[Expense]) -> Vec<Expense> {
        expenses.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    /// Date-only filter covering one calendar month.
    pub fn for_month(month: u8, year: i32) -> Result<Self, ComponentRange> {
        let (start, end) = month_range(month, year)?;
        Ok(Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        })
    }
}

/// First and last day of the month, both inclusive.
pub fn month_range(month: u8, year: i32) -> Result<(Date, Date), ComponentRange> {
    let month = Month::try_from(month)?;
    let first = Date::from_calendar_date(year, month, 1)?;
    let last = Date::from_calendar_date(year, month, month.length(year))?;
    Ok((first, last))
}

pub fn monthly_summary(
    expenses: &[Expense],
    month: u8,
    year: i32,
) -> Result<MonthlySummary, AggregateError> {
    let in_month = ExpenseFilter::for_month(month, year)?.apply(expenses);
    Ok(MonthlySummary {
        total_expenses: total_amount(&in_month)?,
        expenses: in_month,
    })
}

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{delete, get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    aggregation::{monthly_summary, with_category_details, ExpenseFilter, ExpenseReport, MonthlySummary},
    dto::{
        check_amount, clean_description, parse_date, CreateExpenseRequest, DeleteExpenseRequest,
        EditExpenseRequest, FilterQuery, MonthlyQuery,
    },
    repo_types::{Expense, ExpenseUpdate, NewExpense},
};
use crate::{
    auth::extractors::AuthUser,
    error::{parse_id, ApiResponse, AppError, AppResult},
    state::AppState,
};

const MIN_SUMMARY_YEAR: i32 = 2000;

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/expenses/createExpense", post(create_expense))
        .route("/expenses/editExpense", put(edit_expense))
        .route(
            "/expenses/getAllExpensesWithCategoryDetails",
            get(expenses_with_category_details),
        )
        .route("/expenses/getFilteredExpenses", get(filtered_expenses))
        .route("/expenses/getMonthlyExpenseSummary", get(monthly_expense_summary))
        .route("/expenses/deleteByExpenseId", delete(delete_expense))
        .route("/expenses/deleteAllExpenses", delete(delete_all_expenses))
}

async fn require_category(state: &AppState, user_id: Uuid, category_id: Uuid) -> AppResult<()> {
    match state.categories.find_by_id(user_id, category_id).await? {
        Some(_) => Ok(()),
        None => {
            warn!(%user_id, %category_id, "expense references unknown category");
            Err(AppError::not_found("Category not found."))
        }
    }
}

/// 404 when the user has recorded nothing yet.
async fn require_expenses(state: &AppState, user_id: Uuid) -> AppResult<Vec<Expense>> {
    let expenses = state.expenses.list_for_user(user_id).await?;
    if expenses.is_empty() {
        return Err(AppError::not_found("No expenses found for this user."));
    }
    Ok(expenses)
}

#[instrument(skip(state, payload))]
pub async fn create_expense(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Expense>> {
    let Json(payload) = payload?;
    let category_id = parse_id(&payload.category_id, "Category")?;
    let amount = check_amount(payload.amount, "amount")?;
    let date = match payload.date.as_deref() {
        Some(raw) => parse_date(raw, "date")?,
        None => OffsetDateTime::now_utc().date(),
    };

    require_category(&state, user_id, category_id).await?;
    let expense = state
        .expenses
        .insert(
            user_id,
            NewExpense {
                category_id,
                amount,
                description: clean_description(payload.description),
                date,
            },
        )
        .await?;
    info!(%user_id, expense_id = %expense.id, %amount, "expense created");
    Ok(ApiResponse::created("Expense created successfully", expense))
}

#[instrument(skip(state, payload))]
pub async fn edit_expense(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    payload: Result<Json<EditExpenseRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Expense>> {
    let Json(payload) = payload?;
    let expense_id = parse_id(&payload.expense_id, "Expense")?;
    let category_id = payload
        .category_id
        .as_deref()
        .map(|raw| parse_id(raw, "Category"))
        .transpose()?;
    let amount = payload
        .amount
        .map(|a| check_amount(a, "amount"))
        .transpose()?;

    require_expenses(&state, user_id).await?;
    let existing = state
        .expenses
        .find_by_id(user_id, expense_id)
        .await?
        .ok_or_else(|| AppError::not_found("Expense not found."))?;
    if let Some(category_id) = category_id {
        require_category(&state, user_id, category_id).await?;
    }

    let update = ExpenseUpdate {
        category_id: category_id.unwrap_or(existing.category_id),
        amount: amount.unwrap_or(existing.amount),
        description: match payload.description {
            Some(d) => clean_description(Some(d)),
            None => existing.description,
        },
    };
    let updated = state
        .expenses
        .update_by_id(user_id, expense_id, update)
        .await?
        .ok_or_else(|| AppError::bad_request("Expense update failed."))?;
    info!(%user_id, %expense_id, "expense updated");
    Ok(ApiResponse::ok("Expense updated successfully", updated))
}

#[instrument(skip(state))]
pub async fn expenses_with_category_details(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
) -> AppResult<ApiResponse<ExpenseReport>> {
    let expenses = state.expenses.list_for_user(user_id).await?;
    let categories = state.categories.list_for_user(user_id).await?;
    let report = with_category_details(&expenses, &categories)?;
    Ok(ApiResponse::ok("Expenses fetched successfully", report))
}

#[instrument(skip(state))]
pub async fn filtered_expenses(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Vec<Expense>>> {
    let Query(query) = query?;
    let filter = ExpenseFilter::try_from(query)?;
    let expenses = state.expenses.list_for_user(user_id).await?;
    let matched = filter.apply(&expenses);
    info!(%user_id, total = expenses.len(), matched = matched.len(), "expenses filtered");
    Ok(ApiResponse::ok("Filtered expenses fetched successfully", matched))
}

#[instrument(skip(state))]
pub async fn monthly_expense_summary(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    query: Result<Query<MonthlyQuery>, QueryRejection>,
) -> AppResult<ApiResponse<MonthlySummary>> {
    let Query(MonthlyQuery { month, year }) = query?;
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }
    if year < MIN_SUMMARY_YEAR {
        return Err(AppError::bad_request("year must be 2000 or later"));
    }

    let expenses = state.expenses.list_for_user(user_id).await?;
    let summary = monthly_summary(&expenses, month, year)?;
    Ok(ApiResponse::ok(
        "Monthly expense summary fetched successfully",
        summary,
    ))
}

/// Removes only the expense named in the body; everything else stays.
#[instrument(skip(state, payload))]
pub async fn delete_expense(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
    payload: Result<Json<DeleteExpenseRequest>, JsonRejection>,
) -> AppResult<ApiResponse<()>> {
    let Json(payload) = payload?;
    let expense_id = parse_id(&payload.expense_id, "Expense")?;

    require_expenses(&state, user_id).await?;
    if !state.expenses.delete_by_id(user_id, expense_id).await? {
        return Err(AppError::not_found("Expense not found."));
    }
    info!(%user_id, %expense_id, "expense deleted");
    Ok(ApiResponse::message("Expense deleted successfully"))
}

#[instrument(skip(state))]
pub async fn delete_all_expenses(
    State(state): State<AppState>,
    AuthUser { id: user_id, .. }: AuthUser,
) -> AppResult<ApiResponse<()>> {
    let removed = state.expenses.delete_all_for_user(user_id).await?;
    if removed == 0 {
        return Err(AppError::not_found("No expenses found for this user."));
    }
    info!(%user_id, removed, "all expenses deleted");
    Ok(ApiResponse::message("Expenses deleted successfully"))
}

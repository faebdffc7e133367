use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Datelike;
use uuid::Uuid;

use zimmr_api::{
    ExpenseListQuery, ExpenseListResponse, ExpensePayload, ExpenseResponse, FinanceSummaryQuery,
    FinanceSummaryResponse, GoalRequest, OkResponse, db, service,
};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::storage::{Db, expense_from_row, sq_execute, sq_query_map, sq_query_row};

fn validate_expense(req: &ExpensePayload) -> Result<(String, i64, String, String), ApiErr> {
    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiErr::bad_request("description is required"));
    }
    if req.amount_cents <= 0 {
        return Err(ApiErr::bad_request("amount must be positive"));
    }
    let spent_on = service::parse_date(&req.spent_on)
        .map_err(ApiErr::from)?
        .format(service::DATE_FMT)
        .to_string();
    let category = req
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("general")
        .to_string();
    Ok((description, req.amount_cents, category, spent_on))
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

/// POST /api/finances/expenses
pub async fn create_expense(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiErr> {
    let (description, amount_cents, category, spent_on) = validate_expense(&req)?;

    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::finances::insert_expense(
            &id,
            &craftsman.craftsman_id,
            &description,
            amount_cents,
            &category,
            &spent_on,
        ),
    )
    .map_err(ApiErr::from_db("create expense"))?;

    let expense = sq_query_row(
        &conn,
        db::finances::get_expense(&craftsman.craftsman_id, &id),
        expense_from_row,
    )
    .map_err(ApiErr::from_db("reload expense"))?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/finances/expenses — paginated, newest spend first, with year and
/// category filters.
pub async fn list_expenses(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, ApiErr> {
    let built = db::finances::list_expenses(&craftsman.craftsman_id, &query);
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count expenses"))?;
    let expenses = sq_query_map(&conn, built.select_query, expense_from_row)
        .map_err(ApiErr::from_db("list expenses"))?;

    Ok(Json(ExpenseListResponse {
        expenses,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

/// PUT /api/finances/expenses/{id}
pub async fn update_expense(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<ExpensePayload>,
) -> Result<Json<ExpenseResponse>, ApiErr> {
    let (description, amount_cents, category, spent_on) = validate_expense(&req)?;

    let conn = db.conn();
    let affected = sq_execute(
        &conn,
        db::finances::update_expense(
            &craftsman.craftsman_id,
            &id,
            &description,
            amount_cents,
            &category,
            &spent_on,
        ),
    )
    .map_err(ApiErr::from_db("update expense"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("expense not found"));
    }

    let expense = sq_query_row(
        &conn,
        db::finances::get_expense(&craftsman.craftsman_id, &id),
        expense_from_row,
    )
    .map_err(ApiErr::from_db("reload expense"))?;
    Ok(Json(expense))
}

/// DELETE /api/finances/expenses/{id}
pub async fn delete_expense(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let affected = sq_execute(
        &conn,
        db::finances::delete_expense(&craftsman.craftsman_id, &id),
    )
    .map_err(ApiErr::from_db("delete expense"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("expense not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

/// PUT /api/finances/goal — set or replace the revenue goal for a year.
pub async fn set_goal(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<GoalRequest>,
) -> Result<Json<serde_json::Value>, ApiErr> {
    if !(2000..=2100).contains(&req.year) {
        return Err(ApiErr::bad_request("year must be between 2000 and 2100"));
    }
    let target_cents = service::validate_amount(req.target_cents, "goal target").map_err(ApiErr::from)?;

    let conn = db.conn();
    sq_execute(
        &conn,
        db::finances::upsert_goal(
            &craftsman.craftsman_id,
            req.year,
            target_cents,
            &service::sqlite_now(),
        ),
    )
    .map_err(ApiErr::from_db("set goal"))?;

    Ok(Json(serde_json::json!({
        "year": req.year,
        "target_cents": target_cents,
    })))
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// GET /api/finances/summary — paid revenue, expenses, profit, and goal
/// progress for a year (default: current).
pub async fn summary(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<FinanceSummaryQuery>,
) -> Result<Json<FinanceSummaryResponse>, ApiErr> {
    let year = query.year.unwrap_or_else(|| service::today().year());
    let conn = db.conn();

    let revenue: Option<i64> = sq_query_row(
        &conn,
        db::invoices::revenue_for_year(&craftsman.craftsman_id, year),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("sum revenue"))?;
    let expenses: Option<i64> = sq_query_row(
        &conn,
        db::finances::expenses_for_year(&craftsman.craftsman_id, year),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("sum expenses"))?;
    let goal: Option<i64> = sq_query_row(
        &conn,
        db::finances::get_goal(&craftsman.craftsman_id, year),
        |row| row.get(0),
    )
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        e => Err(e),
    })
    .map_err(ApiErr::from_db("get goal"))?;

    let revenue_cents = revenue.unwrap_or(0);
    let expenses_cents = expenses.unwrap_or(0);
    let goal_progress_percent = goal
        .filter(|target| *target > 0)
        .map(|target| revenue_cents * 100 / target);

    Ok(Json(FinanceSummaryResponse {
        year,
        revenue_cents,
        expenses_cents,
        profit_cents: revenue_cents - expenses_cents,
        goal_cents: goal,
        goal_progress_percent,
    }))
}

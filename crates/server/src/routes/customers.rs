use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use zimmr_api::{
    CustomerListQuery, CustomerListResponse, CustomerPayload, CustomerResponse, OkResponse, db,
    service,
};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::storage::{Db, customer_from_row, sq_execute, sq_query_map, sq_query_row};

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/customers — create a customer.
pub async fn create(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<CustomerPayload>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiErr> {
    let name = service::validate_customer_name(&req.name).map_err(ApiErr::from)?;

    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::customers::insert(&db::customers::InsertParams {
            id: &id,
            craftsman_id: &craftsman.craftsman_id,
            name: &name,
            email: req.email.as_deref(),
            phone: req.phone.as_deref(),
            address: req.address.as_deref(),
            notes: req.notes.as_deref(),
        }),
    )
    .map_err(ApiErr::from_db("create customer"))?;

    let customer = sq_query_row(
        &conn,
        db::customers::get(&craftsman.craftsman_id, &id),
        customer_from_row,
    )
    .map_err(ApiErr::from_db("reload customer"))?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/customers — paginated list with optional `search` over name,
/// email, and phone.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<CustomerListResponse>, ApiErr> {
    let built = db::customers::list(&craftsman.craftsman_id, &query);
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count customers"))?;
    let customers = sq_query_map(&conn, built.select_query, customer_from_row)
        .map_err(ApiErr::from_db("list customers"))?;

    Ok(Json(CustomerListResponse {
        customers,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/customers/{id}
pub async fn get(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiErr> {
    let conn = db.conn();
    let customer = sq_query_row(
        &conn,
        db::customers::get(&craftsman.craftsman_id, &id),
        customer_from_row,
    )
    .map_err(|_| ApiErr::not_found("customer not found"))?;
    Ok(Json(customer))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/customers/{id} — full replacement of the editable fields.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<CustomerPayload>,
) -> Result<Json<CustomerResponse>, ApiErr> {
    let name = service::validate_customer_name(&req.name).map_err(ApiErr::from)?;

    let conn = db.conn();
    let affected = sq_execute(
        &conn,
        db::customers::update(
            &craftsman.craftsman_id,
            &id,
            &db::customers::UpdateParams {
                name: &name,
                email: req.email.as_deref(),
                phone: req.phone.as_deref(),
                address: req.address.as_deref(),
                notes: req.notes.as_deref(),
                updated_at: &service::sqlite_now(),
            },
        ),
    )
    .map_err(ApiErr::from_db("update customer"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("customer not found"));
    }

    let customer = sq_query_row(
        &conn,
        db::customers::get(&craftsman.craftsman_id, &id),
        customer_from_row,
    )
    .map_err(ApiErr::from_db("reload customer"))?;
    Ok(Json(customer))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/customers/{id} — rejected while invoices reference the
/// customer.
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();

    let invoice_count: i64 = sq_query_row(
        &conn,
        db::invoices::count_by_customer(&craftsman.craftsman_id, &id),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("count customer invoices"))?;
    if invoice_count > 0 {
        return Err(ApiErr::conflict("customer has invoices and cannot be deleted"));
    }

    let affected = sq_execute(&conn, db::customers::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete customer"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("customer not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

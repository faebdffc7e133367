use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use uuid::Uuid;

use zimmr_api::{
    AppointmentCreateRequest, AppointmentListQuery, AppointmentListResponse, AppointmentResponse,
    AppointmentStatus, AppointmentUpdateRequest, CompleteAppointmentRequest,
    CompleteAppointmentResponse, OkResponse, db, service,
};
use zimmr_core::autoinvoice::{self, CatalogPrice};
use zimmr_core::billing;

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::routes::invoices::{NewInvoice, create_invoice};
use crate::storage::{Db, appointment_from_row, sq_execute, sq_query_map, sq_query_row};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_appointment(
    conn: &Connection,
    craftsman_id: &str,
    id: &str,
) -> Result<AppointmentResponse, ApiErr> {
    sq_query_row(conn, db::appointments::get(craftsman_id, id), appointment_from_row)
        .map_err(|_| ApiErr::not_found("appointment not found"))
}

fn require_customer(conn: &Connection, craftsman_id: &str, customer_id: &str) -> Result<(), ApiErr> {
    let count: i64 = sq_query_row(conn, db::customers::exists(craftsman_id, customer_id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("check customer"))?;
    if count == 0 {
        return Err(ApiErr::not_found("customer not found"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/appointments — schedule an appointment for a customer.
pub async fn create(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<AppointmentCreateRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiErr> {
    let title = service::validate_title(&req.title).map_err(ApiErr::from)?;
    let starts_at = service::parse_rfc3339_to_sqlite(&req.starts_at).map_err(ApiErr::from)?;
    let ends_at = service::parse_rfc3339_to_sqlite(&req.ends_at).map_err(ApiErr::from)?;
    service::validate_time_range(&starts_at, &ends_at).map_err(ApiErr::from)?;
    let price_cents = match req.price_cents {
        Some(cents) => Some(service::validate_amount(cents, "price").map_err(ApiErr::from)?),
        None => None,
    };

    let conn = db.conn();
    require_customer(&conn, &craftsman.craftsman_id, &req.customer_id)?;

    let id = Uuid::new_v4().to_string();
    sq_execute(
        &conn,
        db::appointments::insert(&db::appointments::InsertParams {
            id: &id,
            craftsman_id: &craftsman.craftsman_id,
            customer_id: &req.customer_id,
            title: &title,
            starts_at: &starts_at,
            ends_at: &ends_at,
            location: req.location.as_deref(),
            notes: &req.notes,
            price_cents,
        }),
    )
    .map_err(ApiErr::from_db("create appointment"))?;

    let appointment = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/appointments — paginated, soonest first, with status, customer,
/// and date-range filters.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<AppointmentListResponse>, ApiErr> {
    let from = match query.from {
        Some(ref s) => Some(service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?),
        None => None,
    };
    let to = match query.to {
        Some(ref s) => Some(service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?),
        None => None,
    };

    let built =
        db::appointments::list(&craftsman.craftsman_id, &query, from.as_deref(), to.as_deref());
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count appointments"))?;
    let appointments = sq_query_map(&conn, built.select_query, appointment_from_row)
        .map_err(ApiErr::from_db("list appointments"))?;

    Ok(Json(AppointmentListResponse {
        appointments,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/appointments/{id}
pub async fn get(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiErr> {
    let conn = db.conn();
    let appointment = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(appointment))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/appointments/{id} — partial update; omitted fields keep their
/// value.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<AppointmentUpdateRequest>,
) -> Result<Json<AppointmentResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_appointment(&conn, &craftsman.craftsman_id, &id)?;

    let title = match req.title {
        Some(ref t) => service::validate_title(t).map_err(ApiErr::from)?,
        None => current.title,
    };
    let starts_at = match req.starts_at {
        Some(ref s) => service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?,
        None => current.starts_at,
    };
    let ends_at = match req.ends_at {
        Some(ref s) => service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?,
        None => current.ends_at,
    };
    service::validate_time_range(&starts_at, &ends_at).map_err(ApiErr::from)?;
    let location = req.location.or(current.location);
    let notes = req.notes.unwrap_or(current.notes);
    let price_cents = match req.price_cents {
        Some(cents) => Some(service::validate_amount(cents, "price").map_err(ApiErr::from)?),
        None => current.price_cents,
    };

    sq_execute(
        &conn,
        db::appointments::update(
            &craftsman.craftsman_id,
            &id,
            &db::appointments::UpdateParams {
                title: &title,
                starts_at: &starts_at,
                ends_at: &ends_at,
                location: location.as_deref(),
                notes: &notes,
                price_cents,
                updated_at: &service::sqlite_now(),
            },
        ),
    )
    .map_err(ApiErr::from_db("update appointment"))?;

    let appointment = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(appointment))
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// POST /api/appointments/{id}/complete — mark done and optionally derive a
/// draft invoice. The service amount is the agreed price; material lines are
/// parsed from the notes, with catalog lookups for unpriced references.
pub async fn complete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    body: Option<Json<CompleteAppointmentRequest>>,
) -> Result<Json<CompleteAppointmentResponse>, ApiErr> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let conn = db.conn();
    let current = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    if current.status != AppointmentStatus::Scheduled {
        return Err(ApiErr::conflict(
            "only scheduled appointments can be completed",
        ));
    }

    sq_execute(
        &conn,
        db::appointments::set_status(
            &craftsman.craftsman_id,
            &id,
            AppointmentStatus::Completed.as_str(),
            &service::sqlite_now(),
        ),
    )
    .map_err(ApiErr::from_db("complete appointment"))?;

    let invoice = if req.create_invoice {
        let draft = autoinvoice::draft_from_appointment(
            current.price_cents,
            &current.notes,
            craftsman.default_tax_treatment(),
            |name| {
                sq_query_row(
                    &conn,
                    db::materials::by_name(&craftsman.craftsman_id, name),
                    |row| {
                        Ok(CatalogPrice {
                            unit: row.get(0)?,
                            unit_price_cents: row.get(1)?,
                        })
                    },
                )
                .ok()
            },
        );
        let issue_date = service::today();
        Some(create_invoice(
            &conn,
            &craftsman.craftsman_id,
            NewInvoice {
                customer_id: &current.customer_id,
                appointment_id: Some(&id),
                service_amount_cents: draft.service_amount_cents,
                tax_treatment: draft.tax_treatment,
                issue_date,
                due_date: billing::default_due_date(issue_date),
                lines: draft.lines,
            },
        )?)
    } else {
        None
    };

    let appointment = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(CompleteAppointmentResponse {
        appointment,
        invoice,
    }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/appointments/{id}/cancel
pub async fn cancel(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    if current.status != AppointmentStatus::Scheduled {
        return Err(ApiErr::conflict(
            "only scheduled appointments can be cancelled",
        ));
    }

    sq_execute(
        &conn,
        db::appointments::set_status(
            &craftsman.craftsman_id,
            &id,
            AppointmentStatus::Cancelled.as_str(),
            &service::sqlite_now(),
        ),
    )
    .map_err(ApiErr::from_db("cancel appointment"))?;

    let appointment = load_appointment(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(appointment))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/appointments/{id}
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let affected = sq_execute(&conn, db::appointments::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete appointment"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("appointment not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Datelike;
use rusqlite::Connection;
use uuid::Uuid;

use zimmr_api::{
    InvoiceResponse, MaterialLine, OkResponse, QuoteCreateRequest, QuoteListQuery,
    QuoteListResponse, QuoteResponse, QuoteStatus, QuoteStatusRequest, QuoteUpdateRequest, db,
    service,
};
use zimmr_core::billing::{self, QUOTE_NUMBER_PREFIX};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::routes::invoices::{NewInvoice, create_invoice, validate_lines};
use crate::storage::{Db, line_from_row, quote_from_row, sq_execute, sq_query_map, sq_query_row};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load one quote with its lines; `404` when it does not exist.
fn load_quote(conn: &Connection, craftsman_id: &str, id: &str) -> Result<QuoteResponse, ApiErr> {
    let mut quote = sq_query_row(conn, db::quotes::get(craftsman_id, id), quote_from_row)
        .map_err(|_| ApiErr::not_found("quote not found"))?;
    quote.lines = sq_query_map(conn, db::quotes::lines_by_quote(id), line_from_row)
        .map_err(ApiErr::from_db("load quote lines"))?;
    Ok(quote)
}

fn insert_lines(conn: &Connection, quote_id: &str, lines: &[MaterialLine]) -> Result<(), ApiErr> {
    for (position, line) in lines.iter().enumerate() {
        let line_id = Uuid::new_v4().to_string();
        sq_execute(
            conn,
            db::quotes::insert_line(&line_id, quote_id, line, position as i64),
        )
        .map_err(ApiErr::from_db("insert quote line"))?;
    }
    Ok(())
}

fn lines_as_material(quote: &QuoteResponse) -> Vec<MaterialLine> {
    quote
        .lines
        .iter()
        .map(|l| MaterialLine {
            name: l.name.clone(),
            quantity_thousandths: l.quantity_thousandths,
            unit: l.unit.clone(),
            unit_price_cents: l.unit_price_cents,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/quotes — create a draft quote with the next `QUO-<year>-<seq>`
/// number. Totals are always computed server-side.
pub async fn create(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<QuoteCreateRequest>,
) -> Result<(StatusCode, Json<QuoteResponse>), ApiErr> {
    let service_amount_cents =
        service::validate_amount(req.service_amount_cents, "service amount").map_err(ApiErr::from)?;
    let lines = validate_lines(&req.lines)?;
    let issue_date = match req.issue_date {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => service::today(),
    };
    let valid_until = match req.valid_until {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => billing::default_due_date(issue_date),
    };
    let tax_treatment = req
        .tax_treatment
        .unwrap_or_else(|| craftsman.default_tax_treatment());
    let totals = billing::compute_totals(service_amount_cents, &lines, tax_treatment);

    let conn = db.conn();
    let customer_count: i64 = sq_query_row(
        &conn,
        db::customers::exists(&craftsman.craftsman_id, &req.customer_id),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("check customer"))?;
    if customer_count == 0 {
        return Err(ApiErr::not_found("customer not found"));
    }

    let doc_year = issue_date.year();
    let max_seq: Option<i64> = sq_query_row(
        &conn,
        db::quotes::max_seq(&craftsman.craftsman_id, doc_year),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("next quote number"))?;
    let doc_seq = max_seq.unwrap_or(0) + 1;
    let quote_number = billing::format_document_number(QUOTE_NUMBER_PREFIX, doc_year, doc_seq);

    let id = Uuid::new_v4().to_string();
    sq_execute(
        &conn,
        db::quotes::insert(&db::quotes::InsertParams {
            id: &id,
            craftsman_id: &craftsman.craftsman_id,
            customer_id: &req.customer_id,
            quote_number: &quote_number,
            doc_year,
            doc_seq,
            service_amount_cents,
            materials_total_cents: totals.materials_total_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            tax_treatment: tax_treatment.as_str(),
            issue_date: &issue_date.format(service::DATE_FMT).to_string(),
            valid_until: &valid_until.format(service::DATE_FMT).to_string(),
        }),
    )
    .map_err(ApiErr::from_db("insert quote"))?;
    insert_lines(&conn, &id, &lines)?;

    let quote = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    Ok((StatusCode::CREATED, Json(quote)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/quotes — paginated, newest numbers first.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<QuoteListQuery>,
) -> Result<Json<QuoteListResponse>, ApiErr> {
    let built = db::quotes::list(&craftsman.craftsman_id, &query);
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count quotes"))?;
    let mut quotes = sq_query_map(&conn, built.select_query, quote_from_row)
        .map_err(ApiErr::from_db("list quotes"))?;
    for quote in &mut quotes {
        quote.lines = sq_query_map(&conn, db::quotes::lines_by_quote(&quote.id), line_from_row)
            .map_err(ApiErr::from_db("load quote lines"))?;
    }

    Ok(Json(QuoteListResponse {
        quotes,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/quotes/{id}
pub async fn get(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<QuoteResponse>, ApiErr> {
    let conn = db.conn();
    let quote = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(quote))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/quotes/{id} — edit a draft; totals are recomputed.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<QuoteUpdateRequest>,
) -> Result<Json<QuoteResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    if current.status != QuoteStatus::Draft {
        return Err(ApiErr::conflict("only draft quotes can be edited"));
    }

    let service_amount_cents = match req.service_amount_cents {
        Some(cents) => service::validate_amount(cents, "service amount").map_err(ApiErr::from)?,
        None => current.service_amount_cents,
    };
    let tax_treatment = req.tax_treatment.unwrap_or(current.tax_treatment);
    let issue_date = match req.issue_date {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => service::parse_date(&current.issue_date).map_err(ApiErr::from)?,
    };
    let valid_until = match req.valid_until {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => service::parse_date(&current.valid_until).map_err(ApiErr::from)?,
    };
    let lines = match req.lines {
        Some(ref payload) => validate_lines(payload)?,
        None => lines_as_material(&current),
    };
    let totals = billing::compute_totals(service_amount_cents, &lines, tax_treatment);

    sq_execute(
        &conn,
        db::quotes::update(
            &craftsman.craftsman_id,
            &id,
            &db::quotes::UpdateParams {
                service_amount_cents,
                materials_total_cents: totals.materials_total_cents,
                tax_cents: totals.tax_cents,
                total_cents: totals.total_cents,
                tax_treatment: tax_treatment.as_str(),
                issue_date: &issue_date.format(service::DATE_FMT).to_string(),
                valid_until: &valid_until.format(service::DATE_FMT).to_string(),
                updated_at: &service::sqlite_now(),
            },
        ),
    )
    .map_err(ApiErr::from_db("update quote"))?;

    if req.lines.is_some() {
        sq_execute(&conn, db::quotes::delete_lines(&id))
            .map_err(ApiErr::from_db("replace quote lines"))?;
        insert_lines(&conn, &id, &lines)?;
    }

    let quote = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(quote))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// POST /api/quotes/{id}/status — lifecycle transition
/// (`draft → sent → accepted | rejected`).
pub async fn set_status(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<QuoteStatusRequest>,
) -> Result<Json<QuoteResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    if !current.status.can_transition(req.status) {
        return Err(ApiErr::conflict(format!(
            "cannot transition quote from {} to {}",
            current.status, req.status
        )));
    }

    sq_execute(
        &conn,
        db::quotes::set_status(
            &craftsman.craftsman_id,
            &id,
            req.status.as_str(),
            &service::sqlite_now(),
        ),
    )
    .map_err(ApiErr::from_db("set quote status"))?;

    let quote = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(quote))
}

// ---------------------------------------------------------------------------
// Convert
// ---------------------------------------------------------------------------

/// POST /api/quotes/{id}/convert — turn an accepted quote into a draft
/// invoice exactly once. The quote's amounts and lines are snapshotted onto
/// the invoice; the invoice gets fresh dates and its own number.
pub async fn convert(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiErr> {
    let conn = db.conn();
    let quote = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    if quote.status != QuoteStatus::Accepted {
        return Err(ApiErr::conflict("only accepted quotes can be converted"));
    }
    if quote.invoice_id.is_some() {
        return Err(ApiErr::conflict("quote has already been converted"));
    }

    let issue_date = service::today();
    let invoice = create_invoice(
        &conn,
        &craftsman.craftsman_id,
        NewInvoice {
            customer_id: &quote.customer_id,
            appointment_id: None,
            service_amount_cents: quote.service_amount_cents,
            tax_treatment: quote.tax_treatment,
            issue_date,
            due_date: billing::default_due_date(issue_date),
            lines: lines_as_material(&quote),
        },
    )?;

    sq_execute(
        &conn,
        db::quotes::set_invoice_id(
            &craftsman.craftsman_id,
            &id,
            &invoice.id,
            &service::sqlite_now(),
        ),
    )
    .map_err(ApiErr::from_db("mark quote converted"))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/quotes/{id} — drafts only.
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_quote(&conn, &craftsman.craftsman_id, &id)?;
    if current.status != QuoteStatus::Draft {
        return Err(ApiErr::conflict("only draft quotes can be deleted"));
    }

    sq_execute(&conn, db::quotes::delete_lines(&id))
        .map_err(ApiErr::from_db("delete quote lines"))?;
    sq_execute(&conn, db::quotes::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete quote"))?;
    Ok(Json(OkResponse { ok: true }))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Datelike;
use rusqlite::Connection;
use uuid::Uuid;

use zimmr_api::{
    InvoiceCreateRequest, InvoiceListQuery, InvoiceListResponse, InvoiceResponse, InvoiceStatus,
    InvoiceStatusRequest, InvoiceUpdateRequest, LinePayload, MaterialLine, OkResponse,
    TaxTreatment, db, service,
};
use zimmr_core::billing::{self, INVOICE_NUMBER_PREFIX};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::storage::{
    Db, appointment_from_row, invoice_from_row, line_from_row, sq_execute, sq_query_map,
    sq_query_row,
};

// ---------------------------------------------------------------------------
// Shared helpers (also used by appointment completion and quote conversion)
// ---------------------------------------------------------------------------

/// Validate client-submitted lines into billing lines.
pub(crate) fn validate_lines(lines: &[LinePayload]) -> Result<Vec<MaterialLine>, ApiErr> {
    lines
        .iter()
        .map(|line| {
            Ok(MaterialLine {
                name: service::validate_material_name(&line.name).map_err(ApiErr::from)?,
                quantity_thousandths: service::validate_quantity(line.quantity_thousandths)
                    .map_err(ApiErr::from)?,
                unit: service::validate_unit(line.unit.as_deref()).map_err(ApiErr::from)?,
                unit_price_cents: service::validate_amount(line.unit_price_cents, "unit price")
                    .map_err(ApiErr::from)?,
            })
        })
        .collect()
}

/// Inputs for a new invoice row; totals are computed here.
pub(crate) struct NewInvoice<'a> {
    pub customer_id: &'a str,
    pub appointment_id: Option<&'a str>,
    pub service_amount_cents: i64,
    pub tax_treatment: TaxTreatment,
    pub issue_date: chrono::NaiveDate,
    pub due_date: chrono::NaiveDate,
    pub lines: Vec<MaterialLine>,
}

/// Insert an invoice with the next `INV-<year>-<seq>` number and its lines.
pub(crate) fn create_invoice(
    conn: &Connection,
    craftsman_id: &str,
    new: NewInvoice<'_>,
) -> Result<InvoiceResponse, ApiErr> {
    let totals = billing::compute_totals(new.service_amount_cents, &new.lines, new.tax_treatment);
    let doc_year = new.issue_date.year();

    let max_seq: Option<i64> =
        sq_query_row(conn, db::invoices::max_seq(craftsman_id, doc_year), |row| {
            row.get(0)
        })
        .map_err(ApiErr::from_db("next invoice number"))?;
    let doc_seq = max_seq.unwrap_or(0) + 1;
    let invoice_number = billing::format_document_number(INVOICE_NUMBER_PREFIX, doc_year, doc_seq);

    let id = Uuid::new_v4().to_string();
    sq_execute(
        conn,
        db::invoices::insert(&db::invoices::InsertParams {
            id: &id,
            craftsman_id,
            customer_id: new.customer_id,
            appointment_id: new.appointment_id,
            invoice_number: &invoice_number,
            doc_year,
            doc_seq,
            service_amount_cents: new.service_amount_cents,
            materials_total_cents: totals.materials_total_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            tax_treatment: new.tax_treatment.as_str(),
            issue_date: &new.issue_date.format(service::DATE_FMT).to_string(),
            due_date: &new.due_date.format(service::DATE_FMT).to_string(),
        }),
    )
    .map_err(ApiErr::from_db("insert invoice"))?;

    insert_lines(conn, &id, &new.lines)?;
    load_invoice(conn, craftsman_id, &id)
}

fn insert_lines(conn: &Connection, invoice_id: &str, lines: &[MaterialLine]) -> Result<(), ApiErr> {
    for (position, line) in lines.iter().enumerate() {
        let line_id = Uuid::new_v4().to_string();
        sq_execute(
            conn,
            db::invoices::insert_line(&line_id, invoice_id, line, position as i64),
        )
        .map_err(ApiErr::from_db("insert invoice line"))?;
    }
    Ok(())
}

/// Load one invoice with its lines; `404` when it does not exist.
pub(crate) fn load_invoice(
    conn: &Connection,
    craftsman_id: &str,
    id: &str,
) -> Result<InvoiceResponse, ApiErr> {
    let mut invoice = sq_query_row(conn, db::invoices::get(craftsman_id, id), invoice_from_row)
        .map_err(|_| ApiErr::not_found("invoice not found"))?;
    invoice.lines = sq_query_map(conn, db::invoices::lines_by_invoice(id), line_from_row)
        .map_err(ApiErr::from_db("load invoice lines"))?;
    Ok(invoice)
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

/// POST /api/invoices — create a draft invoice. Totals are always computed
/// server-side from the service amount and lines.
pub async fn create(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<InvoiceCreateRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiErr> {
    let service_amount_cents =
        service::validate_amount(req.service_amount_cents, "service amount").map_err(ApiErr::from)?;
    let lines = validate_lines(&req.lines)?;
    let issue_date = match req.issue_date {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => service::today(),
    };
    let due_date = match req.due_date {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => billing::default_due_date(issue_date),
    };
    let tax_treatment = req
        .tax_treatment
        .unwrap_or_else(|| craftsman.default_tax_treatment());

    let conn = db.conn();
    require_customer(&conn, &craftsman.craftsman_id, &req.customer_id)?;
    if let Some(ref appointment_id) = req.appointment_id {
        sq_query_row(
            &conn,
            db::appointments::get(&craftsman.craftsman_id, appointment_id),
            appointment_from_row,
        )
        .map_err(|_| ApiErr::not_found("appointment not found"))?;
    }

    let invoice = create_invoice(
        &conn,
        &craftsman.craftsman_id,
        NewInvoice {
            customer_id: &req.customer_id,
            appointment_id: req.appointment_id.as_deref(),
            service_amount_cents,
            tax_treatment,
            issue_date,
            due_date,
            lines,
        },
    )?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/invoices — paginated, newest numbers first.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<InvoiceListResponse>, ApiErr> {
    let built = db::invoices::list(&craftsman.craftsman_id, &query);
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count invoices"))?;
    let mut invoices = sq_query_map(&conn, built.select_query, invoice_from_row)
        .map_err(ApiErr::from_db("list invoices"))?;
    for invoice in &mut invoices {
        invoice.lines = sq_query_map(&conn, db::invoices::lines_by_invoice(&invoice.id), line_from_row)
            .map_err(ApiErr::from_db("load invoice lines"))?;
    }

    Ok(Json(InvoiceListResponse {
        invoices,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/invoices/{id}
pub async fn get(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiErr> {
    let conn = db.conn();
    let invoice = load_invoice(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(invoice))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/invoices/{id} — edit a draft; the number never changes, totals
/// are recomputed.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<InvoiceUpdateRequest>,
) -> Result<Json<InvoiceResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_invoice(&conn, &craftsman.craftsman_id, &id)?;
    if current.status != InvoiceStatus::Draft {
        return Err(ApiErr::conflict("only draft invoices can be edited"));
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
    let due_date = match req.due_date {
        Some(ref d) => service::parse_date(d).map_err(ApiErr::from)?,
        None => service::parse_date(&current.due_date).map_err(ApiErr::from)?,
    };
    let lines = match req.lines {
        Some(ref payload) => validate_lines(payload)?,
        None => current
            .lines
            .iter()
            .map(|l| MaterialLine {
                name: l.name.clone(),
                quantity_thousandths: l.quantity_thousandths,
                unit: l.unit.clone(),
                unit_price_cents: l.unit_price_cents,
            })
            .collect(),
    };
    let totals = billing::compute_totals(service_amount_cents, &lines, tax_treatment);

    sq_execute(
        &conn,
        db::invoices::update(
            &craftsman.craftsman_id,
            &id,
            &db::invoices::UpdateParams {
                service_amount_cents,
                materials_total_cents: totals.materials_total_cents,
                tax_cents: totals.tax_cents,
                total_cents: totals.total_cents,
                tax_treatment: tax_treatment.as_str(),
                issue_date: &issue_date.format(service::DATE_FMT).to_string(),
                due_date: &due_date.format(service::DATE_FMT).to_string(),
                updated_at: &service::sqlite_now(),
            },
        ),
    )
    .map_err(ApiErr::from_db("update invoice"))?;

    if req.lines.is_some() {
        sq_execute(&conn, db::invoices::delete_lines(&id))
            .map_err(ApiErr::from_db("replace invoice lines"))?;
        insert_lines(&conn, &id, &lines)?;
    }

    let invoice = load_invoice(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(invoice))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// POST /api/invoices/{id}/status — lifecycle transition
/// (`draft → open → paid`, cancellable until paid).
pub async fn set_status(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<InvoiceStatusRequest>,
) -> Result<Json<InvoiceResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_invoice(&conn, &craftsman.craftsman_id, &id)?;
    if !current.status.can_transition(req.status) {
        return Err(ApiErr::conflict(format!(
            "cannot transition invoice from {} to {}",
            current.status, req.status
        )));
    }

    let now = service::sqlite_now();
    let paid_at = match req.status {
        InvoiceStatus::Paid => Some(now.as_str()),
        _ => None,
    };
    sq_execute(
        &conn,
        db::invoices::set_status(
            &craftsman.craftsman_id,
            &id,
            req.status.as_str(),
            paid_at,
            &now,
        ),
    )
    .map_err(ApiErr::from_db("set invoice status"))?;

    let invoice = load_invoice(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(invoice))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/invoices/{id} — drafts only; issued invoices stay on record.
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_invoice(&conn, &craftsman.craftsman_id, &id)?;
    if current.status != InvoiceStatus::Draft {
        return Err(ApiErr::conflict("only draft invoices can be deleted"));
    }

    sq_execute(&conn, db::invoices::delete_lines(&id))
        .map_err(ApiErr::from_db("delete invoice lines"))?;
    sq_execute(&conn, db::invoices::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete invoice"))?;
    Ok(Json(OkResponse { ok: true }))
}

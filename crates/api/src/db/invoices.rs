//! Invoice and invoice-line query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::tables::{InvoiceLines, Invoices};
use super::{Built, BuiltListQuery, page_window};
use crate::InvoiceListQuery;

/// Column order must match `invoice_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Invoices::Id)
        .column(Invoices::InvoiceNumber)
        .column(Invoices::CustomerId)
        .column(Invoices::AppointmentId)
        .column(Invoices::ServiceAmountCents)
        .column(Invoices::MaterialsTotalCents)
        .column(Invoices::TaxCents)
        .column(Invoices::TotalCents)
        .column(Invoices::TaxTreatment)
        .column(Invoices::Status)
        .column(Invoices::IssueDate)
        .column(Invoices::DueDate)
        .column(Invoices::PaidAt)
        .column(Invoices::CreatedAt)
        .column(Invoices::UpdatedAt)
}

/// Parameters for inserting an invoice. Totals are the server-computed
/// values, never client input.
pub struct InsertParams<'a> {
    pub id: &'a str,
    pub craftsman_id: &'a str,
    pub customer_id: &'a str,
    pub appointment_id: Option<&'a str>,
    pub invoice_number: &'a str,
    pub doc_year: i32,
    pub doc_seq: i64,
    pub service_amount_cents: i64,
    pub materials_total_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tax_treatment: &'a str,
    pub issue_date: &'a str,
    pub due_date: &'a str,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Invoices::Table)
        .columns([
            Invoices::Id,
            Invoices::CraftsmanId,
            Invoices::CustomerId,
            Invoices::AppointmentId,
            Invoices::InvoiceNumber,
            Invoices::DocYear,
            Invoices::DocSeq,
            Invoices::ServiceAmountCents,
            Invoices::MaterialsTotalCents,
            Invoices::TaxCents,
            Invoices::TotalCents,
            Invoices::TaxTreatment,
            Invoices::IssueDate,
            Invoices::DueDate,
        ])
        .values_panic([
            p.id.into(),
            p.craftsman_id.into(),
            p.customer_id.into(),
            p.appointment_id.map(|s| s.to_string()).into(),
            p.invoice_number.into(),
            p.doc_year.into(),
            p.doc_seq.into(),
            p.service_amount_cents.into(),
            p.materials_total_cents.into(),
            p.tax_cents.into(),
            p.total_cents.into(),
            p.tax_treatment.into(),
            p.issue_date.into(),
            p.due_date.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Invoices::Table)
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// MAX(doc_seq) for the craftsman's year; `None` row value means no
/// documents yet.
pub fn max_seq(craftsman_id: &str, doc_year: i32) -> Built {
    Query::select()
        .expr(Func::max(Expr::col(Invoices::DocSeq)))
        .from(Invoices::Table)
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::DocYear).eq(doc_year))
        .build(SqliteQueryBuilder)
}

/// COUNT invoices referencing a customer (delete guard).
pub fn count_by_customer(craftsman_id: &str, customer_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Invoices::Table)
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::CustomerId).eq(customer_id))
        .build(SqliteQueryBuilder)
}

/// SUM of paid invoice totals for a year (finance summary). Matches on the
/// `paid_at` year prefix.
pub fn revenue_for_year(craftsman_id: &str, year: i32) -> Built {
    Query::select()
        .expr(Func::sum(Expr::col(Invoices::TotalCents)))
        .from(Invoices::Table)
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::Status).eq("paid"))
        .and_where(Expr::col(Invoices::PaidAt).like(format!("{year}-%")))
        .build(SqliteQueryBuilder)
}

pub fn list(craftsman_id: &str, q: &InvoiceListQuery) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Invoices::Table)
        .to_owned();
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(Invoices::Table);

    let scope = Expr::col(Invoices::CraftsmanId).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(status) = q.status {
        let cond = Expr::col(Invoices::Status).eq(status.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(ref customer_id) = q.customer_id {
        let cond = Expr::col(Invoices::CustomerId).eq(customer_id.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(year) = q.year {
        let cond = Expr::col(Invoices::DocYear).eq(year);
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Invoices::DocYear, Order::Desc)
        .order_by(Invoices::DocSeq, Order::Desc)
        .limit(per_page as u64)
        .offset(offset as u64);

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page: q.page,
        per_page,
    }
}

/// New amounts for a draft invoice (recomputed totals included).
pub struct UpdateParams<'a> {
    pub service_amount_cents: i64,
    pub materials_total_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tax_treatment: &'a str,
    pub issue_date: &'a str,
    pub due_date: &'a str,
    pub updated_at: &'a str,
}

pub fn update(craftsman_id: &str, id: &str, p: &UpdateParams<'_>) -> Built {
    Query::update()
        .table(Invoices::Table)
        .values([
            (Invoices::ServiceAmountCents, p.service_amount_cents.into()),
            (
                Invoices::MaterialsTotalCents,
                p.materials_total_cents.into(),
            ),
            (Invoices::TaxCents, p.tax_cents.into()),
            (Invoices::TotalCents, p.total_cents.into()),
            (Invoices::TaxTreatment, p.tax_treatment.into()),
            (Invoices::IssueDate, p.issue_date.into()),
            (Invoices::DueDate, p.due_date.into()),
            (Invoices::UpdatedAt, p.updated_at.into()),
        ])
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE the lifecycle status; `paid_at` is set when entering `paid`.
pub fn set_status(
    craftsman_id: &str,
    id: &str,
    status: &str,
    paid_at: Option<&str>,
    updated_at: &str,
) -> Built {
    Query::update()
        .table(Invoices::Table)
        .values([
            (Invoices::Status, status.into()),
            (Invoices::PaidAt, paid_at.map(|s| s.to_string()).into()),
            (Invoices::UpdatedAt, updated_at.into()),
        ])
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Invoices::Table)
        .and_where(Expr::col(Invoices::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Invoices::Id).eq(id))
        .build(SqliteQueryBuilder)
}

// ── Lines ──────────────────────────────────────────────────────────────────

pub fn insert_line(
    id: &str,
    invoice_id: &str,
    line: &zimmr_core::billing::MaterialLine,
    position: i64,
) -> Built {
    Query::insert()
        .into_table(InvoiceLines::Table)
        .columns([
            InvoiceLines::Id,
            InvoiceLines::InvoiceId,
            InvoiceLines::Name,
            InvoiceLines::QuantityThousandths,
            InvoiceLines::Unit,
            InvoiceLines::UnitPriceCents,
            InvoiceLines::Position,
        ])
        .values_panic([
            id.into(),
            invoice_id.into(),
            line.name.as_str().into(),
            line.quantity_thousandths.into(),
            line.unit.as_str().into(),
            line.unit_price_cents.into(),
            position.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order must match `line_from_row()` in the server.
pub fn lines_by_invoice(invoice_id: &str) -> Built {
    Query::select()
        .column(InvoiceLines::Name)
        .column(InvoiceLines::QuantityThousandths)
        .column(InvoiceLines::Unit)
        .column(InvoiceLines::UnitPriceCents)
        .from(InvoiceLines::Table)
        .and_where(Expr::col(InvoiceLines::InvoiceId).eq(invoice_id))
        .order_by(InvoiceLines::Position, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn delete_lines(invoice_id: &str) -> Built {
    Query::delete()
        .from_table(InvoiceLines::Table)
        .and_where(Expr::col(InvoiceLines::InvoiceId).eq(invoice_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InvoiceStatus;

    #[test]
    fn list_filters_bind_in_both_queries() {
        let q = InvoiceListQuery {
            page: 1,
            per_page: 20,
            status: Some(InvoiceStatus::Open),
            customer_id: None,
            year: Some(2026),
        };
        let built = list("c-1", &q);
        assert_eq!(built.count_query.1.0.len(), 3);
        assert!(built.select_query.0.contains("LIMIT"));
        assert!(built.select_query.1.0.len() >= 3);
    }

    #[test]
    fn revenue_query_matches_paid_year_prefix() {
        let (sql, values) = revenue_for_year("c-1", 2026);
        assert!(sql.contains("SUM"));
        assert!(sql.contains("LIKE"));
        assert_eq!(values.0.len(), 3);
    }
}

//! Quote and quote-line query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::tables::{QuoteLines, Quotes};
use super::{Built, BuiltListQuery, page_window};
use crate::QuoteListQuery;

/// Column order must match `quote_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Quotes::Id)
        .column(Quotes::QuoteNumber)
        .column(Quotes::CustomerId)
        .column(Quotes::ServiceAmountCents)
        .column(Quotes::MaterialsTotalCents)
        .column(Quotes::TaxCents)
        .column(Quotes::TotalCents)
        .column(Quotes::TaxTreatment)
        .column(Quotes::Status)
        .column(Quotes::IssueDate)
        .column(Quotes::ValidUntil)
        .column(Quotes::InvoiceId)
        .column(Quotes::CreatedAt)
        .column(Quotes::UpdatedAt)
}

pub struct InsertParams<'a> {
    pub id: &'a str,
    pub craftsman_id: &'a str,
    pub customer_id: &'a str,
    pub quote_number: &'a str,
    pub doc_year: i32,
    pub doc_seq: i64,
    pub service_amount_cents: i64,
    pub materials_total_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tax_treatment: &'a str,
    pub issue_date: &'a str,
    pub valid_until: &'a str,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Quotes::Table)
        .columns([
            Quotes::Id,
            Quotes::CraftsmanId,
            Quotes::CustomerId,
            Quotes::QuoteNumber,
            Quotes::DocYear,
            Quotes::DocSeq,
            Quotes::ServiceAmountCents,
            Quotes::MaterialsTotalCents,
            Quotes::TaxCents,
            Quotes::TotalCents,
            Quotes::TaxTreatment,
            Quotes::IssueDate,
            Quotes::ValidUntil,
        ])
        .values_panic([
            p.id.into(),
            p.craftsman_id.into(),
            p.customer_id.into(),
            p.quote_number.into(),
            p.doc_year.into(),
            p.doc_seq.into(),
            p.service_amount_cents.into(),
            p.materials_total_cents.into(),
            p.tax_cents.into(),
            p.total_cents.into(),
            p.tax_treatment.into(),
            p.issue_date.into(),
            p.valid_until.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Quotes::Table)
        .and_where(Expr::col(Quotes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Quotes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// MAX(doc_seq) for the craftsman's year.
pub fn max_seq(craftsman_id: &str, doc_year: i32) -> Built {
    Query::select()
        .expr(Func::max(Expr::col(Quotes::DocSeq)))
        .from(Quotes::Table)
        .and_where(Expr::col(Quotes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Quotes::DocYear).eq(doc_year))
        .build(SqliteQueryBuilder)
}

pub fn list(craftsman_id: &str, q: &QuoteListQuery) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Quotes::Table)
        .to_owned();
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(Quotes::Table);

    let scope = Expr::col(Quotes::CraftsmanId).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(status) = q.status {
        let cond = Expr::col(Quotes::Status).eq(status.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(ref customer_id) = q.customer_id {
        let cond = Expr::col(Quotes::CustomerId).eq(customer_id.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(year) = q.year {
        let cond = Expr::col(Quotes::DocYear).eq(year);
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Quotes::DocYear, Order::Desc)
        .order_by(Quotes::DocSeq, Order::Desc)
        .limit(per_page as u64)
        .offset(offset as u64);

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page: q.page,
        per_page,
    }
}

pub struct UpdateParams<'a> {
    pub service_amount_cents: i64,
    pub materials_total_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tax_treatment: &'a str,
    pub issue_date: &'a str,
    pub valid_until: &'a str,
    pub updated_at: &'a str,
}

pub fn update(craftsman_id: &str, id: &str, p: &UpdateParams<'_>) -> Built {
    Query::update()
        .table(Quotes::Table)
        .values([
            (Quotes::ServiceAmountCents, p.service_amount_cents.into()),
            (Quotes::MaterialsTotalCents, p.materials_total_cents.into()),
            (Quotes::TaxCents, p.tax_cents.into()),
            (Quotes::TotalCents, p.total_cents.into()),
            (Quotes::TaxTreatment, p.tax_treatment.into()),
            (Quotes::IssueDate, p.issue_date.into()),
            (Quotes::ValidUntil, p.valid_until.into()),
            (Quotes::UpdatedAt, p.updated_at.into()),
        ])
        .and_where(Expr::col(Quotes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Quotes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn set_status(craftsman_id: &str, id: &str, status: &str, updated_at: &str) -> Built {
    Query::update()
        .table(Quotes::Table)
        .values([
            (Quotes::Status, status.into()),
            (Quotes::UpdatedAt, updated_at.into()),
        ])
        .and_where(Expr::col(Quotes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Quotes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Record the invoice a quote was converted into.
pub fn set_invoice_id(craftsman_id: &str, id: &str, invoice_id: &str, updated_at: &str) -> Built {
    Query::update()
        .table(Quotes::Table)
        .values([
            (Quotes::InvoiceId, invoice_id.into()),
            (Quotes::UpdatedAt, updated_at.into()),
        ])
        .and_where(Expr::col(Quotes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Quotes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Quotes::Table)
        .and_where(Expr::col(Quotes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Quotes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

// ── Lines ──────────────────────────────────────────────────────────────────

pub fn insert_line(
    id: &str,
    quote_id: &str,
    line: &zimmr_core::billing::MaterialLine,
    position: i64,
) -> Built {
    Query::insert()
        .into_table(QuoteLines::Table)
        .columns([
            QuoteLines::Id,
            QuoteLines::QuoteId,
            QuoteLines::Name,
            QuoteLines::QuantityThousandths,
            QuoteLines::Unit,
            QuoteLines::UnitPriceCents,
            QuoteLines::Position,
        ])
        .values_panic([
            id.into(),
            quote_id.into(),
            line.name.as_str().into(),
            line.quantity_thousandths.into(),
            line.unit.as_str().into(),
            line.unit_price_cents.into(),
            position.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order must match `line_from_row()` in the server.
pub fn lines_by_quote(quote_id: &str) -> Built {
    Query::select()
        .column(QuoteLines::Name)
        .column(QuoteLines::QuantityThousandths)
        .column(QuoteLines::Unit)
        .column(QuoteLines::UnitPriceCents)
        .from(QuoteLines::Table)
        .and_where(Expr::col(QuoteLines::QuoteId).eq(quote_id))
        .order_by(QuoteLines::Position, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn delete_lines(quote_id: &str) -> Built {
    Query::delete()
        .from_table(QuoteLines::Table)
        .and_where(Expr::col(QuoteLines::QuoteId).eq(quote_id))
        .build(SqliteQueryBuilder)
}

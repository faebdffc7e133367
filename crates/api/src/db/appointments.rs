//! Appointment query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::tables::{Appointments, Customers};
use super::{Built, BuiltListQuery, page_window};
use crate::AppointmentListQuery;

/// Column order must match `appointment_from_row()` in the server.
/// `customer_name` comes from the customers join.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column((Appointments::Table, Appointments::Id))
        .column((Appointments::Table, Appointments::CustomerId))
        .column((Customers::Table, Customers::Name))
        .column((Appointments::Table, Appointments::Title))
        .column((Appointments::Table, Appointments::StartsAt))
        .column((Appointments::Table, Appointments::EndsAt))
        .column((Appointments::Table, Appointments::Location))
        .column((Appointments::Table, Appointments::Notes))
        .column((Appointments::Table, Appointments::Status))
        .column((Appointments::Table, Appointments::PriceCents))
        .column((Appointments::Table, Appointments::CreatedAt))
        .column((Appointments::Table, Appointments::UpdatedAt))
}

fn select_with_customer() -> sea_query::SelectStatement {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Appointments::Table)
        .left_join(
            Customers::Table,
            Expr::col((Appointments::Table, Appointments::CustomerId))
                .equals((Customers::Table, Customers::Id)),
        )
        .to_owned()
}

pub struct InsertParams<'a> {
    pub id: &'a str,
    pub craftsman_id: &'a str,
    pub customer_id: &'a str,
    pub title: &'a str,
    pub starts_at: &'a str,
    pub ends_at: &'a str,
    pub location: Option<&'a str>,
    pub notes: &'a str,
    pub price_cents: Option<i64>,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Appointments::Table)
        .columns([
            Appointments::Id,
            Appointments::CraftsmanId,
            Appointments::CustomerId,
            Appointments::Title,
            Appointments::StartsAt,
            Appointments::EndsAt,
            Appointments::Location,
            Appointments::Notes,
            Appointments::PriceCents,
        ])
        .values_panic([
            p.id.into(),
            p.craftsman_id.into(),
            p.customer_id.into(),
            p.title.into(),
            p.starts_at.into(),
            p.ends_at.into(),
            p.location.map(|s| s.to_string()).into(),
            p.notes.into(),
            p.price_cents.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT one appointment (with customer name), scoped to the craftsman.
pub fn get(craftsman_id: &str, id: &str) -> Built {
    select_with_customer()
        .and_where(Expr::col((Appointments::Table, Appointments::CraftsmanId)).eq(craftsman_id))
        .and_where(Expr::col((Appointments::Table, Appointments::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Paginated appointment list with status/customer/date-range filters.
/// `from`/`to` are stored-format datetime strings.
pub fn list(
    craftsman_id: &str,
    q: &AppointmentListQuery,
    from: Option<&str>,
    to: Option<&str>,
) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Appointments::Table)
        .to_owned();
    let mut select_q = select_with_customer();

    let scope = Expr::col((Appointments::Table, Appointments::CraftsmanId)).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(status) = q.status {
        let cond = Expr::col((Appointments::Table, Appointments::Status)).eq(status.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(ref customer_id) = q.customer_id {
        let cond =
            Expr::col((Appointments::Table, Appointments::CustomerId)).eq(customer_id.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(from) = from {
        let cond = Expr::col((Appointments::Table, Appointments::StartsAt)).gte(from);
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(to) = to {
        let cond = Expr::col((Appointments::Table, Appointments::StartsAt)).lte(to);
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by((Appointments::Table, Appointments::StartsAt), Order::Asc)
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
    pub title: &'a str,
    pub starts_at: &'a str,
    pub ends_at: &'a str,
    pub location: Option<&'a str>,
    pub notes: &'a str,
    pub price_cents: Option<i64>,
    pub updated_at: &'a str,
}

pub fn update(craftsman_id: &str, id: &str, p: &UpdateParams<'_>) -> Built {
    Query::update()
        .table(Appointments::Table)
        .values([
            (Appointments::Title, p.title.into()),
            (Appointments::StartsAt, p.starts_at.into()),
            (Appointments::EndsAt, p.ends_at.into()),
            (
                Appointments::Location,
                p.location.map(|s| s.to_string()).into(),
            ),
            (Appointments::Notes, p.notes.into()),
            (Appointments::PriceCents, p.price_cents.into()),
            (Appointments::UpdatedAt, p.updated_at.into()),
        ])
        .and_where(Expr::col(Appointments::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Appointments::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE only the lifecycle status.
pub fn set_status(craftsman_id: &str, id: &str, status: &str, updated_at: &str) -> Built {
    Query::update()
        .table(Appointments::Table)
        .values([
            (Appointments::Status, status.into()),
            (Appointments::UpdatedAt, updated_at.into()),
        ])
        .and_where(Expr::col(Appointments::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Appointments::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Appointments::Table)
        .and_where(Expr::col(Appointments::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Appointments::Id).eq(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppointmentStatus;

    #[test]
    fn list_applies_all_filters() {
        let q = AppointmentListQuery {
            page: 1,
            per_page: 20,
            status: Some(AppointmentStatus::Scheduled),
            customer_id: Some("cust-1".into()),
            from: None,
            to: None,
        };
        let built = list(
            "c-1",
            &q,
            Some("2026-01-01 00:00:00"),
            Some("2026-12-31 23:59:59"),
        );
        // scope + status + customer + from + to
        assert_eq!(built.count_query.1.0.len(), 5);
        assert!(built.select_query.0.contains("LEFT JOIN"));
    }
}

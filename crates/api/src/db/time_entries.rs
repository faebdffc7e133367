//! Time-tracking query builders.

use sea_query::{Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::TimeEntries;
use crate::TimeListQuery;

/// Built time-entry list: the page select plus the matching duration sum.
pub struct BuiltTimeList {
    pub select_query: Built,
    pub duration_query: Built,
}

/// Column order must match `time_entry_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(TimeEntries::Id)
        .column(TimeEntries::Description)
        .column(TimeEntries::CustomerId)
        .column(TimeEntries::AppointmentId)
        .column(TimeEntries::StartedAt)
        .column(TimeEntries::EndedAt)
        .column(TimeEntries::DurationSeconds)
}

pub struct InsertParams<'a> {
    pub id: &'a str,
    pub craftsman_id: &'a str,
    pub customer_id: Option<&'a str>,
    pub appointment_id: Option<&'a str>,
    pub description: &'a str,
    pub started_at: &'a str,
}

/// INSERT a running entry (no `ended_at`).
pub fn insert_running(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(TimeEntries::Table)
        .columns([
            TimeEntries::Id,
            TimeEntries::CraftsmanId,
            TimeEntries::CustomerId,
            TimeEntries::AppointmentId,
            TimeEntries::Description,
            TimeEntries::StartedAt,
        ])
        .values_panic([
            p.id.into(),
            p.craftsman_id.into(),
            p.customer_id.map(|s| s.to_string()).into(),
            p.appointment_id.map(|s| s.to_string()).into(),
            p.description.into(),
            p.started_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(TimeEntries::Table)
        .and_where(Expr::col(TimeEntries::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(TimeEntries::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// SELECT the id of the craftsman's running entry, if any.
pub fn running(craftsman_id: &str) -> Built {
    Query::select()
        .column(TimeEntries::Id)
        .from(TimeEntries::Table)
        .and_where(Expr::col(TimeEntries::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(TimeEntries::EndedAt).is_null())
        .build(SqliteQueryBuilder)
}

/// Close a running entry.
pub fn stop(craftsman_id: &str, id: &str, ended_at: &str, duration_seconds: i64) -> Built {
    Query::update()
        .table(TimeEntries::Table)
        .values([
            (TimeEntries::EndedAt, ended_at.into()),
            (TimeEntries::DurationSeconds, duration_seconds.into()),
        ])
        .and_where(Expr::col(TimeEntries::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(TimeEntries::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Filtered list plus the duration sum over the same filter.
/// `from`/`to` are stored-format datetime strings.
pub fn list(
    craftsman_id: &str,
    q: &TimeListQuery,
    from: Option<&str>,
    to: Option<&str>,
) -> BuiltTimeList {
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(TimeEntries::Table);
    let mut sum_q = Query::select()
        .expr(Func::sum(Expr::col(TimeEntries::DurationSeconds)))
        .from(TimeEntries::Table)
        .to_owned();

    let scope = Expr::col(TimeEntries::CraftsmanId).eq(craftsman_id);
    select_q.and_where(scope.clone());
    sum_q.and_where(scope);

    if let Some(ref customer_id) = q.customer_id {
        let cond = Expr::col(TimeEntries::CustomerId).eq(customer_id.as_str());
        select_q.and_where(cond.clone());
        sum_q.and_where(cond);
    }

    if let Some(running) = q.running {
        let cond = if running {
            Expr::col(TimeEntries::EndedAt).is_null()
        } else {
            Expr::col(TimeEntries::EndedAt).is_not_null()
        };
        select_q.and_where(cond.clone());
        sum_q.and_where(cond);
    }

    if let Some(from) = from {
        let cond = Expr::col(TimeEntries::StartedAt).gte(from);
        select_q.and_where(cond.clone());
        sum_q.and_where(cond);
    }

    if let Some(to) = to {
        let cond = Expr::col(TimeEntries::StartedAt).lte(to);
        select_q.and_where(cond.clone());
        sum_q.and_where(cond);
    }

    select_q.order_by(TimeEntries::StartedAt, Order::Desc);

    BuiltTimeList {
        select_query: select_q.build(SqliteQueryBuilder),
        duration_query: sum_q.build(SqliteQueryBuilder),
    }
}

pub struct UpdateParams<'a> {
    pub description: &'a str,
    pub started_at: &'a str,
    pub ended_at: Option<&'a str>,
    pub customer_id: Option<&'a str>,
    pub duration_seconds: i64,
}

pub fn update(craftsman_id: &str, id: &str, p: &UpdateParams<'_>) -> Built {
    Query::update()
        .table(TimeEntries::Table)
        .values([
            (TimeEntries::Description, p.description.into()),
            (TimeEntries::StartedAt, p.started_at.into()),
            (TimeEntries::EndedAt, p.ended_at.map(|s| s.to_string()).into()),
            (
                TimeEntries::CustomerId,
                p.customer_id.map(|s| s.to_string()).into(),
            ),
            (TimeEntries::DurationSeconds, p.duration_seconds.into()),
        ])
        .and_where(Expr::col(TimeEntries::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(TimeEntries::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a finished entry. Running entries (`ended_at IS NULL`) are never
/// matched; stopping first is required.
pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(TimeEntries::Table)
        .and_where(Expr::col(TimeEntries::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(TimeEntries::Id).eq(id))
        .and_where(Expr::col(TimeEntries::EndedAt).is_not_null())
        .build(SqliteQueryBuilder)
}

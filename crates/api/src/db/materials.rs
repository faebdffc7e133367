//! Materials catalog query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::tables::Materials;
use super::{Built, BuiltListQuery, page_window};
use crate::MaterialListQuery;

/// Column order must match `material_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Materials::Id)
        .column(Materials::Name)
        .column(Materials::Unit)
        .column(Materials::UnitPriceCents)
        .column(Materials::CreatedAt)
        .column(Materials::UpdatedAt)
}

pub fn insert(
    id: &str,
    craftsman_id: &str,
    name: &str,
    unit: &str,
    unit_price_cents: i64,
) -> Built {
    Query::insert()
        .into_table(Materials::Table)
        .columns([
            Materials::Id,
            Materials::CraftsmanId,
            Materials::Name,
            Materials::Unit,
            Materials::UnitPriceCents,
        ])
        .values_panic([
            id.into(),
            craftsman_id.into(),
            name.into(),
            unit.into(),
            unit_price_cents.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Materials::Table)
        .and_where(Expr::col(Materials::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Materials::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// SELECT `unit, unit_price_cents` by exact name (auto-invoice catalog
/// resolution).
pub fn by_name(craftsman_id: &str, name: &str) -> Built {
    Query::select()
        .column(Materials::Unit)
        .column(Materials::UnitPriceCents)
        .from(Materials::Table)
        .and_where(Expr::col(Materials::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Materials::Name).eq(name))
        .build(SqliteQueryBuilder)
}

pub fn list(craftsman_id: &str, q: &MaterialListQuery) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Materials::Table)
        .to_owned();
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(Materials::Table);

    let scope = Expr::col(Materials::CraftsmanId).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(ref search) = q.search {
        let cond = Expr::col(Materials::Name).like(format!("%{search}%"));
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Materials::Name, Order::Asc)
        .limit(per_page as u64)
        .offset(offset as u64);

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page: q.page,
        per_page,
    }
}

pub fn update(
    craftsman_id: &str,
    id: &str,
    name: &str,
    unit: &str,
    unit_price_cents: i64,
    updated_at: &str,
) -> Built {
    Query::update()
        .table(Materials::Table)
        .values([
            (Materials::Name, name.into()),
            (Materials::Unit, unit.into()),
            (Materials::UnitPriceCents, unit_price_cents.into()),
            (Materials::UpdatedAt, updated_at.into()),
        ])
        .and_where(Expr::col(Materials::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Materials::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Materials::Table)
        .and_where(Expr::col(Materials::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Materials::Id).eq(id))
        .build(SqliteQueryBuilder)
}

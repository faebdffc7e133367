//! Note query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::tables::Notes;
use super::{Built, BuiltListQuery, page_window};
use crate::NoteListQuery;

/// Column order must match `note_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Notes::Id)
        .column(Notes::Title)
        .column(Notes::Body)
        .column(Notes::CustomerId)
        .column(Notes::Tags)
        .column(Notes::Pinned)
        .column(Notes::CreatedAt)
        .column(Notes::UpdatedAt)
}

pub struct InsertParams<'a> {
    pub id: &'a str,
    pub craftsman_id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub customer_id: Option<&'a str>,
    pub tags: &'a str,
    pub pinned: bool,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Notes::Table)
        .columns([
            Notes::Id,
            Notes::CraftsmanId,
            Notes::Title,
            Notes::Body,
            Notes::CustomerId,
            Notes::Tags,
            Notes::Pinned,
        ])
        .values_panic([
            p.id.into(),
            p.craftsman_id.into(),
            p.title.into(),
            p.body.into(),
            p.customer_id.map(|s| s.to_string()).into(),
            p.tags.into(),
            p.pinned.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Notes::Table)
        .and_where(Expr::col(Notes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Notes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Paginated note list; pinned notes first, then most recently updated.
pub fn list(craftsman_id: &str, q: &NoteListQuery) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Notes::Table)
        .to_owned();
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(Notes::Table);

    let scope = Expr::col(Notes::CraftsmanId).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(ref search) = q.search {
        let like = format!("%{search}%");
        let cond = Expr::col(Notes::Title)
            .like(&like)
            .or(Expr::col(Notes::Body).like(&like))
            .or(Expr::col(Notes::Tags).like(&like));
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(ref customer_id) = q.customer_id {
        let cond = Expr::col(Notes::CustomerId).eq(customer_id.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Notes::Pinned, Order::Desc)
        .order_by(Notes::UpdatedAt, Order::Desc)
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
    pub body: &'a str,
    pub customer_id: Option<&'a str>,
    pub tags: &'a str,
    pub pinned: bool,
    pub updated_at: &'a str,
}

pub fn update(craftsman_id: &str, id: &str, p: &UpdateParams<'_>) -> Built {
    Query::update()
        .table(Notes::Table)
        .values([
            (Notes::Title, p.title.into()),
            (Notes::Body, p.body.into()),
            (Notes::CustomerId, p.customer_id.map(|s| s.to_string()).into()),
            (Notes::Tags, p.tags.into()),
            (Notes::Pinned, p.pinned.into()),
            (Notes::UpdatedAt, p.updated_at.into()),
        ])
        .and_where(Expr::col(Notes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Notes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Notes::Table)
        .and_where(Expr::col(Notes::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Notes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

//! Customer query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Query, SqliteQueryBuilder};

use super::tables::Customers;
use super::{Built, BuiltListQuery, page_window};
use crate::CustomerListQuery;

/// Column order must match `customer_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Customers::Id)
        .column(Customers::Name)
        .column(Customers::Email)
        .column(Customers::Phone)
        .column(Customers::Address)
        .column(Customers::Notes)
        .column(Customers::CreatedAt)
        .column(Customers::UpdatedAt)
}

pub struct InsertParams<'a> {
    pub id: &'a str,
    pub craftsman_id: &'a str,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Customers::Table)
        .columns([
            Customers::Id,
            Customers::CraftsmanId,
            Customers::Name,
            Customers::Email,
            Customers::Phone,
            Customers::Address,
            Customers::Notes,
        ])
        .values_panic([
            p.id.into(),
            p.craftsman_id.into(),
            p.name.into(),
            p.email.map(|s| s.to_string()).into(),
            p.phone.map(|s| s.to_string()).into(),
            p.address.map(|s| s.to_string()).into(),
            p.notes.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT one customer, scoped to the craftsman.
pub fn get(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Customers::Table)
        .and_where(Expr::col(Customers::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Customers::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// COUNT a customer id within the craftsman's scope (ownership check).
pub fn exists(craftsman_id: &str, id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Customers::Table)
        .and_where(Expr::col(Customers::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Customers::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Paginated customer list with optional search.
pub fn list(craftsman_id: &str, q: &CustomerListQuery) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Customers::Table)
        .to_owned();
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(Customers::Table);

    let scope = Expr::col(Customers::CraftsmanId).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(ref search) = q.search {
        let like = format!("%{search}%");
        let cond = Expr::col(Customers::Name)
            .like(&like)
            .or(Expr::col(Customers::Email).like(&like))
            .or(Expr::col(Customers::Phone).like(&like));
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Customers::CreatedAt, sea_query::Order::Desc)
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
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: &'a str,
}

pub fn update(craftsman_id: &str, id: &str, p: &UpdateParams<'_>) -> Built {
    Query::update()
        .table(Customers::Table)
        .values([
            (Customers::Name, p.name.into()),
            (Customers::Email, p.email.map(|s| s.to_string()).into()),
            (Customers::Phone, p.phone.map(|s| s.to_string()).into()),
            (Customers::Address, p.address.map(|s| s.to_string()).into()),
            (Customers::Notes, p.notes.map(|s| s.to_string()).into()),
            (Customers::UpdatedAt, p.updated_at.into()),
        ])
        .and_where(Expr::col(Customers::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Customers::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Customers::Table)
        .and_where(Expr::col(Customers::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Customers::Id).eq(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_search_binds_all_filters() {
        let q = CustomerListQuery {
            page: 2,
            per_page: 10,
            search: Some("meier".into()),
        };
        let built = list("c-1", &q);
        assert_eq!(built.per_page, 10);
        // scope + 3 LIKE params
        assert_eq!(built.count_query.1.0.len(), 4);
        assert!(built.select_query.0.contains("LIMIT"));
        assert!(built.select_query.0.contains("OFFSET"));
    }

    #[test]
    fn per_page_is_clamped() {
        let q = CustomerListQuery {
            page: 1,
            per_page: 1000,
            search: None,
        };
        assert_eq!(list("c-1", &q).per_page, 100);
    }
}

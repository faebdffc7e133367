//! Craftsman (tenant) query builders.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Craftsmen;

/// Column order must match `craftsman_from_row()` in the server.
fn profile_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Craftsmen::Id)
        .column(Craftsmen::CompanyName)
        .column(Craftsmen::ContactName)
        .column(Craftsmen::Email)
        .column(Craftsmen::Phone)
        .column(Craftsmen::Address)
        .column(Craftsmen::VatExempt)
        .column(Craftsmen::CreatedAt)
}

/// INSERT a new craftsman.
pub fn insert(id: &str, company_name: &str, api_key: &str) -> Built {
    Query::insert()
        .into_table(Craftsmen::Table)
        .columns([Craftsmen::Id, Craftsmen::CompanyName, Craftsmen::ApiKey])
        .values_panic([id.into(), company_name.into(), api_key.into()])
        .build(SqliteQueryBuilder)
}

/// SELECT `id, company_name, vat_exempt` by API key (auth lookup).
pub fn by_api_key(api_key: &str) -> Built {
    Query::select()
        .column(Craftsmen::Id)
        .column(Craftsmen::CompanyName)
        .column(Craftsmen::VatExempt)
        .from(Craftsmen::Table)
        .and_where(Expr::col(Craftsmen::ApiKey).eq(api_key))
        .build(SqliteQueryBuilder)
}

/// SELECT the full profile by id.
pub fn get(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.from(Craftsmen::Table)
        .and_where(Expr::col(Craftsmen::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Final profile values after merging an update request.
pub struct ProfileParams<'a> {
    pub company_name: &'a str,
    pub contact_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub vat_exempt: bool,
}

/// UPDATE the profile row.
pub fn update_profile(id: &str, p: &ProfileParams<'_>) -> Built {
    Query::update()
        .table(Craftsmen::Table)
        .values([
            (Craftsmen::CompanyName, p.company_name.into()),
            (
                Craftsmen::ContactName,
                p.contact_name.map(|s| s.to_string()).into(),
            ),
            (Craftsmen::Email, p.email.map(|s| s.to_string()).into()),
            (Craftsmen::Phone, p.phone.map(|s| s.to_string()).into()),
            (Craftsmen::Address, p.address.map(|s| s.to_string()).into()),
            (Craftsmen::VatExempt, p.vat_exempt.into()),
        ])
        .and_where(Expr::col(Craftsmen::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE the API key (rotation).
pub fn update_api_key(id: &str, api_key: &str) -> Built {
    Query::update()
        .table(Craftsmen::Table)
        .values([(Craftsmen::ApiKey, api_key.into())])
        .and_where(Expr::col(Craftsmen::Id).eq(id))
        .build(SqliteQueryBuilder)
}

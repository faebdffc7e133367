//! Shared database schema, migrations, and query builders.
//!
//! Every builder returns a `(sql, values)` pair built with
//! `SqliteQueryBuilder`; the server bridges the values into rusqlite params.

pub mod appointments;
pub mod craftsmen;
pub mod customers;
pub mod finances;
pub mod invoices;
pub mod materials;
pub mod migrations;
pub mod notes;
pub mod quotes;
pub mod tables;
pub mod time_entries;

pub use tables::*;

/// A built query: SQL text plus bound values.
pub type Built = (String, sea_query::Values);

/// A paginated list query pair (count + page select).
pub struct BuiltListQuery {
    pub count_query: Built,
    pub select_query: Built,
    pub page: u32,
    pub per_page: u32,
}

/// Clamp pagination inputs: `(per_page, offset)`.
pub(crate) fn page_window(page: u32, per_page: u32) -> (u32, u32) {
    let per_page = per_page.clamp(1, 100);
    let offset = page.saturating_sub(1) * per_page;
    (per_page, offset)
}

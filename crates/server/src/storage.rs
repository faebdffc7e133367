use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use zimmr_api::db::Built;
use zimmr_api::db::migrations::MIGRATIONS;
use zimmr_api::{
    AppointmentResponse, AppointmentStatus, CraftsmanProfileResponse, CustomerResponse,
    ExpenseResponse, InvoiceResponse, InvoiceStatus, LineResponse, MaterialResponse, NoteResponse,
    QuoteResponse, QuoteStatus, TaxTreatment, TimeEntryResponse,
};

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("zimmr.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    // WAL for better concurrent read performance
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// sea-query bridge
// ---------------------------------------------------------------------------

fn bind_params(values: sea_query::Values) -> Vec<rusqlite::types::Value> {
    use rusqlite::types::Value as Sql;
    use sea_query::Value;

    values
        .0
        .into_iter()
        .map(|v| match v {
            Value::Bool(b) => b.map(|b| Sql::Integer(b as i64)).unwrap_or(Sql::Null),
            Value::TinyInt(i) => i.map(|i| Sql::Integer(i as i64)).unwrap_or(Sql::Null),
            Value::SmallInt(i) => i.map(|i| Sql::Integer(i as i64)).unwrap_or(Sql::Null),
            Value::Int(i) => i.map(|i| Sql::Integer(i as i64)).unwrap_or(Sql::Null),
            Value::BigInt(i) => i.map(Sql::Integer).unwrap_or(Sql::Null),
            Value::TinyUnsigned(u) => u.map(|u| Sql::Integer(u as i64)).unwrap_or(Sql::Null),
            Value::SmallUnsigned(u) => u.map(|u| Sql::Integer(u as i64)).unwrap_or(Sql::Null),
            Value::Unsigned(u) => u.map(|u| Sql::Integer(u as i64)).unwrap_or(Sql::Null),
            Value::BigUnsigned(u) => u.map(|u| Sql::Integer(u as i64)).unwrap_or(Sql::Null),
            Value::Float(f) => f.map(|f| Sql::Real(f as f64)).unwrap_or(Sql::Null),
            Value::Double(f) => f.map(Sql::Real).unwrap_or(Sql::Null),
            Value::String(s) => s.map(|s| Sql::Text(*s)).unwrap_or(Sql::Null),
            Value::Char(c) => c.map(|c| Sql::Text(c.to_string())).unwrap_or(Sql::Null),
            Value::Bytes(b) => b.map(|b| Sql::Blob(*b)).unwrap_or(Sql::Null),
        })
        .collect()
}

/// Execute a built statement, returning the affected row count.
pub fn sq_execute(conn: &Connection, built: Built) -> rusqlite::Result<usize> {
    let (sql, values) = built;
    conn.execute(&sql, rusqlite::params_from_iter(bind_params(values)))
}

/// Run a built query expected to return a single row.
pub fn sq_query_row<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let (sql, values) = built;
    conn.query_row(&sql, rusqlite::params_from_iter(bind_params(values)), f)
}

/// Run a built query and collect all mapped rows.
pub fn sq_query_map<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let (sql, values) = built;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind_params(values)), f)?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Row mappers — column order matches the builders in zimmr_api::db
// ---------------------------------------------------------------------------

pub fn craftsman_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CraftsmanProfileResponse> {
    Ok(CraftsmanProfileResponse {
        craftsman_id: row.get(0)?,
        company_name: row.get(1)?,
        contact_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        vat_exempt: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn customer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CustomerResponse> {
    Ok(CustomerResponse {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn appointment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentResponse> {
    let status: String = row.get(8)?;
    Ok(AppointmentResponse {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        title: row.get(3)?,
        starts_at: row.get(4)?,
        ends_at: row.get(5)?,
        location: row.get(6)?,
        notes: row.get(7)?,
        status: AppointmentStatus::parse(&status).unwrap_or_default(),
        price_cents: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub fn material_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MaterialResponse> {
    Ok(MaterialResponse {
        id: row.get(0)?,
        name: row.get(1)?,
        unit: row.get(2)?,
        unit_price_cents: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Lines are loaded separately; the mapper leaves them empty.
pub fn invoice_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvoiceResponse> {
    let treatment: String = row.get(8)?;
    let status: String = row.get(9)?;
    Ok(InvoiceResponse {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        customer_id: row.get(2)?,
        appointment_id: row.get(3)?,
        service_amount_cents: row.get(4)?,
        materials_total_cents: row.get(5)?,
        tax_cents: row.get(6)?,
        total_cents: row.get(7)?,
        tax_treatment: TaxTreatment::parse(&treatment).unwrap_or_default(),
        status: InvoiceStatus::parse(&status).unwrap_or_default(),
        issue_date: row.get(10)?,
        due_date: row.get(11)?,
        paid_at: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
        lines: Vec::new(),
    })
}

/// Lines are loaded separately; the mapper leaves them empty.
pub fn quote_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<QuoteResponse> {
    let treatment: String = row.get(7)?;
    let status: String = row.get(8)?;
    Ok(QuoteResponse {
        id: row.get(0)?,
        quote_number: row.get(1)?,
        customer_id: row.get(2)?,
        service_amount_cents: row.get(3)?,
        materials_total_cents: row.get(4)?,
        tax_cents: row.get(5)?,
        total_cents: row.get(6)?,
        tax_treatment: TaxTreatment::parse(&treatment).unwrap_or_default(),
        status: QuoteStatus::parse(&status).unwrap_or_default(),
        issue_date: row.get(9)?,
        valid_until: row.get(10)?,
        invoice_id: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        lines: Vec::new(),
    })
}

pub fn line_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LineResponse> {
    let quantity_thousandths: i64 = row.get(1)?;
    let unit_price_cents: i64 = row.get(3)?;
    Ok(LineResponse {
        name: row.get(0)?,
        quantity_thousandths,
        unit: row.get(2)?,
        unit_price_cents,
        total_cents: zimmr_core::money::line_total(quantity_thousandths, unit_price_cents),
    })
}

pub fn note_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteResponse> {
    Ok(NoteResponse {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        customer_id: row.get(3)?,
        tags: row.get(4)?,
        pinned: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn time_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimeEntryResponse> {
    let ended_at: Option<String> = row.get(5)?;
    Ok(TimeEntryResponse {
        id: row.get(0)?,
        description: row.get(1)?,
        customer_id: row.get(2)?,
        appointment_id: row.get(3)?,
        started_at: row.get(4)?,
        running: ended_at.is_none(),
        ended_at,
        duration_seconds: row.get(6)?,
    })
}

pub fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExpenseResponse> {
    Ok(ExpenseResponse {
        id: row.get(0)?,
        description: row.get(1)?,
        amount_cents: row.get(2)?,
        category: row.get(3)?,
        spent_on: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zimmr_api::{CustomerListQuery, db};

    fn test_db() -> (tempfile::TempDir, Db) {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path()).unwrap();
        (dir, db)
    }

    /// One craftsman (`c-1`) with one customer (`cust-1`).
    fn seed_account(conn: &rusqlite::Connection) {
        sq_execute(conn, db::craftsmen::insert("c-1", "Meier GmbH", "zmr_test")).unwrap();
        sq_execute(
            conn,
            db::customers::insert(&db::customers::InsertParams {
                id: "cust-1",
                craftsman_id: "c-1",
                name: "Schulze",
                email: None,
                phone: None,
                address: None,
                notes: None,
            }),
        )
        .unwrap();
    }

    fn seed_invoice(conn: &rusqlite::Connection, id: &str) {
        sq_execute(
            conn,
            db::invoices::insert(&db::invoices::InsertParams {
                id,
                craftsman_id: "c-1",
                customer_id: "cust-1",
                appointment_id: None,
                invoice_number: "INV-2026-0001",
                doc_year: 2026,
                doc_seq: 1,
                service_amount_cents: 10_000,
                materials_total_cents: 0,
                tax_cents: 1_900,
                total_cents: 11_900,
                tax_treatment: "standard",
                issue_date: "2026-08-29",
                due_date: "2026-09-12",
            }),
        )
        .unwrap();
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        init_db(dir.path()).unwrap();
        // Re-opening must not re-run (or fail on) applied migrations.
        init_db(dir.path()).unwrap();
    }

    #[test]
    fn built_queries_round_trip_through_rusqlite() {
        let (_dir, db) = test_db();
        let conn = db.conn();

        sq_execute(&conn, db::craftsmen::insert("c-1", "Meier GmbH", "zmr_test")).unwrap();
        let (id, company, vat_exempt) =
            sq_query_row(&conn, db::craftsmen::by_api_key("zmr_test"), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            })
            .unwrap();
        assert_eq!(id, "c-1");
        assert_eq!(company, "Meier GmbH");
        assert!(!vat_exempt);

        sq_execute(
            &conn,
            db::customers::insert(&db::customers::InsertParams {
                id: "cust-1",
                craftsman_id: "c-1",
                name: "Schulze",
                email: None,
                phone: Some("030 123456"),
                address: None,
                notes: None,
            }),
        )
        .unwrap();

        let built = db::customers::list(
            "c-1",
            &CustomerListQuery {
                page: 1,
                per_page: 20,
                search: Some("schu".into()),
            },
        );
        let customers = sq_query_map(&conn, built.select_query, customer_from_row).unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Schulze");
        assert_eq!(customers[0].phone.as_deref(), Some("030 123456"));
    }

    #[test]
    fn null_option_params_bind_as_null() {
        let (_dir, db) = test_db();
        let conn = db.conn();
        sq_execute(&conn, db::craftsmen::insert("c-1", "Meier GmbH", "zmr_test")).unwrap();
        sq_execute(
            &conn,
            db::customers::insert(&db::customers::InsertParams {
                id: "cust-1",
                craftsman_id: "c-1",
                name: "Schulze",
                email: None,
                phone: None,
                address: None,
                notes: None,
            }),
        )
        .unwrap();
        let customer =
            sq_query_row(&conn, db::customers::get("c-1", "cust-1"), customer_from_row).unwrap();
        assert!(customer.email.is_none());
    }

    #[test]
    fn running_time_entries_cannot_be_deleted() {
        let (_dir, db) = test_db();
        let conn = db.conn();
        seed_account(&conn);

        sq_execute(
            &conn,
            db::time_entries::insert_running(&db::time_entries::InsertParams {
                id: "t-1",
                craftsman_id: "c-1",
                customer_id: Some("cust-1"),
                appointment_id: None,
                description: "Verlegung",
                started_at: "2026-08-29 08:00:00",
            }),
        )
        .unwrap();

        // The delete never matches while ended_at is NULL.
        let affected = sq_execute(&conn, db::time_entries::delete("c-1", "t-1")).unwrap();
        assert_eq!(affected, 0);
        let entry =
            sq_query_row(&conn, db::time_entries::get("c-1", "t-1"), time_entry_from_row).unwrap();
        assert!(entry.running);

        sq_execute(
            &conn,
            db::time_entries::stop("c-1", "t-1", "2026-08-29 09:30:00", 5400),
        )
        .unwrap();
        let affected = sq_execute(&conn, db::time_entries::delete("c-1", "t-1")).unwrap();
        assert_eq!(affected, 1);
    }

    #[test]
    fn one_running_entry_per_account() {
        let (_dir, db) = test_db();
        let conn = db.conn();
        seed_account(&conn);

        // Nothing running yet.
        let err = sq_query_row(&conn, db::time_entries::running("c-1"), |row| {
            row.get::<_, String>(0)
        })
        .unwrap_err();
        assert!(matches!(err, rusqlite::Error::QueryReturnedNoRows));

        sq_execute(
            &conn,
            db::time_entries::insert_running(&db::time_entries::InsertParams {
                id: "t-1",
                craftsman_id: "c-1",
                customer_id: None,
                appointment_id: None,
                description: "Aufmass",
                started_at: "2026-08-29 08:00:00",
            }),
        )
        .unwrap();

        // The second start must see t-1 and refuse.
        let running: String =
            sq_query_row(&conn, db::time_entries::running("c-1"), |row| row.get(0)).unwrap();
        assert_eq!(running, "t-1");

        sq_execute(
            &conn,
            db::time_entries::stop("c-1", "t-1", "2026-08-29 09:00:00", 3600),
        )
        .unwrap();
        // Stopped entries no longer count as running, so a second stop 409s.
        let entry =
            sq_query_row(&conn, db::time_entries::get("c-1", "t-1"), time_entry_from_row).unwrap();
        assert!(!entry.running);
        let err = sq_query_row(&conn, db::time_entries::running("c-1"), |row| {
            row.get::<_, String>(0)
        })
        .unwrap_err();
        assert!(matches!(err, rusqlite::Error::QueryReturnedNoRows));
    }

    #[test]
    fn quote_conversion_records_the_invoice_back_reference() {
        let (_dir, db) = test_db();
        let conn = db.conn();
        seed_account(&conn);

        sq_execute(
            &conn,
            db::quotes::insert(&db::quotes::InsertParams {
                id: "q-1",
                craftsman_id: "c-1",
                customer_id: "cust-1",
                quote_number: "QUO-2026-0001",
                doc_year: 2026,
                doc_seq: 1,
                service_amount_cents: 10_000,
                materials_total_cents: 0,
                tax_cents: 1_900,
                total_cents: 11_900,
                tax_treatment: "standard",
                issue_date: "2026-08-29",
                valid_until: "2026-09-12",
            }),
        )
        .unwrap();

        let quote = sq_query_row(&conn, db::quotes::get("c-1", "q-1"), quote_from_row).unwrap();
        assert!(quote.invoice_id.is_none());

        seed_invoice(&conn, "inv-1");
        sq_execute(
            &conn,
            db::quotes::set_invoice_id("c-1", "q-1", "inv-1", "2026-08-29 10:00:00"),
        )
        .unwrap();

        // A second convert must see the back-reference and refuse.
        let quote = sq_query_row(&conn, db::quotes::get("c-1", "q-1"), quote_from_row).unwrap();
        assert_eq!(quote.invoice_id.as_deref(), Some("inv-1"));
    }

    #[test]
    fn customers_with_invoices_are_counted_by_the_delete_guard() {
        let (_dir, db) = test_db();
        let conn = db.conn();
        seed_account(&conn);

        let count: i64 =
            sq_query_row(&conn, db::invoices::count_by_customer("c-1", "cust-1"), |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 0);

        seed_invoice(&conn, "inv-1");
        let count: i64 =
            sq_query_row(&conn, db::invoices::count_by_customer("c-1", "cust-1"), |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn cancelled_appointments_are_no_longer_scheduled() {
        let (_dir, db) = test_db();
        let conn = db.conn();
        seed_account(&conn);

        sq_execute(
            &conn,
            db::appointments::insert(&db::appointments::InsertParams {
                id: "a-1",
                craftsman_id: "c-1",
                customer_id: "cust-1",
                title: "Badsanierung",
                starts_at: "2026-09-01 08:00:00",
                ends_at: "2026-09-01 16:00:00",
                location: None,
                notes: "",
                price_cents: Some(50_000),
            }),
        )
        .unwrap();

        sq_execute(
            &conn,
            db::appointments::set_status("c-1", "a-1", "cancelled", "2026-08-29 10:00:00"),
        )
        .unwrap();

        // Complete must refuse anything that is not scheduled.
        let appointment =
            sq_query_row(&conn, db::appointments::get("c-1", "a-1"), appointment_from_row).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Cancelled);
    }
}

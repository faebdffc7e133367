use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use uuid::Uuid;

use zimmr_api::{
    OkResponse, TimeEntryResponse, TimeListQuery, TimeListResponse, TimeStartRequest,
    TimeUpdateRequest, db, service,
};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_row, time_entry_from_row};

fn load_entry(conn: &Connection, craftsman_id: &str, id: &str) -> Result<TimeEntryResponse, ApiErr> {
    sq_query_row(conn, db::time_entries::get(craftsman_id, id), time_entry_from_row)
        .map_err(|_| ApiErr::not_found("time entry not found"))
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// POST /api/time-tracking/start — begin the clock. At most one entry may be
/// running per account.
pub async fn start(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<TimeStartRequest>,
) -> Result<(StatusCode, Json<TimeEntryResponse>), ApiErr> {
    let conn = db.conn();

    let running: Option<String> =
        sq_query_row(&conn, db::time_entries::running(&craftsman.craftsman_id), |row| {
            row.get(0)
        })
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            e => Err(e),
        })
        .map_err(ApiErr::from_db("check running entry"))?;
    if running.is_some() {
        return Err(ApiErr::conflict("a time entry is already running"));
    }

    if let Some(ref customer_id) = req.customer_id {
        let count: i64 = sq_query_row(
            &conn,
            db::customers::exists(&craftsman.craftsman_id, customer_id),
            |row| row.get(0),
        )
        .map_err(ApiErr::from_db("check customer"))?;
        if count == 0 {
            return Err(ApiErr::not_found("customer not found"));
        }
    }

    let id = Uuid::new_v4().to_string();
    sq_execute(
        &conn,
        db::time_entries::insert_running(&db::time_entries::InsertParams {
            id: &id,
            craftsman_id: &craftsman.craftsman_id,
            customer_id: req.customer_id.as_deref(),
            appointment_id: req.appointment_id.as_deref(),
            description: &req.description,
            started_at: &service::sqlite_now(),
        }),
    )
    .map_err(ApiErr::from_db("start time entry"))?;

    let entry = load_entry(&conn, &craftsman.craftsman_id, &id)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// ---------------------------------------------------------------------------
// Stop
// ---------------------------------------------------------------------------

/// POST /api/time-tracking/{id}/stop — close the entry and record the
/// elapsed duration.
pub async fn stop(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<TimeEntryResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_entry(&conn, &craftsman.craftsman_id, &id)?;
    if !current.running {
        return Err(ApiErr::conflict("time entry is not running"));
    }

    let ended_at = service::sqlite_now();
    let duration =
        service::duration_seconds(&current.started_at, &ended_at).map_err(ApiErr::from)?;
    sq_execute(
        &conn,
        db::time_entries::stop(&craftsman.craftsman_id, &id, &ended_at, duration),
    )
    .map_err(ApiErr::from_db("stop time entry"))?;

    let entry = load_entry(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(entry))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/time-tracking — filtered entries, newest first, plus the summed
/// duration over the same filter.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<TimeListQuery>,
) -> Result<Json<TimeListResponse>, ApiErr> {
    let from = match query.from {
        Some(ref s) => Some(service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?),
        None => None,
    };
    let to = match query.to {
        Some(ref s) => Some(service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?),
        None => None,
    };

    let built =
        db::time_entries::list(&craftsman.craftsman_id, &query, from.as_deref(), to.as_deref());
    let conn = db.conn();

    let entries = sq_query_map(&conn, built.select_query, time_entry_from_row)
        .map_err(ApiErr::from_db("list time entries"))?;
    let total: Option<i64> = sq_query_row(&conn, built.duration_query, |row| row.get(0))
        .map_err(ApiErr::from_db("sum durations"))?;

    Ok(Json(TimeListResponse {
        entries,
        total_duration_seconds: total.unwrap_or(0),
    }))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/time-tracking/{id} — correct a finished or running entry;
/// the duration is recomputed from the stored bounds.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<TimeUpdateRequest>,
) -> Result<Json<TimeEntryResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_entry(&conn, &craftsman.craftsman_id, &id)?;

    let description = req.description.unwrap_or(current.description);
    let started_at = match req.started_at {
        Some(ref s) => service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?,
        None => current.started_at,
    };
    let ended_at = match req.ended_at {
        Some(ref s) => Some(service::parse_rfc3339_to_sqlite(s).map_err(ApiErr::from)?),
        None => current.ended_at,
    };
    let customer_id = req.customer_id.or(current.customer_id);

    let duration_seconds = match ended_at {
        Some(ref ended) => {
            service::validate_time_range(&started_at, ended).map_err(ApiErr::from)?;
            service::duration_seconds(&started_at, ended).map_err(ApiErr::from)?
        }
        None => 0,
    };

    sq_execute(
        &conn,
        db::time_entries::update(
            &craftsman.craftsman_id,
            &id,
            &db::time_entries::UpdateParams {
                description: &description,
                started_at: &started_at,
                ended_at: ended_at.as_deref(),
                customer_id: customer_id.as_deref(),
                duration_seconds,
            },
        ),
    )
    .map_err(ApiErr::from_db("update time entry"))?;

    let entry = load_entry(&conn, &craftsman.craftsman_id, &id)?;
    Ok(Json(entry))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/time-tracking/{id} — finished entries only; a running entry
/// must be stopped first.
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let current = load_entry(&conn, &craftsman.craftsman_id, &id)?;
    if current.running {
        return Err(ApiErr::conflict("running time entries cannot be deleted"));
    }

    let affected = sq_execute(&conn, db::time_entries::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete time entry"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("time entry not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

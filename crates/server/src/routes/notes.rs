use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use uuid::Uuid;

use zimmr_api::{NoteListQuery, NoteListResponse, NotePayload, NoteResponse, OkResponse, db, service};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::storage::{Db, note_from_row, sq_execute, sq_query_map, sq_query_row};

fn check_customer(
    conn: &Connection,
    craftsman_id: &str,
    customer_id: Option<&str>,
) -> Result<(), ApiErr> {
    let Some(customer_id) = customer_id else {
        return Ok(());
    };
    let count: i64 = sq_query_row(conn, db::customers::exists(craftsman_id, customer_id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("check customer"))?;
    if count == 0 {
        return Err(ApiErr::not_found("customer not found"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/notes — create a note, optionally attached to a customer.
pub async fn create(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<NotePayload>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiErr> {
    let title = service::validate_title(&req.title).map_err(ApiErr::from)?;

    let conn = db.conn();
    check_customer(&conn, &craftsman.craftsman_id, req.customer_id.as_deref())?;

    let id = Uuid::new_v4().to_string();
    sq_execute(
        &conn,
        db::notes::insert(&db::notes::InsertParams {
            id: &id,
            craftsman_id: &craftsman.craftsman_id,
            title: &title,
            body: &req.body,
            customer_id: req.customer_id.as_deref(),
            tags: &req.tags,
            pinned: req.pinned,
        }),
    )
    .map_err(ApiErr::from_db("create note"))?;

    let note = sq_query_row(&conn, db::notes::get(&craftsman.craftsman_id, &id), note_from_row)
        .map_err(ApiErr::from_db("reload note"))?;
    Ok((StatusCode::CREATED, Json(note)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/notes — pinned first, then most recently updated; `search`
/// covers title, body, and tags.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<NoteListQuery>,
) -> Result<Json<NoteListResponse>, ApiErr> {
    let built = db::notes::list(&craftsman.craftsman_id, &query);
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count notes"))?;
    let notes = sq_query_map(&conn, built.select_query, note_from_row)
        .map_err(ApiErr::from_db("list notes"))?;

    Ok(Json(NoteListResponse {
        notes,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/notes/{id}
pub async fn get(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, ApiErr> {
    let conn = db.conn();
    let note = sq_query_row(&conn, db::notes::get(&craftsman.craftsman_id, &id), note_from_row)
        .map_err(|_| ApiErr::not_found("note not found"))?;
    Ok(Json(note))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/notes/{id} — full replacement of the editable fields.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<NotePayload>,
) -> Result<Json<NoteResponse>, ApiErr> {
    let title = service::validate_title(&req.title).map_err(ApiErr::from)?;

    let conn = db.conn();
    check_customer(&conn, &craftsman.craftsman_id, req.customer_id.as_deref())?;

    let affected = sq_execute(
        &conn,
        db::notes::update(
            &craftsman.craftsman_id,
            &id,
            &db::notes::UpdateParams {
                title: &title,
                body: &req.body,
                customer_id: req.customer_id.as_deref(),
                tags: &req.tags,
                pinned: req.pinned,
                updated_at: &service::sqlite_now(),
            },
        ),
    )
    .map_err(ApiErr::from_db("update note"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("note not found"));
    }

    let note = sq_query_row(&conn, db::notes::get(&craftsman.craftsman_id, &id), note_from_row)
        .map_err(ApiErr::from_db("reload note"))?;
    Ok(Json(note))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/notes/{id}
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let affected = sq_execute(&conn, db::notes::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete note"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("note not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

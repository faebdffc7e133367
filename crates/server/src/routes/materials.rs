use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use zimmr_api::{
    MaterialListQuery, MaterialListResponse, MaterialPayload, MaterialResponse, OkResponse, db,
    service,
};

use crate::error::ApiErr;
use crate::routes::auth::AuthCraftsman;
use crate::storage::{Db, material_from_row, sq_execute, sq_query_map, sq_query_row};

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/materials — add a catalog entry. Names are unique per account;
/// the exact name is the auto-invoice lookup key.
pub async fn create(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<MaterialPayload>,
) -> Result<(StatusCode, Json<MaterialResponse>), ApiErr> {
    let name = service::validate_material_name(&req.name).map_err(ApiErr::from)?;
    let unit = service::validate_unit(req.unit.as_deref()).map_err(ApiErr::from)?;
    let unit_price_cents =
        service::validate_amount(req.unit_price_cents, "unit price").map_err(ApiErr::from)?;

    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    match sq_execute(
        &conn,
        db::materials::insert(&id, &craftsman.craftsman_id, &name, &unit, unit_price_cents),
    ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(ApiErr::conflict("material name already exists"));
        }
        Err(e) => {
            tracing::error!("create material: {e}");
            return Err(ApiErr::internal("internal server error"));
        }
    }

    let material = sq_query_row(
        &conn,
        db::materials::get(&craftsman.craftsman_id, &id),
        material_from_row,
    )
    .map_err(ApiErr::from_db("reload material"))?;
    Ok((StatusCode::CREATED, Json(material)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/materials — paginated, alphabetical, optional name search.
pub async fn list(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Query(query): Query<MaterialListQuery>,
) -> Result<Json<MaterialListResponse>, ApiErr> {
    let built = db::materials::list(&craftsman.craftsman_id, &query);
    let conn = db.conn();

    let total: i64 = sq_query_row(&conn, built.count_query, |row| row.get(0))
        .map_err(ApiErr::from_db("count materials"))?;
    let materials = sq_query_map(&conn, built.select_query, material_from_row)
        .map_err(ApiErr::from_db("list materials"))?;

    Ok(Json(MaterialListResponse {
        materials,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/materials/{id}
pub async fn get(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<MaterialResponse>, ApiErr> {
    let conn = db.conn();
    let material = sq_query_row(
        &conn,
        db::materials::get(&craftsman.craftsman_id, &id),
        material_from_row,
    )
    .map_err(|_| ApiErr::not_found("material not found"))?;
    Ok(Json(material))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/materials/{id} — price changes never touch lines already
/// snapshotted onto documents.
pub async fn update(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
    Json(req): Json<MaterialPayload>,
) -> Result<Json<MaterialResponse>, ApiErr> {
    let name = service::validate_material_name(&req.name).map_err(ApiErr::from)?;
    let unit = service::validate_unit(req.unit.as_deref()).map_err(ApiErr::from)?;
    let unit_price_cents =
        service::validate_amount(req.unit_price_cents, "unit price").map_err(ApiErr::from)?;

    let conn = db.conn();
    let affected = match sq_execute(
        &conn,
        db::materials::update(
            &craftsman.craftsman_id,
            &id,
            &name,
            &unit,
            unit_price_cents,
            &service::sqlite_now(),
        ),
    ) {
        Ok(affected) => affected,
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(ApiErr::conflict("material name already exists"));
        }
        Err(e) => {
            tracing::error!("update material: {e}");
            return Err(ApiErr::internal("internal server error"));
        }
    };
    if affected == 0 {
        return Err(ApiErr::not_found("material not found"));
    }

    let material = sq_query_row(
        &conn,
        db::materials::get(&craftsman.craftsman_id, &id),
        material_from_row,
    )
    .map_err(ApiErr::from_db("reload material"))?;
    Ok(Json(material))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/materials/{id}
pub async fn delete(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let affected = sq_execute(&conn, db::materials::delete(&craftsman.craftsman_id, &id))
        .map_err(ApiErr::from_db("delete material"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("material not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

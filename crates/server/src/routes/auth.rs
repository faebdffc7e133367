use axum::{
    Json,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use zimmr_api::{
    CraftsmanProfileResponse, RegisterRequest, RegisterResponse, UpdateProfileRequest,
    VerifyResponse, db, service,
};

use crate::error::ApiErr;
use crate::storage::{Db, craftsman_from_row, sq_execute, sq_query_row};

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated craftsman extracted from the `Authorization: Bearer <api_key>` header.
pub struct AuthCraftsman {
    pub craftsman_id: String,
    pub company_name: String,
    pub vat_exempt: bool,
}

impl AuthCraftsman {
    /// Default tax treatment for new documents, from the profile flag.
    pub fn default_tax_treatment(&self) -> zimmr_api::TaxTreatment {
        if self.vat_exempt {
            zimmr_api::TaxTreatment::SmallBusiness
        } else {
            zimmr_api::TaxTreatment::Standard
        }
    }
}

impl<S> FromRequestParts<S> for AuthCraftsman
where
    S: Send + Sync,
    Db: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = Db::from_ref(state);

        let api_key = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "missing or invalid Authorization header"})),
                )
                    .into_response()
            })?
            .to_string();

        let conn = db.conn();
        let result = sq_query_row(&conn, db::craftsmen::by_api_key(&api_key), |row| {
            Ok(AuthCraftsman {
                craftsman_id: row.get(0)?,
                company_name: row.get(1)?,
                vat_exempt: row.get(2)?,
            })
        });

        match result {
            Ok(craftsman) => Ok(craftsman),
            Err(_) => Err((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "invalid API key"})),
            )
                .into_response()),
        }
    }
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// POST /api/register — create a craftsman account and issue an API key.
pub async fn register(
    State(db): State<Db>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiErr> {
    let company_name = service::validate_company_name(&req.company_name).map_err(ApiErr::from)?;

    let registration = std::env::var("ZIMMR_REGISTRATION").unwrap_or_default();
    if registration == "closed" {
        return Err(ApiErr::forbidden("registration is currently closed"));
    }

    let craftsman_id = Uuid::new_v4().to_string();
    let api_key = service::generate_api_key();

    let conn = db.conn();
    match sq_execute(
        &conn,
        db::craftsmen::insert(&craftsman_id, &company_name, &api_key),
    ) {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                craftsman_id,
                company_name,
                api_key,
            }),
        )),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ApiErr::conflict("company name already taken"))
        }
        Err(e) => {
            tracing::error!("register: {e}");
            Err(ApiErr::internal("internal server error"))
        }
    }
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// POST /api/auth/verify — check an API key and echo the account.
pub async fn verify(craftsman: AuthCraftsman) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        craftsman_id: craftsman.craftsman_id,
        company_name: craftsman.company_name,
    })
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/auth/me — full profile of the authenticated craftsman.
pub async fn me(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
) -> Result<Json<CraftsmanProfileResponse>, ApiErr> {
    let conn = db.conn();
    let profile = sq_query_row(
        &conn,
        db::craftsmen::get(&craftsman.craftsman_id),
        craftsman_from_row,
    )
    .map_err(ApiErr::from_db("get profile"))?;
    Ok(Json(profile))
}

/// PUT /api/auth/me — partial profile update; omitted fields keep their value.
pub async fn update_me(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<CraftsmanProfileResponse>, ApiErr> {
    let conn = db.conn();
    let current = sq_query_row(
        &conn,
        db::craftsmen::get(&craftsman.craftsman_id),
        craftsman_from_row,
    )
    .map_err(ApiErr::from_db("get profile"))?;

    let company_name = match req.company_name {
        Some(ref name) => service::validate_company_name(name).map_err(ApiErr::from)?,
        None => current.company_name,
    };
    let contact_name = req.contact_name.or(current.contact_name);
    let email = req.email.or(current.email);
    let phone = req.phone.or(current.phone);
    let address = req.address.or(current.address);
    let vat_exempt = req.vat_exempt.unwrap_or(current.vat_exempt);

    let result = sq_execute(
        &conn,
        db::craftsmen::update_profile(
            &craftsman.craftsman_id,
            &db::craftsmen::ProfileParams {
                company_name: &company_name,
                contact_name: contact_name.as_deref(),
                email: email.as_deref(),
                phone: phone.as_deref(),
                address: address.as_deref(),
                vat_exempt,
            },
        ),
    );
    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(ApiErr::conflict("company name already taken"));
        }
        Err(e) => {
            tracing::error!("update profile: {e}");
            return Err(ApiErr::internal("internal server error"));
        }
    }

    let profile = sq_query_row(
        &conn,
        db::craftsmen::get(&craftsman.craftsman_id),
        craftsman_from_row,
    )
    .map_err(ApiErr::from_db("reload profile"))?;
    Ok(Json(profile))
}

// ---------------------------------------------------------------------------
// Key rotation
// ---------------------------------------------------------------------------

/// POST /api/auth/regenerate-key — rotate the API key; the old key stops
/// working immediately.
pub async fn regenerate_key(
    State(db): State<Db>,
    craftsman: AuthCraftsman,
) -> Result<Json<serde_json::Value>, ApiErr> {
    let api_key = service::generate_api_key();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::craftsmen::update_api_key(&craftsman.craftsman_id, &api_key),
    )
    .map_err(ApiErr::from_db("rotate api key"))?;
    Ok(Json(serde_json::json!({ "api_key": api_key })))
}

//! Shared business logic — framework-agnostic pure functions.
//!
//! Route handlers validate through these helpers so that every entry point
//! applies the same rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::ServiceError;

/// SQLite datetime format used for all stored timestamps (UTC).
pub const SQLITE_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Stored date format.
pub const DATE_FMT: &str = "%Y-%m-%d";

// ─── Validation ─────────────────────────────────────────────────────────────

/// Validate and normalize a company name. Returns the trimmed name.
pub fn validate_company_name(name: &str) -> Result<String, ServiceError> {
    validate_name(name, 120, "company name")
}

/// Validate and normalize a customer name.
pub fn validate_customer_name(name: &str) -> Result<String, ServiceError> {
    validate_name(name, 120, "customer name")
}

/// Validate and normalize an appointment or note title.
pub fn validate_title(title: &str) -> Result<String, ServiceError> {
    validate_name(title, 200, "title")
}

/// Validate and normalize a material name (exact-match catalog key).
pub fn validate_material_name(name: &str) -> Result<String, ServiceError> {
    validate_name(name, 120, "material name")
}

fn validate_name(value: &str, max: usize, what: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(ServiceError::BadRequest(format!(
            "{what} must be 1-{max} characters"
        )));
    }
    Ok(trimmed)
}

/// Validate and normalize a unit string; empty means the default unit.
pub fn validate_unit(unit: Option<&str>) -> Result<String, ServiceError> {
    let unit = unit.map(str::trim).filter(|u| !u.is_empty());
    match unit {
        None => Ok(zimmr_core::autoinvoice::DEFAULT_UNIT.to_string()),
        Some(u) if u.chars().count() <= 16 => Ok(u.to_string()),
        Some(_) => Err(ServiceError::BadRequest(
            "unit must be at most 16 characters".into(),
        )),
    }
}

/// Reject negative money amounts.
pub fn validate_amount(cents: i64, what: &str) -> Result<i64, ServiceError> {
    if cents < 0 {
        return Err(ServiceError::BadRequest(format!("{what} must not be negative")));
    }
    Ok(cents)
}

/// Reject non-positive line quantities.
pub fn validate_quantity(quantity_thousandths: i64) -> Result<i64, ServiceError> {
    if quantity_thousandths <= 0 {
        return Err(ServiceError::BadRequest(
            "line quantity must be positive".into(),
        ));
    }
    Ok(quantity_thousandths)
}

// ─── API key generation ─────────────────────────────────────────────────────

/// Generate a new API key with the `zmr_` prefix.
pub fn generate_api_key() -> String {
    format!("zmr_{}", uuid::Uuid::new_v4().simple())
}

// ─── Date / datetime handling ───────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FMT)
        .map_err(|_| ServiceError::BadRequest(format!("invalid date: {input}")))
}

/// Parse an RFC 3339 datetime and normalize it to a stored UTC string.
pub fn parse_rfc3339_to_sqlite(input: &str) -> Result<String, ServiceError> {
    let dt = DateTime::parse_from_rfc3339(input.trim())
        .map_err(|_| ServiceError::BadRequest(format!("invalid RFC 3339 datetime: {input}")))?;
    Ok(dt.with_timezone(&Utc).format(SQLITE_DATETIME_FMT).to_string())
}

/// Parse a stored `YYYY-MM-DD HH:MM:SS` string.
pub fn parse_sqlite_datetime(input: &str) -> Result<NaiveDateTime, ServiceError> {
    NaiveDateTime::parse_from_str(input, SQLITE_DATETIME_FMT)
        .map_err(|_| ServiceError::Internal(format!("invalid stored datetime: {input}")))
}

/// Current time as a stored datetime string.
pub fn sqlite_now() -> String {
    Utc::now().format(SQLITE_DATETIME_FMT).to_string()
}

/// Today's date in the stored format.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Seconds elapsed between two stored datetime strings, clamped at zero.
pub fn duration_seconds(started_at: &str, ended_at: &str) -> Result<i64, ServiceError> {
    let start = parse_sqlite_datetime(started_at)?;
    let end = parse_sqlite_datetime(ended_at)?;
    Ok((end - start).num_seconds().max(0))
}

/// Require `ends_at` strictly after `starts_at` (both stored strings;
/// lexicographic order equals chronological order for this format).
pub fn validate_time_range(starts_at: &str, ends_at: &str) -> Result<(), ServiceError> {
    if ends_at <= starts_at {
        return Err(ServiceError::BadRequest(
            "ends_at must be after starts_at".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_company_name("  Meier GmbH  ").unwrap(), "Meier GmbH");
        assert!(validate_company_name("").is_err());
        assert!(validate_company_name("   ").is_err());
        assert!(validate_company_name(&"x".repeat(121)).is_err());
        assert!(validate_company_name(&"x".repeat(120)).is_ok());
    }

    #[test]
    fn unit_defaults_to_pcs() {
        assert_eq!(validate_unit(None).unwrap(), "pcs");
        assert_eq!(validate_unit(Some("  ")).unwrap(), "pcs");
        assert_eq!(validate_unit(Some("m")).unwrap(), "m");
        assert!(validate_unit(Some("very-long-unit-name")).is_err());
    }

    #[test]
    fn api_keys_carry_prefix() {
        let key = generate_api_key();
        assert!(key.starts_with("zmr_"));
        assert_eq!(key.len(), 4 + 32);
    }

    #[test]
    fn rfc3339_is_normalized_to_utc() {
        assert_eq!(
            parse_rfc3339_to_sqlite("2026-03-01T10:30:00+02:00").unwrap(),
            "2026-03-01 08:30:00"
        );
        assert!(parse_rfc3339_to_sqlite("tomorrow").is_err());
    }

    #[test]
    fn duration_between_stored_datetimes() {
        assert_eq!(
            duration_seconds("2026-03-01 08:00:00", "2026-03-01 09:30:00").unwrap(),
            5400
        );
        // Clock skew never yields negative durations.
        assert_eq!(
            duration_seconds("2026-03-01 09:00:00", "2026-03-01 08:00:00").unwrap(),
            0
        );
    }

    #[test]
    fn time_range_must_be_ordered() {
        assert!(validate_time_range("2026-03-01 08:00:00", "2026-03-01 09:00:00").is_ok());
        assert!(validate_time_range("2026-03-01 09:00:00", "2026-03-01 09:00:00").is_err());
    }
}

//! Shared API types and SQL builders for ZIMMR.
//!
//! This crate is the single source of truth for all API request/response
//! types. The server imports them directly; route handlers stay thin
//! adapters around the builders in [`db`] and the validation in [`service`].

use serde::{Deserialize, Serialize};

pub mod db;
pub mod service;

pub use zimmr_core::billing::{MaterialLine, TaxTreatment};

// ─── Shared enums ────────────────────────────────────────────────────────────

/// Lifecycle of an appointment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an invoice: `draft → open → paid`, cancellable until paid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Open,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "open" => Some(Self::Open),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition(self, to: InvoiceStatus) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Open)
                | (Self::Open, Self::Paid)
                | (Self::Draft, Self::Cancelled)
                | (Self::Open, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a quote: `draft → sent → accepted | rejected`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn can_transition(self, to: QuoteStatus) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Sent) | (Self::Sent, Self::Accepted) | (Self::Sent, Self::Rejected)
        )
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Auth / craftsmen ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub craftsman_id: String,
    pub company_name: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub craftsman_id: String,
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct CraftsmanProfileResponse {
    pub craftsman_id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub vat_exempt: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub vat_exempt: Option<bool>,
}

// ─── Customers ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct CustomerPayload {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// ─── Appointments ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AppointmentCreateRequest {
    pub customer_id: String,
    pub title: String,
    /// RFC 3339.
    pub starts_at: String,
    /// RFC 3339, must be after `starts_at`.
    pub ends_at: String,
    pub location: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppointmentUpdateRequest {
    pub title: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub title: String,
    pub starts_at: String,
    pub ends_at: String,
    pub location: Option<String>,
    pub notes: String,
    pub status: AppointmentStatus,
    pub price_cents: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<AppointmentStatus>,
    pub customer_id: Option<String>,
    /// RFC 3339 lower bound on `starts_at`.
    pub from: Option<String>,
    /// RFC 3339 upper bound on `starts_at`.
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<AppointmentResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteAppointmentRequest {
    /// Also derive a draft invoice from the appointment.
    #[serde(default)]
    pub create_invoice: bool,
}

#[derive(Debug, Serialize)]
pub struct CompleteAppointmentResponse {
    pub appointment: AppointmentResponse,
    pub invoice: Option<InvoiceResponse>,
}

// ─── Materials ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MaterialPayload {
    pub name: String,
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub unit_price_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct MaterialListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MaterialListResponse {
    pub materials: Vec<MaterialResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// ─── Invoices & quotes ───────────────────────────────────────────────────────

/// A material line as sent by clients. Totals are never accepted from
/// clients; the server recomputes them from these lines.
#[derive(Debug, Clone, Deserialize)]
pub struct LinePayload {
    pub name: String,
    pub quantity_thousandths: i64,
    pub unit: Option<String>,
    pub unit_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct LineResponse {
    pub name: String,
    pub quantity_thousandths: i64,
    pub unit: String,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceCreateRequest {
    pub customer_id: String,
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub service_amount_cents: i64,
    pub tax_treatment: Option<TaxTreatment>,
    /// `YYYY-MM-DD`; defaults to today.
    pub issue_date: Option<String>,
    /// `YYYY-MM-DD`; defaults to issue date + 14 days.
    pub due_date: Option<String>,
    #[serde(default)]
    pub lines: Vec<LinePayload>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InvoiceUpdateRequest {
    pub service_amount_cents: Option<i64>,
    pub tax_treatment: Option<TaxTreatment>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub lines: Option<Vec<LinePayload>>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: String,
    pub appointment_id: Option<String>,
    pub service_amount_cents: i64,
    pub materials_total_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tax_treatment: TaxTreatment,
    pub status: InvoiceStatus,
    pub issue_date: String,
    pub due_date: String,
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub lines: Vec<LineResponse>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct QuoteCreateRequest {
    pub customer_id: String,
    #[serde(default)]
    pub service_amount_cents: i64,
    pub tax_treatment: Option<TaxTreatment>,
    pub issue_date: Option<String>,
    /// `YYYY-MM-DD`; defaults to issue date + 14 days.
    pub valid_until: Option<String>,
    #[serde(default)]
    pub lines: Vec<LinePayload>,
}

#[derive(Debug, Deserialize, Default)]
pub struct QuoteUpdateRequest {
    pub service_amount_cents: Option<i64>,
    pub tax_treatment: Option<TaxTreatment>,
    pub issue_date: Option<String>,
    pub valid_until: Option<String>,
    pub lines: Option<Vec<LinePayload>>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: String,
    pub quote_number: String,
    pub customer_id: String,
    pub service_amount_cents: i64,
    pub materials_total_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tax_treatment: TaxTreatment,
    pub status: QuoteStatus,
    pub issue_date: String,
    pub valid_until: String,
    /// Set once the quote has been converted to an invoice.
    pub invoice_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub lines: Vec<LineResponse>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<QuoteStatus>,
    pub customer_id: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct QuoteListResponse {
    pub quotes: Vec<QuoteResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuoteStatusRequest {
    pub status: QuoteStatus,
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct NotePayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub customer_id: Option<String>,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub customer_id: Option<String>,
    pub tags: String,
    pub pinned: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub search: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteListResponse {
    pub notes: Vec<NoteResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// ─── Time tracking ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct TimeStartRequest {
    #[serde(default)]
    pub description: String,
    pub customer_id: Option<String>,
    pub appointment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimeEntryResponse {
    pub id: String,
    pub description: String,
    pub customer_id: Option<String>,
    pub appointment_id: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_seconds: i64,
    pub running: bool,
}

#[derive(Debug, Deserialize)]
pub struct TimeListQuery {
    /// RFC 3339 lower bound on `started_at`.
    pub from: Option<String>,
    /// RFC 3339 upper bound on `started_at`.
    pub to: Option<String>,
    pub customer_id: Option<String>,
    /// Only running (or only finished) entries.
    pub running: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TimeListResponse {
    pub entries: Vec<TimeEntryResponse>,
    pub total_duration_seconds: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct TimeUpdateRequest {
    pub description: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub customer_id: Option<String>,
}

// ─── Finances ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExpensePayload {
    pub description: String,
    pub amount_cents: i64,
    pub category: Option<String>,
    /// `YYYY-MM-DD`.
    pub spent_on: String,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: String,
    pub description: String,
    pub amount_cents: i64,
    pub category: String,
    pub spent_on: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub year: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<ExpenseResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub year: i32,
    pub target_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct FinanceSummaryResponse {
    pub year: i32,
    /// Sum of invoice totals paid in the year.
    pub revenue_cents: i64,
    pub expenses_cents: i64,
    pub profit_cents: i64,
    pub goal_cents: Option<i64>,
    /// `revenue / goal`, in whole percent.
    pub goal_progress_percent: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FinanceSummaryQuery {
    pub year: Option<i32>,
}

// ─── Misc ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

// ─── Service errors ──────────────────────────────────────────────────────────

/// Framework-agnostic error for validation and business rules. The server
/// maps it onto its HTTP error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_transitions() {
        assert!(InvoiceStatus::Draft.can_transition(InvoiceStatus::Open));
        assert!(InvoiceStatus::Open.can_transition(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Draft.can_transition(InvoiceStatus::Cancelled));
        assert!(InvoiceStatus::Open.can_transition(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Draft.can_transition(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Cancelled.can_transition(InvoiceStatus::Open));
    }

    #[test]
    fn quote_transitions() {
        assert!(QuoteStatus::Draft.can_transition(QuoteStatus::Sent));
        assert!(QuoteStatus::Sent.can_transition(QuoteStatus::Accepted));
        assert!(QuoteStatus::Sent.can_transition(QuoteStatus::Rejected));
        assert!(!QuoteStatus::Draft.can_transition(QuoteStatus::Accepted));
        assert!(!QuoteStatus::Accepted.can_transition(QuoteStatus::Rejected));
    }

    #[test]
    fn status_strings_round_trip() {
        for s in ["draft", "open", "paid", "cancelled"] {
            assert_eq!(InvoiceStatus::parse(s).unwrap().as_str(), s);
        }
        for s in ["scheduled", "completed", "cancelled"] {
            assert_eq!(AppointmentStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(InvoiceStatus::parse("overdue").is_none());
    }
}

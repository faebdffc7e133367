//! VAT and document-total arithmetic for invoices and quotes.
//!
//! `total = service_amount + materials_total + tax`, where tax is 19% of the
//! subtotal unless the document is exempt (small-business §19 UStG or
//! reverse charge).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::{self, Cents, Quantity};

/// German standard VAT rate.
pub const VAT_RATE_PERCENT: i64 = 19;

/// Default payment term used when a due date is not given.
pub const PAYMENT_TERM_DAYS: i64 = 14;

pub const INVOICE_NUMBER_PREFIX: &str = "INV";
pub const QUOTE_NUMBER_PREFIX: &str = "QUO";

/// How VAT applies to a document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatment {
    /// 19% VAT on the subtotal.
    #[default]
    Standard,
    /// §19 UStG small-business exemption — no VAT charged.
    SmallBusiness,
    /// Reverse charge — the recipient owes the VAT.
    ReverseCharge,
}

impl TaxTreatment {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "standard",
            Self::SmallBusiness => "small_business",
            Self::ReverseCharge => "reverse_charge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "small_business" => Some(Self::SmallBusiness),
            "reverse_charge" => Some(Self::ReverseCharge),
            _ => None,
        }
    }

    /// Whether the document carries any VAT at all.
    pub fn is_exempt(&self) -> bool {
        !matches!(self, Self::Standard)
    }
}

impl std::fmt::Display for TaxTreatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One material line on a document. Quantities are thousandths, prices are
/// cents — a snapshot taken at document creation, independent of later
/// catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialLine {
    pub name: String,
    pub quantity_thousandths: Quantity,
    pub unit: String,
    pub unit_price_cents: Cents,
}

impl MaterialLine {
    pub fn total_cents(&self) -> Cents {
        money::line_total(self.quantity_thousandths, self.unit_price_cents)
    }
}

/// Computed totals for an invoice or quote.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DocumentTotals {
    pub materials_total_cents: Cents,
    pub subtotal_cents: Cents,
    pub tax_cents: Cents,
    pub total_cents: Cents,
}

/// Compute document totals from the service amount and material lines.
pub fn compute_totals(
    service_amount_cents: Cents,
    lines: &[MaterialLine],
    treatment: TaxTreatment,
) -> DocumentTotals {
    let materials_total_cents: Cents = lines.iter().map(MaterialLine::total_cents).sum();
    let subtotal_cents = service_amount_cents + materials_total_cents;
    let tax_cents = if treatment.is_exempt() {
        0
    } else {
        money::percentage(subtotal_cents, VAT_RATE_PERCENT)
    };
    DocumentTotals {
        materials_total_cents,
        subtotal_cents,
        tax_cents,
        total_cents: subtotal_cents + tax_cents,
    }
}

/// Format a document number, e.g. `("INV", 2026, 7)` → `"INV-2026-0007"`.
pub fn format_document_number(prefix: &str, year: i32, seq: i64) -> String {
    format!("{prefix}-{year}-{seq:04}")
}

/// Due date defaulting: issue date plus the standard payment term.
pub fn default_due_date(issue_date: NaiveDate) -> NaiveDate {
    issue_date + chrono::Duration::days(PAYMENT_TERM_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: Quantity, price: Cents) -> MaterialLine {
        MaterialLine {
            name: "Kabel".into(),
            quantity_thousandths: qty,
            unit: "m".into(),
            unit_price_cents: price,
        }
    }

    #[test]
    fn standard_treatment_adds_19_percent() {
        // 100.00 service + 2 x 12.50 materials = 125.00, tax 23.75, total 148.75
        let t = compute_totals(10000, &[line(2000, 1250)], TaxTreatment::Standard);
        assert_eq!(t.materials_total_cents, 2500);
        assert_eq!(t.subtotal_cents, 12500);
        assert_eq!(t.tax_cents, 2375);
        assert_eq!(t.total_cents, 14875);
    }

    #[test]
    fn exempt_treatments_charge_no_tax() {
        for treatment in [TaxTreatment::SmallBusiness, TaxTreatment::ReverseCharge] {
            let t = compute_totals(10000, &[line(2000, 1250)], treatment);
            assert_eq!(t.tax_cents, 0);
            assert_eq!(t.total_cents, t.subtotal_cents);
        }
    }

    #[test]
    fn totals_without_materials() {
        let t = compute_totals(5000, &[], TaxTreatment::Standard);
        assert_eq!(t.materials_total_cents, 0);
        assert_eq!(t.subtotal_cents, 5000);
        assert_eq!(t.tax_cents, 950);
        assert_eq!(t.total_cents, 5950);
    }

    #[test]
    fn tax_rounding_is_half_up() {
        // subtotal 0.50 € → tax 0.095 € → 0.10 €
        let t = compute_totals(50, &[], TaxTreatment::Standard);
        assert_eq!(t.tax_cents, 10);
    }

    #[test]
    fn document_numbers_are_zero_padded() {
        assert_eq!(format_document_number("INV", 2026, 7), "INV-2026-0007");
        assert_eq!(format_document_number("QUO", 2026, 12345), "QUO-2026-12345");
    }

    #[test]
    fn due_date_defaults_to_14_days() {
        let issue = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        assert_eq!(
            default_due_date(issue),
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()
        );
    }

    #[test]
    fn tax_treatment_round_trips() {
        for t in [
            TaxTreatment::Standard,
            TaxTreatment::SmallBusiness,
            TaxTreatment::ReverseCharge,
        ] {
            assert_eq!(TaxTreatment::parse(t.as_str()), Some(t));
        }
        assert_eq!(TaxTreatment::parse("vat_free"), None);
    }
}

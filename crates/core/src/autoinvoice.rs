//! Draft-invoice derivation from a completed appointment.
//!
//! The service amount comes from the appointment's agreed price, material
//! lines from the notes parser. Catalog references without an explicit
//! price are resolved via the caller-supplied lookup; references the
//! catalog does not know are dropped rather than invoiced at a guessed
//! price.

use crate::billing::{DocumentTotals, MaterialLine, TaxTreatment, compute_totals};
use crate::money::Cents;
use crate::notes;

/// Default unit for material lines that carry no catalog unit.
pub const DEFAULT_UNIT: &str = "pcs";

/// Catalog entry used to price a notes reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPrice {
    pub unit: String,
    pub unit_price_cents: Cents,
}

/// Inputs for a derived draft invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftInvoice {
    pub service_amount_cents: Cents,
    pub tax_treatment: TaxTreatment,
    pub lines: Vec<MaterialLine>,
}

impl DraftInvoice {
    pub fn totals(&self) -> DocumentTotals {
        compute_totals(self.service_amount_cents, &self.lines, self.tax_treatment)
    }
}

/// Derive a draft invoice from a completed appointment.
///
/// `resolve_catalog` maps an exact material name to its catalog price; it is
/// consulted for every parsed line (explicitly priced lines only borrow the
/// catalog unit).
pub fn draft_from_appointment(
    price_cents: Option<Cents>,
    notes_text: &str,
    tax_treatment: TaxTreatment,
    resolve_catalog: impl Fn(&str) -> Option<CatalogPrice>,
) -> DraftInvoice {
    let lines = notes::parse_materials(notes_text)
        .into_iter()
        .filter_map(|parsed| {
            let catalog = resolve_catalog(&parsed.name);
            let unit_price_cents = parsed
                .unit_price_cents
                .or_else(|| catalog.as_ref().map(|c| c.unit_price_cents))?;
            let unit = catalog
                .map(|c| c.unit)
                .unwrap_or_else(|| DEFAULT_UNIT.to_string());
            Some(MaterialLine {
                name: parsed.name,
                quantity_thousandths: parsed.quantity_thousandths,
                unit,
                unit_price_cents,
            })
        })
        .collect();

    DraftInvoice {
        service_amount_cents: price_cents.unwrap_or(0),
        tax_treatment,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(name: &str) -> Option<CatalogPrice> {
        match name {
            "Silikon" => Some(CatalogPrice {
                unit: "tube".into(),
                unit_price_cents: 799,
            }),
            "Kabel 10m" => Some(CatalogPrice {
                unit: "m".into(),
                unit_price_cents: 999,
            }),
            _ => None,
        }
    }

    #[test]
    fn derives_service_amount_and_lines() {
        let draft = draft_from_appointment(
            Some(15000),
            "2x Kabel 10m @ 12,50\n2x Silikon",
            TaxTreatment::Standard,
            catalog,
        );
        assert_eq!(draft.service_amount_cents, 15000);
        assert_eq!(draft.lines.len(), 2);
        // Explicit price wins over the catalog, unit comes from the catalog.
        assert_eq!(draft.lines[0].unit_price_cents, 1250);
        assert_eq!(draft.lines[0].unit, "m");
        // Catalog reference priced at the catalog rate.
        assert_eq!(draft.lines[1].unit_price_cents, 799);
        assert_eq!(draft.lines[1].unit, "tube");

        let totals = draft.totals();
        assert_eq!(totals.materials_total_cents, 2500 + 1598);
        assert_eq!(totals.subtotal_cents, 15000 + 4098);
        assert_eq!(totals.tax_cents, 3629); // 19% of 190.98 → 36.2862 → 36.29
        assert_eq!(totals.total_cents, 19098 + 3629);
    }

    #[test]
    fn unknown_catalog_references_are_dropped() {
        let draft =
            draft_from_appointment(None, "3x Unbekannt", TaxTreatment::Standard, |_| None);
        assert_eq!(draft.service_amount_cents, 0);
        assert!(draft.lines.is_empty());
    }

    #[test]
    fn explicit_price_without_catalog_uses_default_unit() {
        let draft =
            draft_from_appointment(None, "1x Sonderteil @ 5,00", TaxTreatment::Standard, |_| {
                None
            });
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].unit, DEFAULT_UNIT);
        assert_eq!(draft.lines[0].unit_price_cents, 500);
    }

    #[test]
    fn craftsman_exemption_flows_into_totals() {
        let draft = draft_from_appointment(
            Some(10000),
            "",
            TaxTreatment::SmallBusiness,
            |_| None,
        );
        assert_eq!(draft.totals().tax_cents, 0);
        assert_eq!(draft.totals().total_cents, 10000);
    }
}

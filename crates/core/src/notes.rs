//! Material extraction from free-text appointment notes.
//!
//! Craftsmen jot used materials into the notes field, one per line:
//!
//! ```text
//! 2x Kabel 10m @ 12,50
//! 3 x Dübel @ 0.45 EUR
//! 1,5x Rohr @ 3,20€
//! 2x Silikon
//! ```
//!
//! Lines without an explicit price are catalog references; the caller
//! resolves them against the materials catalog.

use std::sync::OnceLock;

use regex::Regex;

use crate::money::{self, Cents, Quantity};

/// One material reference parsed out of the notes text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMaterial {
    pub name: String,
    pub quantity_thousandths: Quantity,
    /// Explicit unit price, if the line carried one.
    pub unit_price_cents: Option<Cents>,
}

/// `<qty> x <name> @ <price> [€|EUR]`
fn priced_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(\d+(?:[.,]\d{1,3})?)\s*[x×]\s+(.+?)\s*@\s*(\d+(?:[.,]\d{1,2})?)\s*(?:€|eur)?\s*$",
        )
        .expect("priced materials regex")
    })
}

/// `<qty> x <name>` — a catalog reference. The name must not contain `@`,
/// so a malformed price never gets swallowed into the name.
fn unpriced_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+(?:[.,]\d{1,3})?)\s*[x×]\s+([^@]+?)\s*$")
            .expect("unpriced materials regex")
    })
}

/// Parse every matching line of `notes` into material references.
/// Non-matching lines are ignored; the notes field is free text.
pub fn parse_materials(notes: &str) -> Vec<ParsedMaterial> {
    notes.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<ParsedMaterial> {
    let (qty, name, price) = if let Some(caps) = priced_re().captures(line) {
        let price = money::parse_amount(&caps[3])?;
        (caps[1].to_string(), caps[2].to_string(), Some(price))
    } else if let Some(caps) = unpriced_re().captures(line) {
        (caps[1].to_string(), caps[2].to_string(), None)
    } else {
        return None;
    };

    let quantity_thousandths = money::parse_quantity(&qty)?;
    if quantity_thousandths == 0 {
        return None;
    }
    let name = name.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(ParsedMaterial {
        name,
        quantity_thousandths,
        unit_price_cents: price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_priced_lines() {
        let parsed = parse_materials("2x Kabel 10m @ 12,50\n3 x Dübel @ 0.45 EUR");
        assert_eq!(
            parsed,
            vec![
                ParsedMaterial {
                    name: "Kabel 10m".into(),
                    quantity_thousandths: 2000,
                    unit_price_cents: Some(1250),
                },
                ParsedMaterial {
                    name: "Dübel".into(),
                    quantity_thousandths: 3000,
                    unit_price_cents: Some(45),
                },
            ]
        );
    }

    #[test]
    fn parses_fractional_quantities_and_euro_sign() {
        let parsed = parse_materials("1,5x Rohr @ 3,20€");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].quantity_thousandths, 1500);
        assert_eq!(parsed[0].unit_price_cents, Some(320));
    }

    #[test]
    fn catalog_references_have_no_price() {
        let parsed = parse_materials("2x Silikon");
        assert_eq!(
            parsed,
            vec![ParsedMaterial {
                name: "Silikon".into(),
                quantity_thousandths: 2000,
                unit_price_cents: None,
            }]
        );
    }

    #[test]
    fn ignores_prose_and_zero_quantities() {
        let notes = "Kunde war zufrieden.\n0x Nichts @ 1,00\nMorgen wiederkommen";
        assert!(parse_materials(notes).is_empty());
    }

    #[test]
    fn ignores_lines_with_malformed_price() {
        assert!(parse_materials("2x Kabel @ 12,505").is_empty());
        assert!(parse_materials("2x Kabel @ teuer").is_empty());
    }
}

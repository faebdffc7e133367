//! Integer-cent money arithmetic.
//!
//! Amounts are `i64` cents, quantities are `i64` thousandths (so `1.5 x`
//! is exact). Division rounds half-up, matching how the documents were
//! priced before the rewrite.

/// An amount in euro cents.
pub type Cents = i64;

/// A quantity in thousandths (1500 == 1.5).
pub type Quantity = i64;

/// Total for one material line: `quantity × unit_price`, rounded half-up.
pub fn line_total(quantity_thousandths: Quantity, unit_price_cents: Cents) -> Cents {
    div_round_half_up(quantity_thousandths * unit_price_cents, 1000)
}

/// `percent`% of `amount_cents`, rounded half-up.
pub fn percentage(amount_cents: Cents, percent: i64) -> Cents {
    div_round_half_up(amount_cents * percent, 100)
}

fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    // Amounts and quantities are non-negative; denominators are positive
    // constants (100, 1000).
    (numerator + denominator / 2) / denominator
}

/// Parse a decimal amount (`"12,50"`, `"12.50"`, `"12"`, optionally with a
/// trailing `€` or `EUR`) into cents.
pub fn parse_amount(input: &str) -> Option<Cents> {
    parse_scaled(strip_currency(input), 2)
}

/// Parse a decimal quantity (up to three decimals) into thousandths.
pub fn parse_quantity(input: &str) -> Option<Quantity> {
    parse_scaled(input.trim(), 3)
}

fn strip_currency(input: &str) -> &str {
    let s = input.trim();
    let s = s.strip_suffix('€').unwrap_or(s);
    let s = s
        .strip_suffix("EUR")
        .or_else(|| s.strip_suffix("eur"))
        .unwrap_or(s);
    s.trim()
}

/// Parse `intpart[.,fracpart]` into an integer scaled by 10^`scale`.
fn parse_scaled(s: &str, scale: u32) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let (int_part, frac_part) = match s.split_once(['.', ',']) {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > scale as usize {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let int_val: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut frac_val: i64 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().ok()?
    };
    for _ in frac_part.len()..scale as usize {
        frac_val *= 10;
    }
    int_val
        .checked_mul(10_i64.pow(scale))
        .and_then(|v| v.checked_add(frac_val))
}

/// Format cents as a German-style euro string, e.g. `1250` → `"12,50 €"`.
pub fn format_eur(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{},{:02} €", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_rounds_half_up() {
        // 1.5 x 0.45 € = 0.675 € → 0.68 €
        assert_eq!(line_total(1500, 45), 68);
        // 2 x 12.50 €
        assert_eq!(line_total(2000, 1250), 2500);
        // 0.333 x 1.00 € = 0.333 € → 0.33 €
        assert_eq!(line_total(333, 100), 33);
    }

    #[test]
    fn percentage_rounds_half_up() {
        // 19% of 0.50 € = 0.095 € → 0.10 €
        assert_eq!(percentage(50, 19), 10);
        assert_eq!(percentage(10000, 19), 1900);
        assert_eq!(percentage(0, 19), 0);
    }

    #[test]
    fn parse_amount_accepts_comma_and_dot() {
        assert_eq!(parse_amount("12,50"), Some(1250));
        assert_eq!(parse_amount("12.50"), Some(1250));
        assert_eq!(parse_amount("12"), Some(1200));
        assert_eq!(parse_amount("12,5"), Some(1250));
        assert_eq!(parse_amount("0,45 EUR"), Some(45));
        assert_eq!(parse_amount("3,20€"), Some(320));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12,505"), None);
        assert_eq!(parse_amount("12,5a"), None);
        assert_eq!(parse_amount("-3"), None);
    }

    #[test]
    fn parse_quantity_scales_to_thousandths() {
        assert_eq!(parse_quantity("2"), Some(2000));
        assert_eq!(parse_quantity("1,5"), Some(1500));
        assert_eq!(parse_quantity("0.25"), Some(250));
        assert_eq!(parse_quantity("1,234"), Some(1234));
        assert_eq!(parse_quantity("1,2345"), None);
    }

    #[test]
    fn format_eur_uses_comma() {
        assert_eq!(format_eur(1250), "12,50 €");
        assert_eq!(format_eur(5), "0,05 €");
        assert_eq!(format_eur(-300), "-3,00 €");
    }
}

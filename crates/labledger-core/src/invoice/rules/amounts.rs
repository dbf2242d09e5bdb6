//! Amount scanning and formatting for US-style currency.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::ExtractionMatch;
use super::patterns::MONEY_TOKEN;

/// Scan a line for money-looking tokens in reading order.
///
/// A token wrapped in parentheses, e.g. `($ 110.00)`, is a rebate and comes
/// back negated. The match position covers the parentheses and `$` sign.
pub fn scan_amounts(line: &str) -> Vec<ExtractionMatch<Decimal>> {
    let mut results = Vec::new();

    for caps in MONEY_TOKEN.captures_iter(line) {
        let Some(full_match) = caps.get(0) else {
            continue;
        };
        let digits = caps["number"].replace(',', "");
        let Ok(magnitude) = Decimal::from_str(&digits) else {
            continue;
        };

        let negative = caps.name("open").is_some() && caps.name("close").is_some();
        let value = if negative { -magnitude } else { magnitude };

        results.push(
            ExtractionMatch::new(value, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        );
    }

    results
}

/// Parse a currency cell such as `$1,234.56`, `-$20.00` or `(20.00)`.
pub fn parse_us_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let parenthesized = trimmed.starts_with('(') && trimmed.ends_with(')');
    let minus = trimmed.contains('-');

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let magnitude = Decimal::from_str(&cleaned).ok()?;
    if parenthesized || minus {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

/// Format an amount as `$1,234.56` (negative: `-$1,234.56`).
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let s = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_scan_amounts_in_order() {
        let values: Vec<Decimal> = scan_amounts("Bruxzir #3 Shade C1 1 $ 110.00 $ 110.00")
            .into_iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![dec("3"), dec("1"), dec("1"), dec("110.00"), dec("110.00")]);
    }

    #[test]
    fn test_scan_parenthesized_is_negative() {
        let matches = scan_amounts("Rebate 1 $ 110.00 ($ 110.00)");
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[2].value, dec("-110.00"));
        assert_eq!(matches[2].source, "($ 110.00)");
    }

    #[test]
    fn test_scan_thousands_separator() {
        let matches = scan_amounts("Bridge 1 $1,250.00 $1,250.00");
        assert_eq!(matches[1].value, dec("1250.00"));
        assert_eq!(matches[2].value, dec("1250.00"));
    }

    #[test]
    fn test_scan_unbalanced_parenthesis_stays_positive() {
        let matches = scan_amounts("Shade (A2) 1 50.00 50.00");
        assert!(matches.iter().all(|m| m.value >= Decimal::ZERO));
    }

    #[test]
    fn test_parse_us_amount() {
        assert_eq!(parse_us_amount("$1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_us_amount("180.00"), Some(dec("180.00")));
        assert_eq!(parse_us_amount("-$20.00"), Some(dec("-20.00")));
        assert_eq!(parse_us_amount("$-20.00"), Some(dec("-20.00")));
        assert_eq!(parse_us_amount("($20.00)"), Some(dec("-20.00")));
        assert_eq!(parse_us_amount(""), None);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec("1234.5")), "$1,234.50");
        assert_eq!(format_usd(dec("12345678.90")), "$12,345,678.90");
        assert_eq!(format_usd(dec("180")), "$180.00");
        assert_eq!(format_usd(dec("-20")), "-$20.00");
        assert_eq!(format_usd(Decimal::ZERO), "$0.00");
    }
}

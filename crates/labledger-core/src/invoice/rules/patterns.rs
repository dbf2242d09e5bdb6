//! Common regex patterns for dental-lab invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "INVOICE FOR:" ... "DESCRIPTION", tolerating a space between every character.
    // Lazy capture, may span lines.
    pub static ref DENTIST_HEADER: Regex = Regex::new(
        r"(?is)I\s*N\s*V\s*O\s*I\s*C\s*E\s*F\s*O\s*R\s*:(?P<name>.*?)D\s*E\s*S\s*C\s*R\s*I\s*P\s*T\s*I\s*O\s*N"
    ).unwrap();

    // Footer: "Patient: Jane Doe, Due 3/15/2024" (US month/day/year)
    pub static ref PATIENT_DUE: Regex = Regex::new(
        r"(?i)Patient:\s*(?P<name>.+?),\s*Due\s*(?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{4})"
    ).unwrap();

    // Money-looking token: optional "(", optional "$", digits with optional
    // thousands groups, optional 2-digit fraction, optional ")".
    pub static ref MONEY_TOKEN: Regex = Regex::new(
        r"(?P<open>\(\s*)?(?:\$\s*)?(?P<number>\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?)(?P<close>\s*\))?"
    ).unwrap();

    // Summary lines that end the line-item table.
    pub static ref TABLE_END: Regex = Regex::new(
        r"(?i)\b(?:subtotal|total|sub-total)\b"
    ).unwrap();

    // Lowercase followed by uppercase: a word boundary lost to whitespace stripping.
    pub static ref CASE_BOUNDARY: Regex = Regex::new(
        r"([a-z])([A-Z])"
    ).unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).unwrap();
}

/// Tokens a table header must contain once spaces are removed.
pub const TABLE_HEADER_TOKENS: [&str; 4] = ["DESCRIPTION", "QUANTITY", "UNITPRICE", "COST"];

//! Swiss formatting helpers for documents and bills.

use chrono::NaiveDate;

/// Rounds to two decimals (Rappen).
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats an amount with apostrophe thousands separators and two decimals.
///
/// # Examples
/// ```
/// use immo_ledger::core::format::swiss_money;
/// assert_eq!(swiss_money(1250.5), "1'250.50");
/// assert_eq!(swiss_money(-42.0), "-42.00");
/// ```
#[must_use]
pub fn swiss_money(amount: f64) -> String {
    let fixed = fixed2(amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('\'');
        }
        grouped.push(digit);
    }

    // -0.001 rounds to 0.00 and must not print a sign
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

/// Plain two-decimal representation, as used in QR payloads.
#[must_use]
pub fn fixed2(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Formats a date as `dd.mm.yyyy`.
#[must_use]
pub fn swiss_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Groups an IBAN into blocks of four for display.
#[must_use]
pub fn format_iban(iban: &str) -> String {
    let compact: Vec<char> = iban.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns a title into a safe file-name stem.
///
/// Lowercases, keeps ASCII letters, digits, `_` and `-`, and collapses runs of
/// whitespace and dashes into one dash.
#[must_use]
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        }
    }

    out
}

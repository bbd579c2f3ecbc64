//! Belgian structured payment reference (gestructureerde mededeling)
//!
//! A structured reference is a 12-digit identifier printed on invoices as
//! `+++AAA/BBBB/CCCCC+++` (or with `***` delimiters) and echoed back in
//! the remittance text of the paying transaction. The last two digits are
//! a modulo-97 check over the first ten, with a remainder of 0 written
//! as 97.
//!
//! Everything here is pure: malformed input fails validation, it never
//! errors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ReconcileError, ReconcileResult};

static DELIMITED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[+*]{3}(\d{3})/(\d{4})/(\d{5})[+*]{3}").expect("delimited reference pattern")
});

static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit run pattern"));

/// Extract a structured reference from free-text remittance information.
///
/// Recognizes the delimited forms `+++AAA/BBBB/CCCCC+++` and
/// `***AAA/BBBB/CCCCC***`, or a bare run of exactly 12 digits that passes
/// the checksum. Longer digit runs never yield a reference: a 12-digit
/// window inside a 13-digit run is numeric noise, not a reference.
pub fn extract(text: &str) -> Option<String> {
    if let Some(caps) = DELIMITED_RE.captures(text) {
        return Some(format!("{}{}{}", &caps[1], &caps[2], &caps[3]));
    }

    // Bare candidates must be maximal runs of exactly 12 digits and must
    // validate, so nearby amounts or account numbers are never guessed at.
    DIGIT_RUN_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|run| run.len() == 12)
        .find(|run| validate(run))
        .map(str::to_string)
}

/// Validate a canonical 12-digit structured reference.
///
/// The first 10 digits interpreted as an integer, modulo 97 (remainder 0
/// mapped to 97), must equal the last two digits.
pub fn validate(reference: &str) -> bool {
    if reference.len() != 12 || !reference.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let base: u64 = match reference[..10].parse() {
        Ok(n) => n,
        Err(_) => return false,
    };
    let check: u64 = match reference[10..].parse() {
        Ok(n) => n,
        Err(_) => return false,
    };
    let mut expected = base % 97;
    if expected == 0 {
        expected = 97;
    }
    expected == check
}

/// Format a canonical 12-digit reference for display as
/// `+++AAA/BBBB/CCCCC+++`.
pub fn format(reference: &str) -> ReconcileResult<String> {
    if reference.len() != 12 || !reference.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReconcileError::Validation(format!(
            "structured reference must be exactly 12 digits, got '{reference}'"
        )));
    }
    Ok(format!(
        "+++{}/{}/{}+++",
        &reference[..3],
        &reference[3..7],
        &reference[7..]
    ))
}

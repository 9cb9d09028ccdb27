//! Document number reconciliation
//!
//! QuickBooks and the local database can both hand out "the next" invoice,
//! estimate, purchase order or bill number. [`extract_next_number`] looks at the
//! recent numbers from both sides and returns one that is larger than all of
//! them, formatted in the style of the current highest number.
//!
//! The result is not reserved anywhere: two callers computing a number at the
//! same time before either persists it will get the same answer.

use regex::Regex;
use std::sync::OnceLock;

/// Width used when no usable candidate dictates one
const DEFAULT_WIDTH: usize = 4;

static TRAILING_DIGITS: OnceLock<Regex> = OnceLock::new();
static ALTERNATE_PREFIX: OnceLock<Regex> = OnceLock::new();

fn trailing_digits() -> &'static Regex {
    TRAILING_DIGITS.get_or_init(|| Regex::new(r"(\d+)$").expect("valid trailing digit pattern"))
}

fn alternate_prefix() -> &'static Regex {
    ALTERNATE_PREFIX
        .get_or_init(|| Regex::new(r"^([A-Za-z-]+)(\d+)$").expect("valid alternate prefix pattern"))
}

/// Trailing numeric value of a document number, if it has a non-zero one
///
/// Digit runs with no successor in a `u128` are treated as unusable.
pub fn numeric_suffix(candidate: &str) -> Option<u128> {
    let captures = trailing_digits().captures(candidate.trim())?;
    let value = captures.get(1)?.as_str().parse::<u128>().ok()?;
    value.checked_add(1)?;
    (value > 0).then_some(value)
}

fn pad(value: u128, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// Compute the next document number from a list of recently used ones
///
/// `candidates` should list remote numbers first, then local numbers, each
/// newest-first; on equal numeric values the first one wins and decides the
/// output style. Formatting precedence is:
///
/// 1. winner is `prefix` followed by digits only: keep `prefix` and the digit width
/// 2. winner is digits only: keep the digit width, no prefix
/// 3. winner is letters/dashes followed by digits: keep that prefix and width
/// 4. anything else: `prefix` plus four zero-padded digits
///
/// # Example
///
/// ```rust
/// use fieldops_sync::shared::numbering::extract_next_number;
///
/// assert_eq!(extract_next_number(&["PO-0099", "PO-0050"], "PO-"), "PO-0100");
/// assert_eq!(extract_next_number::<&str>(&[], "INV-"), "INV-0001");
/// ```
pub fn extract_next_number<S: AsRef<str>>(candidates: &[S], prefix: &str) -> String {
    let mut winner: Option<(&str, u128)> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref().trim();
        let Some(value) = numeric_suffix(candidate) else {
            continue;
        };
        match winner {
            Some((_, best)) if value <= best => {}
            _ => winner = Some((candidate, value)),
        }
    }

    let Some((winner, max)) = winner else {
        return format!("{}{}", prefix, pad(1, DEFAULT_WIDTH));
    };
    let next = max + 1;

    if let Some(digits) = winner.strip_prefix(prefix) {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return format!("{}{}", prefix, pad(next, digits.len()));
        }
    }

    if winner.bytes().all(|b| b.is_ascii_digit()) {
        return pad(next, winner.len());
    }

    if let Some(captures) = alternate_prefix().captures(winner) {
        let other_prefix = &captures[1];
        let width = captures[2].len();
        return format!("{}{}", other_prefix, pad(next, width));
    }

    format!("{}{}", prefix, pad(next, DEFAULT_WIDTH))
}

//! Property tests for document number reconciliation

use proptest::prelude::*;

use fieldops_sync::shared::numbering::{extract_next_number, numeric_suffix};

fn prefixed(prefix: &'static str) -> impl Strategy<Value = String> {
    (0u32..1_000_000, 1usize..8).prop_map(move |(n, width)| format!("{}{:0width$}", prefix, n, width = width))
}

proptest! {
    #[test]
    fn next_number_exceeds_every_candidate(candidates in prop::collection::vec(prefixed("INV-"), 0..20)) {
        let next = extract_next_number(&candidates, "INV-");
        let next_value = numeric_suffix(&next).unwrap();

        prop_assert!(next.starts_with("INV-"));
        for candidate in &candidates {
            if let Some(value) = numeric_suffix(candidate) {
                prop_assert!(next_value > value, "{} does not exceed {}", next, candidate);
            }
        }
    }

    #[test]
    fn next_number_is_not_among_candidates(
        remote in prop::collection::vec(prefixed("PO-"), 0..10),
        local in prop::collection::vec(prefixed("PO-"), 0..10),
    ) {
        let candidates: Vec<String> = remote.into_iter().chain(local).collect();
        let next = extract_next_number(&candidates, "PO-");

        prop_assert!(!candidates.contains(&next));
    }

    #[test]
    fn arbitrary_text_never_panics(candidates in prop::collection::vec(".{0,24}", 0..10)) {
        let next = extract_next_number(&candidates, "EST-");
        prop_assert!(numeric_suffix(&next).is_some());
    }

    #[test]
    fn long_digit_runs_never_overflow(candidates in prop::collection::vec("INV-[0-9]{30,45}", 1..6)) {
        let next = extract_next_number(&candidates, "INV-");
        let next_value = numeric_suffix(&next).unwrap();

        for candidate in &candidates {
            if let Some(value) = numeric_suffix(candidate) {
                prop_assert!(next_value > value, "{} does not exceed {}", next, candidate);
            }
        }
    }
}

#[test]
fn empty_history_starts_at_one() {
    assert_eq!(extract_next_number::<String>(&[], "BILL-"), "BILL-0001");
}

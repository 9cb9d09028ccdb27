//! Property tests for webhook signatures

use proptest::prelude::*;

use fieldops_sync::backend::sync::webhook::{compute_signature, verify_signature};

proptest! {
    #[test]
    fn signature_verifies_its_own_body(token in "[a-zA-Z0-9-]{1,40}", body in prop::collection::vec(any::<u8>(), 0..512)) {
        let signature = compute_signature(&token, &body);
        prop_assert!(verify_signature(&token, &body, &signature));
    }

    #[test]
    fn flipped_byte_fails_verification(
        body in prop::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
    ) {
        let signature = compute_signature("verifier-token", &body);
        let mut tampered = body.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 0x01;

        prop_assert!(!verify_signature("verifier-token", &tampered, &signature));
    }

    #[test]
    fn other_token_fails_verification(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let signature = compute_signature("verifier-token", &body);
        prop_assert!(!verify_signature("another-token", &body, &signature));
    }
}

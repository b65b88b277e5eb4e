use std::sync::Arc;

use chrono::{DateTime, Duration};
use confido_auth::auth::{TokenCodec, TokenKind};
use confido_auth::domain::ManualClock;
use proptest::prelude::*;

const SECRET: &[u8] = b"property-test-secret-with-32-bytes-or-more";
const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn codec() -> (TokenCodec, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
    let codec = TokenCodec::new(SECRET, "confido", clock.clone()).unwrap();
    (codec, clock)
}

proptest! {
    #[test]
    fn any_signature_mutation_fails_parse(position in 0usize..64, replacement in 0usize..64) {
        let (codec, _) = codec();
        let issued = codec.issue("alice@example.com", TokenKind::Access, Duration::hours(1)).unwrap();

        let signature_start = issued.token.rfind('.').unwrap() + 1;
        let signature_len = issued.token.len() - signature_start;
        let index = signature_start + position % signature_len;

        let original = issued.token.as_bytes()[index];
        let substitute = BASE64URL[replacement];
        prop_assume!(original != substitute);

        let mut tampered = issued.token.clone().into_bytes();
        tampered[index] = substitute;
        let tampered = String::from_utf8(tampered).unwrap();

        prop_assert!(codec.parse(&tampered).is_err());
        prop_assert!(!codec.validate(&tampered, "alice@example.com"));
    }

    #[test]
    fn validity_flips_exactly_at_expiry(ttl_secs in 1i64..86_400) {
        let (codec, clock) = codec();
        let issued = codec.issue("alice@example.com", TokenKind::Access, Duration::seconds(ttl_secs)).unwrap();

        clock.advance(Duration::seconds(ttl_secs - 1));
        prop_assert!(codec.validate(&issued.token, "alice@example.com"));

        clock.advance(Duration::seconds(1));
        prop_assert!(!codec.validate(&issued.token, "alice@example.com"));
    }

    #[test]
    fn scopes_never_cross(subject in "[a-z]{1,12}@[a-z]{1,8}\\.com") {
        let (codec, _) = codec();
        let access = codec.issue(&subject, TokenKind::Access, Duration::hours(1)).unwrap();
        let refresh = codec.issue(&subject, TokenKind::Refresh, Duration::hours(1)).unwrap();

        prop_assert!(codec.verify(&access.token, TokenKind::Refresh).is_err());
        prop_assert!(codec.verify(&refresh.token, TokenKind::Access).is_err());
        prop_assert_eq!(codec.verify(&access.token, TokenKind::Access).unwrap().sub, subject);
    }
}

use json_pilot_engine::{decode_path, encode_path, path_from_identifier, path_identifier};
use json_pilot_tree::PathSegment;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        any::<String>().prop_map(PathSegment::Key),
        (0usize..10_000).prop_map(PathSegment::Index),
    ]
}

proptest! {
    #[test]
    fn round_trip_any_path(path in proptest::collection::vec(segment(), 0..8)) {
        let token = encode_path(&path);
        prop_assert_eq!(decode_path(&token).unwrap(), path);
    }

    #[test]
    fn token_stays_identifier_safe(path in proptest::collection::vec(segment(), 0..8)) {
        let token = encode_path(&path);
        prop_assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn identifier_round_trip(path in proptest::collection::vec(segment(), 0..8)) {
        let id = path_identifier(&path);
        prop_assert_eq!(path_from_identifier(&id).unwrap(), path);
    }

    #[test]
    fn arbitrary_identifier_never_panics(s in "\\PC*") {
        let _ = path_from_identifier(&s);
    }
}

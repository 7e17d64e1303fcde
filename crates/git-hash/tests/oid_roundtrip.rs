use git_hash::hex::{hex_decode, hex_to_string};
use git_hash::ObjectId;
use proptest::prelude::*;

proptest! {
    #[test]
    fn hex_decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let hex = hex_to_string(&bytes);
        prop_assert_eq!(hex.len(), bytes.len() * 2);
        let mut decoded = vec![0u8; bytes.len()];
        hex_decode(&hex, &mut decoded).unwrap();
        prop_assert_eq!(decoded, bytes);
    }

    #[test]
    fn object_id_parses_its_display(bytes in proptest::array::uniform20(any::<u8>())) {
        let oid = ObjectId::from_bytes(&bytes).unwrap();
        let parsed: ObjectId = oid.to_string().parse().unwrap();
        prop_assert_eq!(parsed, oid);
    }
}

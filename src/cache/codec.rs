//! JSON value codec used for cache payloads.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::CacheError;

/// Encode a value into the payload stored by every backend.
pub fn encode<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(value).map_err(|e| CacheError::Encoding(e.to_string()))
}

/// Decode a payload previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CacheError> {
    serde_json::from_slice(payload).map_err(|e| CacheError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestItem {
        key: String,
        value: String,
    }

    #[test]
    fn test_record_payload() {
        let item = TestItem {
            key: "key".to_string(),
            value: "value".to_string(),
        };
        let payload = encode(&item).unwrap();
        assert_eq!(payload, br#"{"key":"key","value":"value"}"#.to_vec());
        assert_eq!(decode::<TestItem>(&payload).unwrap(), item);
    }

    #[test]
    fn test_non_string_map_keys_fail_to_encode() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not JSON object keys");
        assert!(matches!(encode(&map), Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let payload = encode("value").unwrap();
        assert!(matches!(decode::<i64>(&payload), Err(CacheError::Decoding(_))));
    }

    proptest! {
        #[test]
        fn property_arbitrary_payload_never_panics(payload in prop::collection::vec(any::<u8>(), 0..64)) {
            match decode::<TestItem>(&payload) {
                Ok(_) | Err(CacheError::Decoding(_)) => {}
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }
    }
}

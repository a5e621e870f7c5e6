//! Body decoding for response envelopes.

use serde_json::{Map, Value};
use std::fmt;
use tracing::trace;

/// Turns a response body into the attribute tree.
///
/// Implementations never fail: anything that cannot be decoded yields an
/// empty mapping.
pub trait BodyDecoder: fmt::Debug + Send + Sync {
    fn decode(&self, body: &[u8]) -> Value;
}

/// JSON body decoder.
///
/// Only objects and arrays are kept; scalars, `null`, malformed input and
/// empty bodies decode to an empty object.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBodyDecoder;

impl BodyDecoder for JsonBodyDecoder {
    fn decode(&self, body: &[u8]) -> Value {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Value::Object(Map::new());
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(e) => {
                trace!(error = %e, "Response body is not JSON");
                Value::Object(Map::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(b"" ; "empty body")]
    #[test_case(b"   \r\n" ; "whitespace only")]
    #[test_case(b"<html></html>" ; "not json")]
    #[test_case(b"{\"a\":" ; "truncated json")]
    #[test_case(b"42" ; "scalar")]
    #[test_case(b"null" ; "null literal")]
    fn test_undecodable_bodies_are_empty(body: &[u8]) {
        assert_eq!(JsonBodyDecoder.decode(body), json!({}));
    }

    #[test]
    fn test_containers_are_kept() {
        assert_eq!(JsonBodyDecoder.decode(br#"{"a":[1,2]}"#), json!({"a": [1, 2]}));
        assert_eq!(JsonBodyDecoder.decode(b"[1,2]"), json!([1, 2]));
    }
}

//! Canonical JSON encoding and path helpers.
//!
//! Manipulation assertions sign the exact bytes of the request body, so the
//! body must be produced the same way every time:
//!
//! - keys keep their declaration (or insertion) order, never re-sorted;
//! - sets are sent as arrays, in the set's iteration order;
//! - dates are ISO8601 strings (see [`Timestamp`](crate::timestamp::Timestamp));
//! - a record without keys is sent as the empty string rather than `{}`.
//!
//! The last rule is a protocol quirk the server relies on: an empty signed body
//! means "no additional claims", and endpoints such as payment cancellation
//! reject a literal `{}`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// JSON-encodes a record following the canonical rules above.
///
/// ```
/// use ponchopay_types::serialise;
/// use std::collections::BTreeMap;
///
/// assert_eq!(serialise(&BTreeMap::<String, u64>::new()).unwrap(), "");
/// assert_eq!(serialise(&BTreeMap::from([("key", 123)])).unwrap(), r#"{"key":123}"#);
/// ```
///
/// # Errors
///
/// Returns an error if `data` cannot be represented as JSON, e.g. a map with
/// non-string keys.
pub fn serialise<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(data)?;
    if matches!(&value, Value::Object(map) if map.is_empty()) {
        return Ok(String::new());
    }
    serde_json::to_string(&value)
}

/// Joins two paths with a single forward slash in the middle.
///
/// All trailing slashes of `left` and all leading slashes of `right` are dropped.
pub fn join_paths(left: &str, right: &str) -> String {
    format!(
        "{}/{}",
        left.trim_end_matches('/'),
        right.trim_start_matches('/')
    )
}

static PARAM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z ]+)\]").expect("Invalid path parameter regex"));

/// Replaces every `[name]` in `haystack` with `params[name]`.
///
/// Placeholders without a matching parameter are removed, not left in place.
///
/// ```
/// use ponchopay_types::replace_params;
/// use std::collections::HashMap;
///
/// let path = replace_params("/api/payment/[id]/cancel", &HashMap::from([("id", "abc")]));
/// assert_eq!(path, "/api/payment/abc/cancel");
/// assert_eq!(replace_params("/api/payment/[id]/cancel", &HashMap::new()), "/api/payment//cancel");
/// ```
pub fn replace_params(haystack: &str, params: &HashMap<&str, &str>) -> String {
    PARAM_REGEX
        .replace_all(haystack, |caps: &Captures| {
            params.get(&caps[1]).copied().unwrap_or_default().to_string()
        })
        .into_owned()
}

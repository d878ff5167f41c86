//! Cache Key Canonicalization
//!
//! A single, shared encoding from arbitrary serializable keys to the stable
//! string form used by storage. `set`, `get`, `has`, and `remove` all go
//! through this function, so the encode side and the lookup side can never
//! disagree.
//!
//! Strings pass through unchanged and numbers use their decimal form. Any
//! other shape is encoded as compact JSON with object keys sorted
//! (serde_json's default `Map` is backed by a `BTreeMap`). Known caveat: two
//! structurally different keys that serialize to the same JSON collide, and a
//! key that fails to serialize degrades to a shared opaque token. Callers
//! with exotic key types should pre-encode their own strings.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Fallback token for keys that cannot be serialized. All such keys collide.
const OPAQUE_KEY: &str = "<unserializable-key>";

/// Converts any serializable key to its canonical storage string.
pub fn canonical_key<K: Serialize + ?Sized>(key: &K) -> String {
    match serde_json::to_value(key) {
        Ok(Value::String(s)) => s,
        Ok(value) => value.to_string(),
        Err(err) => {
            warn!("Cache key failed to serialize, degrading to opaque token: {}", err);
            OPAQUE_KEY.to_string()
        }
    }
}

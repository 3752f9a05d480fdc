use crate::model::{FormData, FormType};
use sha2::{Digest, Sha256};

/// Fingerprint for the in-flight dedup guard. Two rapid submissions of the
/// same page with the same action and payload hash to the same key; the
/// payload is serialized from a sorted map, so field order cannot split keys.
pub fn submission_key(form_type: FormType, action_type: &str, data: &FormData) -> String {
    let mut h = Sha256::new();
    h.update(form_type.as_str().as_bytes());
    h.update(b"\n");
    h.update(action_type.as_bytes());
    h.update(b"\n");
    h.update(serde_json::to_string(data).unwrap_or_default().as_bytes());
    hex::encode(h.finalize())
}

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a control result.
///
/// Identity fields:
/// - control id
/// - resource type
/// - resource pointer within the template
pub fn fingerprint_for_result(control_id: &str, resource_type: &str, pointer: &str) -> String {
    let canonical = [control_id, resource_type, pointer].join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_field_sensitive() {
        let a = fingerprint_for_result("Storage_HTTPS", "Microsoft.Storage/storageAccounts", "/resources/0");
        let b = fingerprint_for_result("Storage_HTTPS", "Microsoft.Storage/storageAccounts", "/resources/0");
        let c = fingerprint_for_result("Storage_HTTPS", "Microsoft.Storage/storageAccounts", "/resources/1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}

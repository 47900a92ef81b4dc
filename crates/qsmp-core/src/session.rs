//! Session-id gate.
//!
//! Session-scoped keys (identity, share, shareSign, room) carry the UUIDv7
//! of the session that issued them. Issuance itself is the platform's job;
//! this module only enforces the syntactic precondition.

use uuid::{Uuid, Variant};

/// Accepts exactly the hyphenated UUIDv7 form,
/// `xxxxxxxx-xxxx-7xxx-[89ab]xxx-xxxxxxxxxxxx`, case-insensitive.
///
/// Braced, URN, and compact spellings are rejected even when they denote a
/// valid v7 UUID, since the string is embedded verbatim in key JSON.
pub fn is_valid_uuid_v7(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    let bytes = s.as_bytes();
    if bytes[8] != b'-' || bytes[13] != b'-' || bytes[18] != b'-' || bytes[23] != b'-' {
        return false;
    }
    match Uuid::try_parse(s) {
        Ok(uuid) => uuid.get_version_num() == 7 && uuid.get_variant() == Variant::RFC4122,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_v7() {
        assert!(is_valid_uuid_v7("018fdb31-0798-78a2-b4c9-e145d5b5b88e"));
        // case-insensitive
        assert!(is_valid_uuid_v7("018FDB31-0798-78A2-B4C9-E145D5B5B88E"));
    }

    #[test]
    fn rejects_other_versions() {
        // v4
        assert!(!is_valid_uuid_v7("7c2a5a3e-9b5e-4d5c-8f2a-1f0e9b8c7d6e"));
        // v1
        assert!(!is_valid_uuid_v7("c232ab00-9414-11ec-b3c8-9f6bdeced846"));
    }

    #[test]
    fn rejects_malformed() {
        assert!(!is_valid_uuid_v7("invalid-uuid"));
        assert!(!is_valid_uuid_v7(""));
        // compact spelling of a valid v7
        assert!(!is_valid_uuid_v7("018fdb31079878a2b4c9e145d5b5b88e"));
        // bad variant nibble
        assert!(!is_valid_uuid_v7("018fdb31-0798-78a2-c4c9-e145d5b5b88e"));
        // truncated
        assert!(!is_valid_uuid_v7("018fdb31-0798-78a2-b4c9-e145d5b5b88"));
    }
}

//! Base64/hex conversions and the key-hash binding.

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

/// Base64 length of an encoded SHA-256 digest.
pub const KEY_HASH_LEN: usize = 44;
/// Raw length of a decoded key hash.
pub const KEY_HASH_RAW_LEN: usize = 32;

pub fn b64_encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn b64_decode(s: &str) -> Option<Vec<u8>> {
    general_purpose::STANDARD.decode(s).ok()
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn hex_lower(data: &[u8]) -> String {
    hex::encode(data)
}

/// base64(SHA-256(utf8(s))).
///
/// The argument is the full JSON string of a public key exactly as emitted
/// by its generator, not the bare `key` field. Peers locate signers and
/// recipients by this value, so the input string must be the canonical
/// serialization.
pub fn key_hash(s: &str) -> String {
    b64_encode(&sha256(s.as_bytes()))
}

/// Shape check for a key hash: 44 base64 chars decoding to 32 bytes.
pub fn is_valid_key_hash(s: &str) -> bool {
    s.len() == KEY_HASH_LEN
        && b64_decode(s).map_or(false, |raw| raw.len() == KEY_HASH_RAW_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_hash_kat() {
        assert_eq!(
            key_hash("hello world"),
            "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek="
        );
    }

    #[test]
    fn key_hash_shape() {
        let h = key_hash("anything at all");
        assert_eq!(h.len(), KEY_HASH_LEN);
        assert_eq!(b64_decode(&h).unwrap().len(), KEY_HASH_RAW_LEN);
        assert!(is_valid_key_hash(&h));
    }

    #[test]
    fn b64_roundtrip_padded() {
        let data = [0u8, 1, 2, 3, 254, 255];
        let enc = b64_encode(&data);
        assert!(enc.ends_with('='));
        assert_eq!(b64_decode(&enc).unwrap(), data);
    }

    #[test]
    fn b64_rejects_garbage() {
        assert!(b64_decode("not base64 !!").is_none());
        assert!(!is_valid_key_hash("not base64 !!"));
        // right length, wrong alphabet
        assert!(!is_valid_key_hash(&"@".repeat(44)));
    }

    #[test]
    fn hex_is_lowercase() {
        assert_eq!(hex_lower(&[0xAB, 0xCD, 0x01]), "abcd01");
    }
}

//! The typed key algebra: one module per key class.
//!
//! Generators return typed pairs (plus the issuing master signature where
//! the class is cross-signed); every type serializes to the exact wire JSON
//! of its class and parses back through the structural validators.

pub mod account;
pub mod device;
pub mod identity;
pub mod master;
pub mod migrate;
pub mod room;
pub mod server;
pub mod share;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::envelope::{KeyJson, KeyShape};

/// Milliseconds since the Unix epoch; key timestamps are stamped with this
/// at generation time.
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

pub(crate) fn random_seed() -> Zeroizing<[u8; 32]> {
    let mut seed = Zeroizing::new([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(&mut *seed);
    seed
}

/// Assemble the wire JSON for a key, taking the literals from its shape.
pub(crate) fn build_key_json(
    shape: &KeyShape,
    key: &[u8],
    timestamp: Option<i64>,
    session_uuid: Option<&str>,
) -> KeyJson {
    KeyJson {
        key_type: shape.key_type.to_string(),
        key: crate::codec::b64_encode(key),
        algorithm: shape.algorithm.map(str::to_string),
        timestamp,
        session_uuid: session_uuid.map(str::to_string),
    }
}

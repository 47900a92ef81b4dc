//! Room key: the 32-byte AES-256-GCM key shared by the members of a room.
//!
//! Issued under a session UUID and fanned out to members via their account
//! keys (`distribution`). Message payloads are encrypted under it.

use rand::RngCore;
use zeroize::Zeroizing;

use crate::codec::key_hash;
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, EncryptedEnvelope, EnvelopeForm, KeyKind,
    Visibility,
};
use crate::error::{Error, Result};
use crate::keys::{build_key_json, now_ms};
use crate::seal;
use crate::session::is_valid_uuid_v7;

const WIRE_ROLE: &str = "roomKey";

pub struct RoomKey {
    key: Zeroizing<[u8; 32]>,
    timestamp: i64,
    session_uuid: String,
}

impl RoomKey {
    pub fn generate(session_uuid: &str) -> Result<RoomKey> {
        if !is_valid_uuid_v7(session_uuid) {
            return Err(Error::input("sessionUuid is not a UUIDv7"));
        }
        let mut key = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(&mut *key);
        Ok(RoomKey {
            key,
            timestamp: now_ms(),
            session_uuid: session_uuid.to_string(),
        })
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Room, Visibility::Public);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        let key: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::input("room key is not 32 bytes"))?;
        Ok(RoomKey {
            key: Zeroizing::new(key),
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Room, Visibility::Public);
        build_key_json(
            &shape,
            self.key.as_slice(),
            Some(self.timestamp),
            Some(&self.session_uuid),
        )
        .to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn session_uuid(&self) -> &str {
        &self.session_uuid
    }
}

/// AEAD-encrypt `data` under the room key (§4.6 envelope, no `cipherText`).
pub fn encrypt_data_room_key(room_key: &RoomKey, data: &str) -> Result<EncryptedEnvelope> {
    seal::encrypt_with_symmetric_key(
        WIRE_ROLE,
        &room_key.to_json()?,
        &room_key.key,
        data.as_bytes(),
    )
}

pub fn decrypt_data_room_key(room_key: &RoomKey, envelope: &EncryptedEnvelope) -> Result<String> {
    let plain = seal::decrypt_with_symmetric_key(envelope, WIRE_ROLE, &room_key.key)?;
    String::from_utf8(plain).map_err(|_| Error::input("decrypted payload is not UTF-8"))
}

pub fn is_valid_room_key(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Room, Visibility::Public))
}

pub fn is_valid_encrypted_data_room_key(s: &str) -> bool {
    EncryptedEnvelope::from_json(s)
        .and_then(|env| env.validate(WIRE_ROLE, EnvelopeForm::Symmetric).map(|_| ()))
        .is_ok()
}

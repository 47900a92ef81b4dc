//! The outer message envelope: room-key encryption coupled with an
//! identity-key signature, plus the freshness and room-binding guards.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::envelope::{EncryptedEnvelope, SignatureEnvelope};
use crate::error::{Error, Result};
use crate::keys::identity::{verify_identity_key, IdentityKeyPair, IdentityPublicKey};
use crate::keys::room::{
    decrypt_data_room_key, encrypt_data_room_key, is_valid_encrypted_data_room_key, RoomKey,
};

/// A message timestamp may drift at most this far from the server's clock,
/// in either direction. The bound itself is accepted.
pub const FRESHNESS_WINDOW_MS: i64 = 60_000;

/// Longest accepted `channel` string, in characters.
pub const MAX_CHANNEL_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    File,
    Thumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageReply {
    pub id: String,
}

/// The cleartext payload: what a room key actually encrypts.
///
/// `content` is itself a JSON document whose schema depends on `type`;
/// this layer only requires it to parse. `mention` may be absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageValue {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<MessageReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention: Option<Vec<String>>,
}

/// Outer envelope of an encrypted message; `value` is a room-envelope JSON
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedMessage {
    pub encrypted: bool,
    pub value: String,
    pub channel: String,
    pub timestamp: i64,
    #[serde(rename = "isLarge")]
    pub is_large: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    pub roomid: String,
}

/// Outer envelope of a cleartext message, and the result of decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlainMessage {
    pub encrypted: bool,
    pub value: MessageValue,
    pub channel: String,
    pub timestamp: i64,
    #[serde(rename = "isLarge")]
    pub is_large: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    pub roomid: String,
}

/// Caller-supplied outer-envelope fields for [`encrypt_message`].
#[derive(Debug, Clone)]
pub struct MessageMetadata {
    pub channel: String,
    pub timestamp: i64,
    pub is_large: bool,
    pub original: Option<String>,
}

/// A serialized outer message together with the identity signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedMessage {
    pub message: String,
    pub sign: SignatureEnvelope,
}

/// Server-supplied context for decryption; the trusted clock.
#[derive(Debug, Clone, Copy)]
pub struct ServerData {
    pub timestamp: i64,
}

fn check_channel(channel: &str) -> Result<()> {
    let len = channel.chars().count();
    if len > MAX_CHANNEL_LEN {
        return Err(Error::input(format!(
            "channel is {len} chars, limit {MAX_CHANNEL_LEN}"
        )));
    }
    Ok(())
}

fn check_guards(roomid_wire: &str, timestamp: i64, expected_roomid: &str, server: &ServerData) -> Result<()> {
    if roomid_wire != expected_roomid {
        return Err(Error::Binding("message roomid does not match"));
    }
    let skew_ms = timestamp.saturating_sub(server.timestamp).saturating_abs();
    if skew_ms > FRESHNESS_WINDOW_MS {
        debug!(skew_ms, "message outside freshness window");
        return Err(Error::Freshness { skew_ms });
    }
    Ok(())
}

fn check_value_shape(value: &MessageValue) -> Result<()> {
    if serde_json::from_str::<serde_json::Value>(&value.content).is_err() {
        return Err(Error::input("message content is not a JSON document"));
    }
    Ok(())
}

/// Encrypt `value` under the room key and sign the assembled outer message
/// with the sender's identity key.
pub fn encrypt_message(
    value: &MessageValue,
    metadata: &MessageMetadata,
    room_key: &RoomKey,
    identity: &IdentityKeyPair,
    roomid: &str,
) -> Result<SignedMessage> {
    check_channel(&metadata.channel)?;
    check_value_shape(value)?;

    let inner = serde_json::to_string(value)
        .map_err(|e| Error::input(format!("serialize message value: {e}")))?;
    let envelope = encrypt_data_room_key(room_key, &inner)?;

    let outer = EncryptedMessage {
        encrypted: true,
        value: envelope.to_json()?,
        channel: metadata.channel.clone(),
        timestamp: metadata.timestamp,
        is_large: metadata.is_large,
        original: metadata.original.clone(),
        roomid: roomid.to_string(),
    };
    let message = serde_json::to_string(&outer)
        .map_err(|e| Error::input(format!("serialize message: {e}")))?;
    let sign = identity.sign(message.as_bytes())?;

    Ok(SignedMessage { message, sign })
}

/// Verify and open a [`SignedMessage`].
///
/// The signature is checked before anything else; the roomid and freshness
/// guards apply to cleartext messages too. `room_key` may be `None` when
/// the caller only ever expects cleartext messages.
pub fn decrypt_message(
    signed: &SignedMessage,
    server: &ServerData,
    room_key: Option<&RoomKey>,
    identity_pub: &IdentityPublicKey,
    roomid: &str,
) -> Result<PlainMessage> {
    if !verify_identity_key(identity_pub, &signed.sign, signed.message.as_bytes()) {
        return Err(Error::Auth("message signature does not verify"));
    }

    let probe: serde_json::Value = serde_json::from_str(&signed.message)
        .map_err(|e| Error::input(format!("parse message: {e}")))?;
    let encrypted = probe
        .get("encrypted")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| Error::input("message has no boolean `encrypted` field"))?;

    if !encrypted {
        let plain: PlainMessage = serde_json::from_str(&signed.message)
            .map_err(|e| Error::input(format!("parse message: {e}")))?;
        check_channel(&plain.channel)?;
        check_value_shape(&plain.value)?;
        check_guards(&plain.roomid, plain.timestamp, roomid, server)?;
        return Ok(plain);
    }

    let outer: EncryptedMessage = serde_json::from_str(&signed.message)
        .map_err(|e| Error::input(format!("parse message: {e}")))?;
    check_channel(&outer.channel)?;
    check_guards(&outer.roomid, outer.timestamp, roomid, server)?;

    let room_key = room_key.ok_or_else(|| Error::input("room key required for encrypted message"))?;
    let envelope = EncryptedEnvelope::from_json(&outer.value)?;
    let inner = decrypt_data_room_key(room_key, &envelope)?;
    let value: MessageValue = serde_json::from_str(&inner)
        .map_err(|e| Error::input(format!("parse decrypted value: {e}")))?;
    check_value_shape(&value)?;

    Ok(PlainMessage {
        encrypted: false,
        value,
        channel: outer.channel,
        timestamp: outer.timestamp,
        is_large: outer.is_large,
        original: outer.original,
        roomid: outer.roomid,
    })
}

/// Structural check of a serialized outer message, total on any input.
pub fn is_valid_message(message: &str) -> bool {
    let Ok(probe) = serde_json::from_str::<serde_json::Value>(message) else {
        return false;
    };
    let Some(encrypted) = probe.get("encrypted").and_then(serde_json::Value::as_bool) else {
        return false;
    };

    if encrypted {
        let Ok(outer) = serde_json::from_str::<EncryptedMessage>(message) else {
            return false;
        };
        outer.channel.chars().count() <= MAX_CHANNEL_LEN
            && is_valid_encrypted_data_room_key(&outer.value)
    } else {
        let Ok(plain) = serde_json::from_str::<PlainMessage>(message) else {
            return false;
        };
        plain.channel.chars().count() <= MAX_CHANNEL_LEN
            && serde_json::from_str::<serde_json::Value>(&plain.value.content).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::master::MasterKeyPair;

    const UUID: &str = "018fdb31-0798-78a2-b4c9-e145d5b5b88e";
    const NOW: i64 = 1_717_000_000_000;

    fn text_value(content: &str) -> MessageValue {
        MessageValue {
            message_type: MessageType::Text,
            content: serde_json::to_string(content).unwrap(),
            reply: None,
            mention: None,
        }
    }

    fn metadata(channel: &str) -> MessageMetadata {
        MessageMetadata {
            channel: channel.to_string(),
            timestamp: NOW,
            is_large: false,
            original: None,
        }
    }

    fn setup() -> (IdentityKeyPair, RoomKey) {
        let master = MasterKeyPair::generate_random();
        let (identity, _) = IdentityKeyPair::generate(UUID, &master).unwrap();
        let room_key = RoomKey::generate(UUID).unwrap();
        (identity, room_key)
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let (identity, room_key) = setup();
        let signed = encrypt_message(
            &text_value("hello room"),
            &metadata("c"),
            &room_key,
            &identity,
            UUID,
        )
        .unwrap();
        assert!(is_valid_message(&signed.message));

        let plain = decrypt_message(
            &signed,
            &ServerData { timestamp: NOW },
            Some(&room_key),
            &identity.public,
            UUID,
        )
        .unwrap();
        assert!(!plain.encrypted);
        assert_eq!(plain.roomid, UUID);
        assert_eq!(plain.channel, "c");
        assert_eq!(plain.value, text_value("hello room"));
    }

    #[test]
    fn freshness_window_boundaries() {
        let (identity, room_key) = setup();
        let signed = encrypt_message(
            &text_value("hi"),
            &metadata("c"),
            &room_key,
            &identity,
            UUID,
        )
        .unwrap();

        for (server_ts, ok) in [
            (NOW + FRESHNESS_WINDOW_MS, true),
            (NOW - FRESHNESS_WINDOW_MS, true),
            (NOW + FRESHNESS_WINDOW_MS + 1, false),
            (NOW - FRESHNESS_WINDOW_MS - 1, false),
        ] {
            let res = decrypt_message(
                &signed,
                &ServerData { timestamp: server_ts },
                Some(&room_key),
                &identity.public,
                UUID,
            );
            assert_eq!(res.is_ok(), ok, "server timestamp {server_ts}");
            if !ok {
                assert!(matches!(res, Err(Error::Freshness { .. })));
            }
        }
    }

    #[test]
    fn roomid_mismatch_rejected() {
        let (identity, room_key) = setup();
        let signed = encrypt_message(
            &text_value("hi"),
            &metadata("c"),
            &room_key,
            &identity,
            UUID,
        )
        .unwrap();

        let res = decrypt_message(
            &signed,
            &ServerData { timestamp: NOW },
            Some(&room_key),
            &identity.public,
            "018fdb31-0798-78a2-b4c9-000000000000",
        );
        assert!(matches!(res, Err(Error::Binding(_))));
    }

    #[test]
    fn tampered_message_rejected() {
        let (identity, room_key) = setup();
        let signed = encrypt_message(
            &text_value("hi"),
            &metadata("c"),
            &room_key,
            &identity,
            UUID,
        )
        .unwrap();

        let tampered = SignedMessage {
            message: signed.message.replace("\"isLarge\":false", "\"isLarge\":true"),
            sign: signed.sign.clone(),
        };
        assert!(matches!(
            decrypt_message(
                &tampered,
                &ServerData { timestamp: NOW },
                Some(&room_key),
                &identity.public,
                UUID,
            ),
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn foreign_identity_rejected() {
        let (identity, room_key) = setup();
        let (other_identity, _) = setup();
        let signed = encrypt_message(
            &text_value("hi"),
            &metadata("c"),
            &room_key,
            &identity,
            UUID,
        )
        .unwrap();

        assert!(decrypt_message(
            &signed,
            &ServerData { timestamp: NOW },
            Some(&room_key),
            &other_identity.public,
            UUID,
        )
        .is_err());
    }

    #[test]
    fn channel_length_boundary() {
        let (identity, room_key) = setup();
        let at_limit = "c".repeat(100);
        let over_limit = "c".repeat(101);

        assert!(encrypt_message(
            &text_value("hi"),
            &metadata(&at_limit),
            &room_key,
            &identity,
            UUID
        )
        .is_ok());
        assert!(encrypt_message(
            &text_value("hi"),
            &metadata(&over_limit),
            &room_key,
            &identity,
            UUID
        )
        .is_err());
    }

    #[test]
    fn cleartext_message_guards_still_apply() {
        let (identity, _) = setup();
        let plain = PlainMessage {
            encrypted: false,
            value: text_value("public notice"),
            channel: "c".into(),
            timestamp: NOW,
            is_large: false,
            original: None,
            roomid: UUID.into(),
        };
        let message = serde_json::to_string(&plain).unwrap();
        let sign = identity.sign(message.as_bytes()).unwrap();
        let signed = SignedMessage { message, sign };

        let opened = decrypt_message(
            &signed,
            &ServerData { timestamp: NOW },
            None,
            &identity.public,
            UUID,
        )
        .unwrap();
        assert_eq!(opened, plain);

        // stale cleartext still rejected
        assert!(decrypt_message(
            &signed,
            &ServerData { timestamp: NOW + FRESHNESS_WINDOW_MS + 1 },
            None,
            &identity.public,
            UUID,
        )
        .is_err());
    }

    #[test]
    fn mention_absent_and_empty_both_parse() {
        let with_empty = r#"{"type":"text","content":"\"x\"","mention":[]}"#;
        let absent = r#"{"type":"text","content":"\"x\""}"#;
        assert!(serde_json::from_str::<MessageValue>(with_empty).is_ok());
        assert!(serde_json::from_str::<MessageValue>(absent).is_ok());
    }

    #[test]
    fn is_valid_message_is_total() {
        for s in ["", "{", "null", "[]", "{\"encrypted\":\"yes\"}", "{\"encrypted\":true}"] {
            assert!(!is_valid_message(s));
        }
    }
}

//! Post-quantum end-to-end-encryption primitives for the Quantum-Shield
//! Messaging Protocol (QSMP).
//!
//! The crate implements the QSMP key algebra — master, identity, account,
//! room, share, shareSign, migrate, migrateSign, device and server keys on
//! ML-KEM-768 (FIPS 203), ML-DSA-65/87 (FIPS 204) and AES-256-GCM — plus
//! the signature, encryption and message envelopes that tie them together.
//!
//! Keys and envelopes travel as UTF-8 JSON strings with a fixed canonical
//! field order; `keyHash` bindings are SHA-256 over those exact strings, so
//! the serialization here is wire format, not presentation. All operations
//! are pure functions over their inputs plus the OS CSPRNG; validation
//! helpers are total and operations return typed errors instead of
//! panicking on malformed input.

pub mod codec;
pub mod distribution;
pub mod envelope;
mod error;
pub mod keys;
pub mod message;
pub mod pq;
mod seal;
pub mod session;

pub use codec::key_hash;
pub use envelope::{
    EncryptedEnvelope, KeyJson, KeyKind, SigAlgorithm, SignatureEnvelope, SignerRole, Visibility,
};
pub use error::{Error, Result};
pub use session::is_valid_uuid_v7;

pub use keys::account::{
    decrypt_data_account_key, encrypt_data_account_key, is_valid_account_key_private,
    is_valid_account_key_public, is_valid_encrypted_data_account_key, AccountKeyPair,
    AccountPublicKey, AccountSecretKey,
};
pub use keys::device::{
    decrypt_data_device_key, encrypt_data_device_key, is_valid_device_key,
    is_valid_encrypted_data_device_key, DeviceKey,
};
pub use keys::identity::{
    is_valid_identity_key_private, is_valid_identity_key_public, verify_identity_key,
    IdentityKeyPair, IdentityPublicKey, IdentitySecretKey,
};
pub use keys::master::{
    is_valid_master_key_private, is_valid_master_key_public, verify_master_key, MasterKeyPair,
    MasterPublicKey, MasterSecretKey,
};
pub use keys::migrate::{
    decrypt_data_migrate_key, encrypt_data_migrate_key, is_valid_encrypted_data_migrate_key,
    is_valid_migrate_key_private, is_valid_migrate_key_public, is_valid_migrate_sign_key_private,
    is_valid_migrate_sign_key_public, verify_data_migrate_sign_key, MigrateKeyPair,
    MigratePublicKey, MigrateSecretKey, MigrateSignKeyPair, MigrateSignPublicKey,
    MigrateSignSecretKey,
};
pub use keys::room::{
    decrypt_data_room_key, encrypt_data_room_key, is_valid_encrypted_data_room_key,
    is_valid_room_key, RoomKey,
};
pub use keys::server::{
    is_valid_server_key_private, is_valid_server_key_public, verify_data_server_key,
    ServerKeyPair, ServerPublicKey, ServerSecretKey,
};
pub use keys::share::{
    decrypt_data_share_key, encrypt_data_share_key, is_valid_encrypted_data_share_key,
    is_valid_share_key_private, is_valid_share_key_public, is_valid_share_sign_key_private,
    is_valid_share_sign_key_public, verify_data_share_sign_key, ShareKeyPair, SharePublicKey,
    ShareSecretKey, ShareSignKeyPair, ShareSignPublicKey, ShareSignSecretKey,
};

pub use distribution::{
    encrypt_room_key_with_account_keys, DistributedRoomKey, RoomKeyMetadata, RoomKeyRecipient,
    SharedUser, UserEncryptedRoomKey,
};
pub use message::{
    decrypt_message, encrypt_message, is_valid_message, EncryptedMessage, MessageMetadata,
    MessageReply, MessageType, MessageValue, PlainMessage, ServerData, SignedMessage,
    FRESHNESS_WINDOW_MS, MAX_CHANNEL_LEN,
};

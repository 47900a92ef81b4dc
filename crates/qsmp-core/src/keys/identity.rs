//! Identity key: the ML-DSA-65 per-session signing key.
//!
//! Issued under a session UUID and cross-signed by the master key. It signs
//! outgoing messages and room-key distribution metadata.

use zeroize::Zeroizing;

use crate::codec::{is_valid_key_hash, key_hash};
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, KeyKind, SignatureEnvelope, SignerRole,
    Visibility,
};
use crate::error::{Error, Result};
use crate::keys::master::MasterKeyPair;
use crate::keys::{build_key_json, now_ms, random_seed};
use crate::pq::mldsa::{self, MlDsa65};
use crate::session::is_valid_uuid_v7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPublicKey {
    raw: Vec<u8>,
    timestamp: i64,
    session_uuid: String,
}

pub struct IdentitySecretKey {
    raw: Zeroizing<Vec<u8>>,
    timestamp: i64,
    session_uuid: String,
}

pub struct IdentityKeyPair {
    pub public: IdentityPublicKey,
    pub secret: IdentitySecretKey,
}

impl IdentityPublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Identity, Visibility::Public);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(IdentityPublicKey {
            raw,
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Identity, Visibility::Public);
        build_key_json(&shape, &self.raw, Some(self.timestamp), Some(&self.session_uuid)).to_json()
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

impl IdentitySecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Identity, Visibility::Private);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(IdentitySecretKey {
            raw: Zeroizing::new(raw),
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Identity, Visibility::Private);
        build_key_json(&shape, &self.raw, Some(self.timestamp), Some(&self.session_uuid)).to_json()
    }

    pub fn sign(&self, data: &[u8], signer_hash: &str) -> Result<SignatureEnvelope> {
        if !is_valid_key_hash(signer_hash) {
            return Err(Error::input("signer hash is not a 32-byte hash"));
        }
        let sig = mldsa::sign::<MlDsa65>(&self.raw, data)
            .ok_or_else(|| Error::input("identity secret key has the wrong length"))?;
        Ok(SignatureEnvelope::new(
            SignerRole::IdentityKey,
            signer_hash.to_string(),
            &sig,
        ))
    }
}

impl IdentityKeyPair {
    /// Issue a fresh identity key under `session_uuid`, cross-signed by the
    /// master key over the public-key JSON.
    pub fn generate(
        session_uuid: &str,
        master: &MasterKeyPair,
    ) -> Result<(IdentityKeyPair, SignatureEnvelope)> {
        if !is_valid_uuid_v7(session_uuid) {
            return Err(Error::input("sessionUuid is not a UUIDv7"));
        }
        let seed = random_seed();
        let (pk, sk) = mldsa::keypair_from_seed::<MlDsa65>(&seed);
        let timestamp = now_ms();

        let pair = IdentityKeyPair {
            public: IdentityPublicKey {
                raw: pk,
                timestamp,
                session_uuid: session_uuid.to_string(),
            },
            secret: IdentitySecretKey {
                raw: Zeroizing::new(sk),
                timestamp,
                session_uuid: session_uuid.to_string(),
            },
        };
        let master_sign = master.sign(pair.public.to_json()?.as_bytes())?;
        Ok((pair, master_sign))
    }

    pub fn sign(&self, data: &[u8]) -> Result<SignatureEnvelope> {
        self.secret.sign(data, &self.public.hash()?)
    }
}

pub fn verify_identity_key(
    public: &IdentityPublicKey,
    sig: &SignatureEnvelope,
    data: &[u8],
) -> bool {
    let Ok(raw) = sig.validate_for(SignerRole::IdentityKey) else {
        return false;
    };
    mldsa::verify::<MlDsa65>(&public.raw, data, &raw)
}

pub fn is_valid_identity_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Identity, Visibility::Public))
}

pub fn is_valid_identity_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Identity, Visibility::Private))
}

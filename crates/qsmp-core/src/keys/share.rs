//! Share keys: the session-scoped pair used to sync secrets to a user's
//! other devices.
//!
//! `shareKey` is ML-KEM-768 (payload wrapping), `shareSignKey` is ML-DSA-65
//! (authenticating what was shared). Both are issued under a session UUID
//! and cross-signed by the master key.

use pqcrypto_traits::kem::{PublicKey as PublicKeyTrait, SecretKey as SecretKeyTrait};
use zeroize::Zeroizing;

use crate::codec::{is_valid_key_hash, key_hash};
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, EncryptedEnvelope, EnvelopeForm, KeyKind,
    SignatureEnvelope, SignerRole, Visibility,
};
use crate::error::{Error, Result};
use crate::keys::master::MasterKeyPair;
use crate::keys::{build_key_json, now_ms, random_seed};
use crate::pq::mldsa::{self, MlDsa65};
use crate::pq::mlkem;
use crate::seal;
use crate::session::is_valid_uuid_v7;

const WIRE_ROLE: &str = "shareKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePublicKey {
    raw: Vec<u8>,
    timestamp: i64,
    session_uuid: String,
}

pub struct ShareSecretKey {
    raw: Zeroizing<Vec<u8>>,
    timestamp: i64,
    session_uuid: String,
}

pub struct ShareKeyPair {
    pub public: SharePublicKey,
    pub secret: ShareSecretKey,
}

impl SharePublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Share, Visibility::Public);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(SharePublicKey {
            raw,
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Share, Visibility::Public);
        build_key_json(&shape, &self.raw, Some(self.timestamp), Some(&self.session_uuid)).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }
}

impl ShareSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Share, Visibility::Private);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(ShareSecretKey {
            raw: Zeroizing::new(raw),
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Share, Visibility::Private);
        build_key_json(&shape, &self.raw, Some(self.timestamp), Some(&self.session_uuid)).to_json()
    }
}

impl ShareKeyPair {
    pub fn generate(
        session_uuid: &str,
        master: &MasterKeyPair,
    ) -> Result<(ShareKeyPair, SignatureEnvelope)> {
        if !is_valid_uuid_v7(session_uuid) {
            return Err(Error::input("sessionUuid is not a UUIDv7"));
        }
        let (pk, sk) = mlkem::keypair();
        let timestamp = now_ms();

        let pair = ShareKeyPair {
            public: SharePublicKey {
                raw: pk.as_bytes().to_vec(),
                timestamp,
                session_uuid: session_uuid.to_string(),
            },
            secret: ShareSecretKey {
                raw: Zeroizing::new(sk.as_bytes().to_vec()),
                timestamp,
                session_uuid: session_uuid.to_string(),
            },
        };
        let master_sign = master.sign(pair.public.to_json()?.as_bytes())?;
        Ok((pair, master_sign))
    }
}

pub fn encrypt_data_share_key(public: &SharePublicKey, data: &str) -> Result<EncryptedEnvelope> {
    seal::encrypt(WIRE_ROLE, &public.to_json()?, &public.raw, data.as_bytes())
}

pub fn decrypt_data_share_key(
    secret: &ShareSecretKey,
    envelope: &EncryptedEnvelope,
) -> Result<String> {
    let plain = seal::decrypt(envelope, WIRE_ROLE, &secret.raw)?;
    String::from_utf8(plain).map_err(|_| Error::input("decrypted payload is not UTF-8"))
}

pub fn is_valid_share_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Share, Visibility::Public))
}

pub fn is_valid_share_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Share, Visibility::Private))
}

pub fn is_valid_encrypted_data_share_key(s: &str) -> bool {
    EncryptedEnvelope::from_json(s)
        .and_then(|env| env.validate(WIRE_ROLE, EnvelopeForm::Asymmetric).map(|_| ()))
        .is_ok()
}

// --- shareSignKey -----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSignPublicKey {
    raw: Vec<u8>,
    timestamp: i64,
    session_uuid: String,
}

pub struct ShareSignSecretKey {
    raw: Zeroizing<Vec<u8>>,
    timestamp: i64,
    session_uuid: String,
}

pub struct ShareSignKeyPair {
    pub public: ShareSignPublicKey,
    pub secret: ShareSignSecretKey,
}

impl ShareSignPublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::ShareSign, Visibility::Public);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(ShareSignPublicKey {
            raw,
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::ShareSign, Visibility::Public);
        build_key_json(&shape, &self.raw, Some(self.timestamp), Some(&self.session_uuid)).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }
}

impl ShareSignSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::ShareSign, Visibility::Private);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(ShareSignSecretKey {
            raw: Zeroizing::new(raw),
            timestamp: parsed.timestamp.unwrap_or_default(),
            session_uuid: parsed.session_uuid.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::ShareSign, Visibility::Private);
        build_key_json(&shape, &self.raw, Some(self.timestamp), Some(&self.session_uuid)).to_json()
    }

    pub fn sign(&self, data: &[u8], signer_hash: &str) -> Result<SignatureEnvelope> {
        if !is_valid_key_hash(signer_hash) {
            return Err(Error::input("signer hash is not a 32-byte hash"));
        }
        let sig = mldsa::sign::<MlDsa65>(&self.raw, data)
            .ok_or_else(|| Error::input("shareSign secret key has the wrong length"))?;
        Ok(SignatureEnvelope::new(
            SignerRole::ShareSignKey,
            signer_hash.to_string(),
            &sig,
        ))
    }
}

impl ShareSignKeyPair {
    pub fn generate(
        session_uuid: &str,
        master: &MasterKeyPair,
    ) -> Result<(ShareSignKeyPair, SignatureEnvelope)> {
        if !is_valid_uuid_v7(session_uuid) {
            return Err(Error::input("sessionUuid is not a UUIDv7"));
        }
        let seed = random_seed();
        let (pk, sk) = mldsa::keypair_from_seed::<MlDsa65>(&seed);
        let timestamp = now_ms();

        let pair = ShareSignKeyPair {
            public: ShareSignPublicKey {
                raw: pk,
                timestamp,
                session_uuid: session_uuid.to_string(),
            },
            secret: ShareSignSecretKey {
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

pub fn verify_data_share_sign_key(
    public: &ShareSignPublicKey,
    sig: &SignatureEnvelope,
    data: &[u8],
) -> bool {
    let Ok(raw) = sig.validate_for(SignerRole::ShareSignKey) else {
        return false;
    };
    mldsa::verify::<MlDsa65>(&public.raw, data, &raw)
}

pub fn is_valid_share_sign_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::ShareSign, Visibility::Public))
}

pub fn is_valid_share_sign_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::ShareSign, Visibility::Private))
}

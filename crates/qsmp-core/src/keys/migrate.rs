//! Migrate keys: the stand-alone pair used to move an account to a new
//! device before that device has any trusted keys.
//!
//! Same primitives as account/identity but deliberately unbound: no master
//! signature, no timestamp, no session UUID. Trust is bootstrapped out of
//! band. An integer `timestamp` is tolerated on parse for older emitters.

use pqcrypto_traits::kem::{PublicKey as PublicKeyTrait, SecretKey as SecretKeyTrait};
use zeroize::Zeroizing;

use crate::codec::{is_valid_key_hash, key_hash};
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, EncryptedEnvelope, EnvelopeForm, KeyKind,
    SignatureEnvelope, SignerRole, Visibility,
};
use crate::error::{Error, Result};
use crate::keys::{build_key_json, random_seed};
use crate::pq::mldsa::{self, MlDsa65};
use crate::pq::mlkem;
use crate::seal;

const WIRE_ROLE: &str = "migrateKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratePublicKey {
    raw: Vec<u8>,
}

pub struct MigrateSecretKey {
    raw: Zeroizing<Vec<u8>>,
}

pub struct MigrateKeyPair {
    pub public: MigratePublicKey,
    pub secret: MigrateSecretKey,
}

impl MigratePublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Migrate, Visibility::Public);
        let (_, raw) = parse_key_json(s, &shape)?;
        Ok(MigratePublicKey { raw })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Migrate, Visibility::Public);
        build_key_json(&shape, &self.raw, None, None).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }
}

impl MigrateSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Migrate, Visibility::Private);
        let (_, raw) = parse_key_json(s, &shape)?;
        Ok(MigrateSecretKey {
            raw: Zeroizing::new(raw),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Migrate, Visibility::Private);
        build_key_json(&shape, &self.raw, None, None).to_json()
    }
}

impl MigrateKeyPair {
    pub fn generate() -> MigrateKeyPair {
        let (pk, sk) = mlkem::keypair();
        MigrateKeyPair {
            public: MigratePublicKey {
                raw: pk.as_bytes().to_vec(),
            },
            secret: MigrateSecretKey {
                raw: Zeroizing::new(sk.as_bytes().to_vec()),
            },
        }
    }
}

pub fn encrypt_data_migrate_key(
    public: &MigratePublicKey,
    data: &str,
) -> Result<EncryptedEnvelope> {
    seal::encrypt(WIRE_ROLE, &public.to_json()?, &public.raw, data.as_bytes())
}

pub fn decrypt_data_migrate_key(
    secret: &MigrateSecretKey,
    envelope: &EncryptedEnvelope,
) -> Result<String> {
    let plain = seal::decrypt(envelope, WIRE_ROLE, &secret.raw)?;
    String::from_utf8(plain).map_err(|_| Error::input("decrypted payload is not UTF-8"))
}

pub fn is_valid_migrate_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Migrate, Visibility::Public))
}

pub fn is_valid_migrate_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Migrate, Visibility::Private))
}

pub fn is_valid_encrypted_data_migrate_key(s: &str) -> bool {
    EncryptedEnvelope::from_json(s)
        .and_then(|env| env.validate(WIRE_ROLE, EnvelopeForm::Asymmetric).map(|_| ()))
        .is_ok()
}

// --- migrateSignKey ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateSignPublicKey {
    raw: Vec<u8>,
}

pub struct MigrateSignSecretKey {
    raw: Zeroizing<Vec<u8>>,
}

pub struct MigrateSignKeyPair {
    pub public: MigrateSignPublicKey,
    pub secret: MigrateSignSecretKey,
}

impl MigrateSignPublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::MigrateSign, Visibility::Public);
        let (_, raw) = parse_key_json(s, &shape)?;
        Ok(MigrateSignPublicKey { raw })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::MigrateSign, Visibility::Public);
        build_key_json(&shape, &self.raw, None, None).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }
}

impl MigrateSignSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::MigrateSign, Visibility::Private);
        let (_, raw) = parse_key_json(s, &shape)?;
        Ok(MigrateSignSecretKey {
            raw: Zeroizing::new(raw),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::MigrateSign, Visibility::Private);
        build_key_json(&shape, &self.raw, None, None).to_json()
    }

    pub fn sign(&self, data: &[u8], signer_hash: &str) -> Result<SignatureEnvelope> {
        if !is_valid_key_hash(signer_hash) {
            return Err(Error::input("signer hash is not a 32-byte hash"));
        }
        let sig = mldsa::sign::<MlDsa65>(&self.raw, data)
            .ok_or_else(|| Error::input("migrateSign secret key has the wrong length"))?;
        Ok(SignatureEnvelope::new(
            SignerRole::MigrateSignKey,
            signer_hash.to_string(),
            &sig,
        ))
    }
}

impl MigrateSignKeyPair {
    pub fn generate() -> MigrateSignKeyPair {
        let seed = random_seed();
        let (pk, sk) = mldsa::keypair_from_seed::<MlDsa65>(&seed);
        MigrateSignKeyPair {
            public: MigrateSignPublicKey { raw: pk },
            secret: MigrateSignSecretKey {
                raw: Zeroizing::new(sk),
            },
        }
    }

    pub fn sign(&self, data: &[u8]) -> Result<SignatureEnvelope> {
        self.secret.sign(data, &self.public.hash()?)
    }
}

pub fn verify_data_migrate_sign_key(
    public: &MigrateSignPublicKey,
    sig: &SignatureEnvelope,
    data: &[u8],
) -> bool {
    let Ok(raw) = sig.validate_for(SignerRole::MigrateSignKey) else {
        return false;
    };
    mldsa::verify::<MlDsa65>(&public.raw, data, &raw)
}

pub fn is_valid_migrate_sign_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::MigrateSign, Visibility::Public))
}

pub fn is_valid_migrate_sign_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::MigrateSign, Visibility::Private))
}

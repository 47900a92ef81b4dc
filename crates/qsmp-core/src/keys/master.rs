//! Master key: the ML-DSA-87 root of the cross-signing graph.
//!
//! A master key signs every session-scoped subkey at issuance (identity,
//! account, share, shareSign). It carries no timestamp or session binding
//! of its own; its lifetime is the account's.

use zeroize::Zeroizing;

use crate::codec::{is_valid_key_hash, key_hash};
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, KeyKind, SignatureEnvelope, SignerRole,
    Visibility,
};
use crate::error::{Error, Result};
use crate::keys::{build_key_json, random_seed};
use crate::pq::mldsa::{self, MlDsa87};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPublicKey {
    raw: Vec<u8>,
}

pub struct MasterSecretKey {
    raw: Zeroizing<Vec<u8>>,
}

pub struct MasterKeyPair {
    pub public: MasterPublicKey,
    pub secret: MasterSecretKey,
}

impl MasterPublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Master, Visibility::Public);
        let (_, raw) = parse_key_json(s, &shape)?;
        Ok(MasterPublicKey { raw })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Master, Visibility::Public);
        build_key_json(&shape, &self.raw, None, None).to_json()
    }

    /// Hash of the canonical public-key JSON; the signer locator recorded
    /// in every signature this key's secret half produces.
    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl MasterSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Master, Visibility::Private);
        let (_, raw) = parse_key_json(s, &shape)?;
        Ok(MasterSecretKey {
            raw: Zeroizing::new(raw),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Master, Visibility::Private);
        build_key_json(&shape, &self.raw, None, None).to_json()
    }

    /// Sign `data`, recording `signer_hash` (the hash of this key's public
    /// JSON) so verifiers can locate the signer.
    pub fn sign(&self, data: &[u8], signer_hash: &str) -> Result<SignatureEnvelope> {
        if !is_valid_key_hash(signer_hash) {
            return Err(Error::input("signer hash is not a 32-byte hash"));
        }
        let sig = mldsa::sign::<MlDsa87>(&self.raw, data)
            .ok_or_else(|| Error::input("master secret key has the wrong length"))?;
        Ok(SignatureEnvelope::new(
            SignerRole::MasterKey,
            signer_hash.to_string(),
            &sig,
        ))
    }
}

impl MasterKeyPair {
    /// Deterministic generation from a 32-byte seed.
    pub fn generate(seed: &[u8; 32]) -> Self {
        let (pk, sk) = mldsa::keypair_from_seed::<MlDsa87>(seed);
        MasterKeyPair {
            public: MasterPublicKey { raw: pk },
            secret: MasterSecretKey {
                raw: Zeroizing::new(sk),
            },
        }
    }

    /// Generation from a fresh CSPRNG seed.
    pub fn generate_random() -> Self {
        Self::generate(&random_seed())
    }

    pub fn sign(&self, data: &[u8]) -> Result<SignatureEnvelope> {
        self.secret.sign(data, &self.public.hash()?)
    }
}

/// `true` iff `sig` is a well-formed master-key signature envelope and the
/// ML-DSA-87 signature verifies over `data`.
pub fn verify_master_key(public: &MasterPublicKey, sig: &SignatureEnvelope, data: &[u8]) -> bool {
    let Ok(raw) = sig.validate_for(SignerRole::MasterKey) else {
        return false;
    };
    mldsa::verify::<MlDsa87>(&public.raw, data, &raw)
}

pub fn is_valid_master_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Master, Visibility::Public))
}

pub fn is_valid_master_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Master, Visibility::Private))
}

//! Server key: the ML-DSA-65 key a homeserver uses to sign its assertions
//! (membership lists, relayed metadata). Not part of the user cross-signing
//! graph; clients pin it out of band.

use zeroize::Zeroizing;

use crate::codec::{is_valid_key_hash, key_hash};
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, KeyKind, SignatureEnvelope, SignerRole,
    Visibility,
};
use crate::error::{Error, Result};
use crate::keys::{build_key_json, now_ms, random_seed};
use crate::pq::mldsa::{self, MlDsa65};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPublicKey {
    raw: Vec<u8>,
    timestamp: i64,
}

pub struct ServerSecretKey {
    raw: Zeroizing<Vec<u8>>,
    timestamp: i64,
}

pub struct ServerKeyPair {
    pub public: ServerPublicKey,
    pub secret: ServerSecretKey,
}

impl ServerPublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Server, Visibility::Public);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(ServerPublicKey {
            raw,
            timestamp: parsed.timestamp.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Server, Visibility::Public);
        build_key_json(&shape, &self.raw, Some(self.timestamp), None).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl ServerSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Server, Visibility::Private);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(ServerSecretKey {
            raw: Zeroizing::new(raw),
            timestamp: parsed.timestamp.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Server, Visibility::Private);
        build_key_json(&shape, &self.raw, Some(self.timestamp), None).to_json()
    }

    pub fn sign(&self, data: &[u8], signer_hash: &str) -> Result<SignatureEnvelope> {
        if !is_valid_key_hash(signer_hash) {
            return Err(Error::input("signer hash is not a 32-byte hash"));
        }
        let sig = mldsa::sign::<MlDsa65>(&self.raw, data)
            .ok_or_else(|| Error::input("server secret key has the wrong length"))?;
        Ok(SignatureEnvelope::new(
            SignerRole::ServerKey,
            signer_hash.to_string(),
            &sig,
        ))
    }
}

impl ServerKeyPair {
    pub fn generate() -> ServerKeyPair {
        let seed = random_seed();
        let (pk, sk) = mldsa::keypair_from_seed::<MlDsa65>(&seed);
        let timestamp = now_ms();
        ServerKeyPair {
            public: ServerPublicKey {
                raw: pk,
                timestamp,
            },
            secret: ServerSecretKey {
                raw: Zeroizing::new(sk),
                timestamp,
            },
        }
    }

    pub fn sign(&self, data: &[u8]) -> Result<SignatureEnvelope> {
        self.secret.sign(data, &self.public.hash()?)
    }
}

pub fn verify_data_server_key(
    public: &ServerPublicKey,
    sig: &SignatureEnvelope,
    data: &[u8],
) -> bool {
    let Ok(raw) = sig.validate_for(SignerRole::ServerKey) else {
        return false;
    };
    mldsa::verify::<MlDsa65>(&public.raw, data, &raw)
}

pub fn is_valid_server_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Server, Visibility::Public))
}

pub fn is_valid_server_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Server, Visibility::Private))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let server = ServerKeyPair::generate();
        let sig = server.sign(b"membership assertion").unwrap();
        assert_eq!(sig.key_type, "serverKey");
        assert_eq!(sig.algorithm, "ML-DSA-65");
        assert!(verify_data_server_key(&server.public, &sig, b"membership assertion"));
        assert!(!verify_data_server_key(&server.public, &sig, b"forged assertion"));
    }

    #[test]
    fn json_roundtrip() {
        let server = ServerKeyPair::generate();
        let pub_json = server.public.to_json().unwrap();
        assert!(is_valid_server_key_public(&pub_json));
        assert!(!pub_json.contains("algorithm"));
        assert!(pub_json.contains("timestamp"));

        let back = ServerPublicKey::from_json(&pub_json).unwrap();
        assert_eq!(back, server.public);

        let priv_json = server.secret.to_json().unwrap();
        assert!(is_valid_server_key_private(&priv_json));
        let secret = ServerSecretKey::from_json(&priv_json).unwrap();
        let sig = secret.sign(b"x", &server.public.hash().unwrap()).unwrap();
        assert!(verify_data_server_key(&server.public, &sig, b"x"));
    }
}

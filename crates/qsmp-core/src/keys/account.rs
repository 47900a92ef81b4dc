//! Account key: the ML-KEM-768 encryption key other users address.
//!
//! Cross-signed by the master key. Room keys are wrapped to each member's
//! account key during distribution.

use pqcrypto_traits::kem::{PublicKey as PublicKeyTrait, SecretKey as SecretKeyTrait};
use zeroize::Zeroizing;

use crate::codec::key_hash;
use crate::envelope::{
    key_json_matches, key_shape, EncryptedEnvelope, EnvelopeForm, KeyKind, SignatureEnvelope,
    Visibility, parse_key_json,
};
use crate::error::{Error, Result};
use crate::keys::master::MasterKeyPair;
use crate::keys::{build_key_json, now_ms};
use crate::pq::mlkem;
use crate::seal;

const WIRE_ROLE: &str = "accountKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPublicKey {
    raw: Vec<u8>,
    timestamp: i64,
}

pub struct AccountSecretKey {
    raw: Zeroizing<Vec<u8>>,
    timestamp: i64,
}

pub struct AccountKeyPair {
    pub public: AccountPublicKey,
    pub secret: AccountSecretKey,
}

impl AccountPublicKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Account, Visibility::Public);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(AccountPublicKey {
            raw,
            timestamp: parsed.timestamp.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Account, Visibility::Public);
        build_key_json(&shape, &self.raw, Some(self.timestamp), None).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl AccountSecretKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Account, Visibility::Private);
        let (parsed, raw) = parse_key_json(s, &shape)?;
        Ok(AccountSecretKey {
            raw: Zeroizing::new(raw),
            timestamp: parsed.timestamp.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Account, Visibility::Private);
        build_key_json(&shape, &self.raw, Some(self.timestamp), None).to_json()
    }
}

impl AccountKeyPair {
    /// Issue a fresh account key, cross-signed by the master key over the
    /// public-key JSON.
    pub fn generate(master: &MasterKeyPair) -> Result<(AccountKeyPair, SignatureEnvelope)> {
        let (pk, sk) = mlkem::keypair();
        let timestamp = now_ms();

        let pair = AccountKeyPair {
            public: AccountPublicKey {
                raw: pk.as_bytes().to_vec(),
                timestamp,
            },
            secret: AccountSecretKey {
                raw: Zeroizing::new(sk.as_bytes().to_vec()),
                timestamp,
            },
        };
        let master_sign = master.sign(pair.public.to_json()?.as_bytes())?;
        Ok((pair, master_sign))
    }
}

/// KEM-wrap `data` to an account key (§4.5 envelope, `keyType:"accountKey"`).
pub fn encrypt_data_account_key(
    public: &AccountPublicKey,
    data: &str,
) -> Result<EncryptedEnvelope> {
    seal::encrypt(WIRE_ROLE, &public.to_json()?, &public.raw, data.as_bytes())
}

pub fn decrypt_data_account_key(
    secret: &AccountSecretKey,
    envelope: &EncryptedEnvelope,
) -> Result<String> {
    let plain = seal::decrypt(envelope, WIRE_ROLE, &secret.raw)?;
    String::from_utf8(plain).map_err(|_| Error::input("decrypted payload is not UTF-8"))
}

pub fn is_valid_account_key_public(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Account, Visibility::Public))
}

pub fn is_valid_account_key_private(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Account, Visibility::Private))
}

pub fn is_valid_encrypted_data_account_key(s: &str) -> bool {
    EncryptedEnvelope::from_json(s)
        .and_then(|env| env.validate(WIRE_ROLE, EnvelopeForm::Asymmetric).map(|_| ()))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::master::verify_master_key;

    #[test]
    fn generate_is_master_signed() {
        let master = MasterKeyPair::generate_random();
        let (account, sign) = AccountKeyPair::generate(&master).unwrap();
        let pub_json = account.public.to_json().unwrap();
        assert!(verify_master_key(&master.public, &sign, pub_json.as_bytes()));
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let master = MasterKeyPair::generate_random();
        let (account, _) = AccountKeyPair::generate(&master).unwrap();

        let env = encrypt_data_account_key(&account.public, "compatibility-test").unwrap();
        assert_eq!(env.key_type, "accountKey");
        assert_eq!(env.key_hash, account.public.hash().unwrap());
        assert!(is_valid_encrypted_data_account_key(&env.to_json().unwrap()));

        let plain = decrypt_data_account_key(&account.secret, &env).unwrap();
        assert_eq!(plain, "compatibility-test");
    }

    #[test]
    fn decrypt_rejects_foreign_envelope_role() {
        let master = MasterKeyPair::generate_random();
        let (account, _) = AccountKeyPair::generate(&master).unwrap();
        let mut env = encrypt_data_account_key(&account.public, "x").unwrap();
        env.key_type = "shareKey".into();
        assert!(decrypt_data_account_key(&account.secret, &env).is_err());
    }

    #[test]
    fn json_roundtrip() {
        let master = MasterKeyPair::generate_random();
        let (account, _) = AccountKeyPair::generate(&master).unwrap();

        let pub_json = account.public.to_json().unwrap();
        let priv_json = account.secret.to_json().unwrap();
        assert!(is_valid_account_key_public(&pub_json));
        assert!(is_valid_account_key_private(&priv_json));

        let public = AccountPublicKey::from_json(&pub_json).unwrap();
        let secret = AccountSecretKey::from_json(&priv_json).unwrap();
        let env = encrypt_data_account_key(&public, "after reparse").unwrap();
        assert_eq!(decrypt_data_account_key(&secret, &env).unwrap(), "after reparse");
    }
}

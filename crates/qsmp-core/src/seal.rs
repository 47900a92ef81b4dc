//! The two encryption paths every key kind shares: ML-KEM-768 + AES-256-GCM
//! for asymmetric recipients, and bare AES-256-GCM for symmetric keys.
//!
//! Factored once; the per-kind modules only supply the `keyType` literal,
//! the recipient JSON (for the hash binding) and the raw key material.

use pqcrypto_traits::kem::{
    Ciphertext as CiphertextTrait, PublicKey as PublicKeyTrait, SecretKey as SecretKeyTrait,
    SharedSecret as SharedSecretTrait,
};
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::{b64_encode, key_hash};
use crate::envelope::{EncryptedEnvelope, EnvelopeForm, ALG_AES_GCM};
use crate::error::{Error, Result};
use crate::pq::{aes, mlkem};

fn random_iv() -> [u8; 12] {
    let mut iv = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// KEM-wrap `plaintext` to one recipient public key (§4.5 path).
///
/// `recipient_json` is the recipient's full public-key JSON; its hash is
/// what ties the envelope to that key on the wire.
pub(crate) fn encrypt(
    key_type: &'static str,
    recipient_json: &str,
    recipient_pk: &[u8],
    plaintext: &[u8],
) -> Result<EncryptedEnvelope> {
    let pk = mlkem::PublicKey::from_bytes(recipient_pk)
        .map_err(|_| Error::input("recipient key is not an ML-KEM-768 public key"))?;
    let (ss, ct) = mlkem::encapsulate(&pk);
    let shared: Zeroizing<[u8; 32]> = Zeroizing::new(
        ss.as_bytes()
            .try_into()
            .map_err(|_| Error::Auth("encapsulation yielded a malformed shared secret"))?,
    );

    let iv = random_iv();
    let enc = aes::encrypt(&shared, &iv, plaintext)
        .ok_or(Error::Auth("AEAD encryption failed"))?;

    Ok(EncryptedEnvelope {
        key_type: key_type.to_string(),
        key_hash: key_hash(recipient_json),
        encrypted_data: b64_encode(&enc),
        iv: b64_encode(&iv),
        cipher_text: Some(b64_encode(ct.as_bytes())),
        algorithm: ALG_AES_GCM.to_string(),
    })
}

/// Inverse of [`encrypt`]. Validates the envelope first; any tag or
/// decapsulation failure rejects without partial output.
pub(crate) fn decrypt(
    envelope: &EncryptedEnvelope,
    expected_key_type: &str,
    recipient_sk: &[u8],
) -> Result<Vec<u8>> {
    let decoded = envelope.validate(expected_key_type, EnvelopeForm::Asymmetric)?;
    let ct_raw = decoded
        .cipher_text
        .ok_or_else(|| Error::input("envelope is missing cipherText"))?;

    let sk = mlkem::SecretKey::from_bytes(recipient_sk)
        .map_err(|_| Error::input("recipient key is not an ML-KEM-768 secret key"))?;
    let ct = mlkem::Ciphertext::from_bytes(&ct_raw)
        .map_err(|_| Error::input("cipherText is not an ML-KEM-768 ciphertext"))?;
    let ss = mlkem::decapsulate(&ct, &sk);
    let shared: Zeroizing<[u8; 32]> = Zeroizing::new(
        ss.as_bytes()
            .try_into()
            .map_err(|_| Error::Auth("decapsulation yielded a malformed shared secret"))?,
    );

    aes::decrypt(&shared, &decoded.iv, &decoded.encrypted_data).ok_or_else(|| {
        debug!(key_type = expected_key_type, "AEAD tag verification failed");
        Error::Auth("AEAD tag verification failed")
    })
}

/// AEAD under an already-shared 32-byte key (§4.6 path, room/device).
pub(crate) fn encrypt_with_symmetric_key(
    key_type: &'static str,
    key_json: &str,
    key: &[u8; 32],
    plaintext: &[u8],
) -> Result<EncryptedEnvelope> {
    let iv = random_iv();
    let enc =
        aes::encrypt(key, &iv, plaintext).ok_or(Error::Auth("AEAD encryption failed"))?;

    Ok(EncryptedEnvelope {
        key_type: key_type.to_string(),
        key_hash: key_hash(key_json),
        encrypted_data: b64_encode(&enc),
        iv: b64_encode(&iv),
        cipher_text: None,
        algorithm: ALG_AES_GCM.to_string(),
    })
}

pub(crate) fn decrypt_with_symmetric_key(
    envelope: &EncryptedEnvelope,
    expected_key_type: &str,
    key: &[u8; 32],
) -> Result<Vec<u8>> {
    let decoded = envelope.validate(expected_key_type, EnvelopeForm::Symmetric)?;
    aes::decrypt(key, &decoded.iv, &decoded.encrypted_data).ok_or_else(|| {
        debug!(key_type = expected_key_type, "AEAD tag verification failed");
        Error::Auth("AEAD tag verification failed")
    })
}

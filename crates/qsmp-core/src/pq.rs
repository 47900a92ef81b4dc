//! Thin wrappers over the FIPS 203/204 primitives and AES-256-GCM.
//!
//! Everything above this module speaks raw byte slices and the envelope
//! types; nothing above it touches the primitive crates directly.

/// ML-KEM-768 (FIPS 203).
pub mod mlkem {
    pub use pqcrypto_mlkem::mlkem768::{
        decapsulate, encapsulate, keypair, Ciphertext, PublicKey, SecretKey, SharedSecret,
    };

    pub const PUBLIC_KEY_SIZE: usize = 1184;
    pub const SECRET_KEY_SIZE: usize = 2400;
    pub const CIPHERTEXT_SIZE: usize = 1088;
    pub const SHARED_SECRET_SIZE: usize = 32;
}

/// ML-DSA-65 / ML-DSA-87 (FIPS 204).
///
/// Wire private keys are the expanded `skEncode` form (4032 / 4896 bytes),
/// not the 32-byte seed; the seed is consumed at generation time only.
pub mod mldsa {
    use ml_dsa::{
        B32, EncodedSignature, EncodedVerifyingKey, ExpandedSigningKey, ExpandedSigningKeyBytes,
        MlDsaParams, Signature, SigningKey, VerifyingKey,
    };

    pub use ml_dsa::{MlDsa65, MlDsa87};

    pub const SEED_SIZE: usize = 32;

    pub const MLDSA65_PUBLIC_KEY_SIZE: usize = 1952;
    pub const MLDSA65_SECRET_KEY_SIZE: usize = 4032;
    pub const MLDSA65_SIGNATURE_SIZE: usize = 3309;

    pub const MLDSA87_PUBLIC_KEY_SIZE: usize = 2592;
    pub const MLDSA87_SECRET_KEY_SIZE: usize = 4896;
    pub const MLDSA87_SIGNATURE_SIZE: usize = 4627;

    /// Deterministic keygen from a 32-byte seed (FIPS 204 ML-DSA.KeyGen_internal).
    /// Returns `(public, secret)` in their encoded wire forms.
    pub fn keypair_from_seed<P: MlDsaParams>(seed: &[u8; 32]) -> (Vec<u8>, Vec<u8>) {
        let ssk = SigningKey::<P>::from_seed(&B32::from(*seed));
        let esk = ssk.expanded_key();
        let vk = esk.verifying_key();
        let pk = vk.encode();
        #[allow(deprecated)]
        let sk = esk.to_expanded();
        (
            AsRef::<[u8]>::as_ref(&pk).to_vec(),
            AsRef::<[u8]>::as_ref(&sk).to_vec(),
        )
    }

    /// Deterministic signing with an empty context string.
    /// `None` if the encoded secret key has the wrong length.
    pub fn sign<P: MlDsaParams>(sk_bytes: &[u8], msg: &[u8]) -> Option<Vec<u8>> {
        let enc = ExpandedSigningKeyBytes::<P>::try_from(sk_bytes).ok()?;
        #[allow(deprecated)]
        let sk = ExpandedSigningKey::<P>::from_expanded(&enc);
        let sig = sk.sign_deterministic(msg, &[]).ok()?;
        Some(AsRef::<[u8]>::as_ref(&sig.encode()).to_vec())
    }

    /// `false` on any malformed input as well as on a bad signature.
    pub fn verify<P: MlDsaParams>(pk_bytes: &[u8], msg: &[u8], sig_bytes: &[u8]) -> bool {
        let Ok(pk_enc) = EncodedVerifyingKey::<P>::try_from(pk_bytes) else {
            return false;
        };
        let Ok(sig_enc) = EncodedSignature::<P>::try_from(sig_bytes) else {
            return false;
        };
        let Some(sig) = Signature::<P>::decode(&sig_enc) else {
            return false;
        };
        let vk = VerifyingKey::<P>::decode(&pk_enc);
        vk.verify_with_context(msg, &[], &sig)
    }
}

/// AES-256-GCM with a 12-byte IV and the 16-byte tag appended. No AAD.
pub mod aes {
    use aead::{Aead, KeyInit};
    use aes_gcm::{Aes256Gcm, Nonce};

    pub const KEY_SIZE: usize = 32;
    pub const IV_SIZE: usize = 12;
    pub const TAG_SIZE: usize = 16;

    pub fn encrypt(key: &[u8; 32], iv: &[u8; 12], plaintext: &[u8]) -> Option<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key).ok()?;
        cipher.encrypt(Nonce::from_slice(iv), plaintext).ok()
    }

    pub fn decrypt(key: &[u8; 32], iv: &[u8; 12], ciphertext: &[u8]) -> Option<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key).ok()?;
        cipher.decrypt(Nonce::from_slice(iv), ciphertext).ok()
    }
}

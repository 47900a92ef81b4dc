//! On-the-wire JSON shapes: key JSON, signature envelopes, encrypted
//! envelopes, and their structural validators.
//!
//! Field declaration order here IS the canonical serialization order; the
//! key-hash binding (`codec::key_hash`) operates on these exact strings, so
//! reordering a field is a wire-format break. Parsers accept any field
//! order but reject unknown fields.

use serde::{Deserialize, Serialize};

use crate::codec::{b64_decode, is_valid_key_hash};
use crate::error::{Error, Result};
use crate::pq::{aes, mldsa, mlkem};
use crate::session::is_valid_uuid_v7;

pub(crate) const ALG_ML_DSA_65: &str = "ML-DSA-65";
pub(crate) const ALG_ML_DSA_87: &str = "ML-DSA-87";
pub(crate) const ALG_ML_KEM_768: &str = "ML-KEM-768";
pub(crate) const ALG_AES_GCM: &str = "AES-GCM";

/// Signature scheme named by a signature envelope's `algorithm` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigAlgorithm {
    MlDsa65,
    MlDsa87,
}

impl SigAlgorithm {
    pub fn wire_name(self) -> &'static str {
        match self {
            SigAlgorithm::MlDsa65 => ALG_ML_DSA_65,
            SigAlgorithm::MlDsa87 => ALG_ML_DSA_87,
        }
    }

    pub fn signature_size(self) -> usize {
        match self {
            SigAlgorithm::MlDsa65 => mldsa::MLDSA65_SIGNATURE_SIZE,
            SigAlgorithm::MlDsa87 => mldsa::MLDSA87_SIGNATURE_SIZE,
        }
    }
}

/// Logical signer role recorded in a signature envelope's `keyType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerRole {
    MasterKey,
    IdentityKey,
    ShareSignKey,
    MigrateSignKey,
    ServerKey,
}

impl SignerRole {
    pub fn wire_name(self) -> &'static str {
        match self {
            SignerRole::MasterKey => "masterKey",
            SignerRole::IdentityKey => "identityKey",
            SignerRole::ShareSignKey => "shareSignKey",
            SignerRole::MigrateSignKey => "migrateSignKey",
            SignerRole::ServerKey => "serverKey",
        }
    }

    /// Master keys sign with ML-DSA-87; every other role signs with ML-DSA-65.
    pub fn algorithm(self) -> SigAlgorithm {
        match self {
            SignerRole::MasterKey => SigAlgorithm::MlDsa87,
            _ => SigAlgorithm::MlDsa65,
        }
    }
}

/// Detached signature envelope.
///
/// `key_hash` is the hash of the signer's public-key JSON, which is how a
/// verifier locates the right key without trusting the envelope itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureEnvelope {
    #[serde(rename = "keyType")]
    pub key_type: String,
    #[serde(rename = "keyHash")]
    pub key_hash: String,
    pub signature: String,
    pub algorithm: String,
}

impl SignatureEnvelope {
    pub(crate) fn new(role: SignerRole, key_hash: String, signature: &[u8]) -> Self {
        SignatureEnvelope {
            key_type: role.wire_name().to_string(),
            key_hash,
            signature: crate::codec::b64_encode(signature),
            algorithm: role.algorithm().wire_name().to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::input(format!("serialize signature: {e}")))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::input(format!("parse signature: {e}")))
    }

    /// Structural check against the expected signer role; returns the raw
    /// signature bytes.
    pub(crate) fn validate_for(&self, role: SignerRole) -> Result<Vec<u8>> {
        if self.key_type != role.wire_name() {
            return Err(Error::input(format!(
                "signature keyType {:?} does not name a {}",
                self.key_type,
                role.wire_name()
            )));
        }
        if self.algorithm != role.algorithm().wire_name() {
            return Err(Error::input(format!(
                "signature algorithm {:?}, expected {}",
                self.algorithm,
                role.algorithm().wire_name()
            )));
        }
        if !is_valid_key_hash(&self.key_hash) {
            return Err(Error::input("signature keyHash is not a 32-byte hash"));
        }
        let raw = b64_decode(&self.signature)
            .ok_or_else(|| Error::input("signature field is not base64"))?;
        if raw.len() != role.algorithm().signature_size() {
            return Err(Error::input(format!(
                "signature is {} bytes, expected {}",
                raw.len(),
                role.algorithm().signature_size()
            )));
        }
        Ok(raw)
    }

    pub fn is_valid_for(&self, role: SignerRole) -> bool {
        self.validate_for(role).is_ok()
    }
}

/// Whether an encrypted envelope carries a KEM ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnvelopeForm {
    /// KEM+AEAD: `cipherText` required (ML-KEM-768 ciphertext).
    Asymmetric,
    /// AEAD under a shared symmetric key: `cipherText` forbidden.
    Symmetric,
}

/// AEAD payload envelope, in both the KEM-wrapped and symmetric forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedEnvelope {
    #[serde(rename = "keyType")]
    pub key_type: String,
    #[serde(rename = "keyHash")]
    pub key_hash: String,
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,
    pub iv: String,
    #[serde(rename = "cipherText", skip_serializing_if = "Option::is_none")]
    pub cipher_text: Option<String>,
    pub algorithm: String,
}

/// Decoded binary fields of a validated [`EncryptedEnvelope`].
pub(crate) struct DecodedEnvelope {
    pub encrypted_data: Vec<u8>,
    pub iv: [u8; 12],
    pub cipher_text: Option<Vec<u8>>,
}

impl EncryptedEnvelope {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::input(format!("serialize envelope: {e}")))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::input(format!("parse envelope: {e}")))
    }

    pub(crate) fn validate(
        &self,
        expected_key_type: &str,
        form: EnvelopeForm,
    ) -> Result<DecodedEnvelope> {
        if self.key_type != expected_key_type {
            return Err(Error::input(format!(
                "envelope keyType {:?}, expected {expected_key_type:?}",
                self.key_type
            )));
        }
        if self.algorithm != ALG_AES_GCM {
            return Err(Error::input(format!(
                "envelope algorithm {:?}, expected {ALG_AES_GCM:?}",
                self.algorithm
            )));
        }
        if !is_valid_key_hash(&self.key_hash) {
            return Err(Error::input("envelope keyHash is not a 32-byte hash"));
        }

        let iv_raw =
            b64_decode(&self.iv).ok_or_else(|| Error::input("envelope iv is not base64"))?;
        let iv: [u8; 12] = iv_raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::input(format!("iv is {} bytes, expected 12", iv_raw.len())))?;

        let encrypted_data = b64_decode(&self.encrypted_data)
            .ok_or_else(|| Error::input("encryptedData is not base64"))?;
        if encrypted_data.len() < aes::TAG_SIZE {
            return Err(Error::input("encryptedData shorter than a GCM tag"));
        }

        let cipher_text = match (form, &self.cipher_text) {
            (EnvelopeForm::Asymmetric, Some(ct)) => {
                let raw = b64_decode(ct)
                    .ok_or_else(|| Error::input("cipherText is not base64"))?;
                if raw.len() != mlkem::CIPHERTEXT_SIZE {
                    return Err(Error::input(format!(
                        "cipherText is {} bytes, expected {}",
                        raw.len(),
                        mlkem::CIPHERTEXT_SIZE
                    )));
                }
                Some(raw)
            }
            (EnvelopeForm::Asymmetric, None) => {
                return Err(Error::input("envelope is missing cipherText"));
            }
            (EnvelopeForm::Symmetric, Some(_)) => {
                return Err(Error::input("symmetric envelope must not carry cipherText"));
            }
            (EnvelopeForm::Symmetric, None) => None,
        };

        Ok(DecodedEnvelope {
            encrypted_data,
            iv,
            cipher_text,
        })
    }
}

/// Which key classes exist. `Visibility` distinguishes the two wire halves
/// of the asymmetric kinds; the symmetric kinds (room, device) have a
/// single form addressed as `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Master,
    Identity,
    Account,
    Room,
    Share,
    ShareSign,
    Migrate,
    MigrateSign,
    Device,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimestampRule {
    Required,
    Optional,
    Forbidden,
}

/// Structural profile of one key kind's wire JSON.
pub(crate) struct KeyShape {
    pub key_type: &'static str,
    pub algorithm: Option<&'static str>,
    pub raw_len: usize,
    pub timestamp: TimestampRule,
    pub session_uuid: bool,
}

pub(crate) fn key_shape(kind: KeyKind, vis: Visibility) -> KeyShape {
    use TimestampRule::{Forbidden, Optional, Required};
    let public = vis == Visibility::Public;
    match kind {
        KeyKind::Master => KeyShape {
            key_type: if public { "masterKeyPublic" } else { "masterKeyPrivate" },
            algorithm: None,
            raw_len: if public {
                mldsa::MLDSA87_PUBLIC_KEY_SIZE
            } else {
                mldsa::MLDSA87_SECRET_KEY_SIZE
            },
            timestamp: Forbidden,
            session_uuid: false,
        },
        KeyKind::Identity => KeyShape {
            key_type: if public { "identityKeyPublic" } else { "identityKeyPrivate" },
            algorithm: Some(ALG_ML_DSA_65),
            raw_len: if public {
                mldsa::MLDSA65_PUBLIC_KEY_SIZE
            } else {
                mldsa::MLDSA65_SECRET_KEY_SIZE
            },
            timestamp: Required,
            session_uuid: true,
        },
        KeyKind::Account => KeyShape {
            key_type: if public { "accountKeyPublic" } else { "accountKeyPrivate" },
            algorithm: Some(ALG_ML_KEM_768),
            raw_len: if public {
                mlkem::PUBLIC_KEY_SIZE
            } else {
                mlkem::SECRET_KEY_SIZE
            },
            timestamp: Required,
            session_uuid: false,
        },
        KeyKind::Room => KeyShape {
            key_type: "roomKey",
            algorithm: Some(ALG_AES_GCM),
            raw_len: aes::KEY_SIZE,
            timestamp: Required,
            session_uuid: true,
        },
        KeyKind::Share => KeyShape {
            key_type: if public { "shareKeyPublic" } else { "shareKeyPrivate" },
            algorithm: Some(ALG_ML_KEM_768),
            raw_len: if public {
                mlkem::PUBLIC_KEY_SIZE
            } else {
                mlkem::SECRET_KEY_SIZE
            },
            timestamp: Required,
            session_uuid: true,
        },
        KeyKind::ShareSign => KeyShape {
            key_type: if public { "shareSignKeyPublic" } else { "shareSignKeyPrivate" },
            algorithm: Some(ALG_ML_DSA_65),
            raw_len: if public {
                mldsa::MLDSA65_PUBLIC_KEY_SIZE
            } else {
                mldsa::MLDSA65_SECRET_KEY_SIZE
            },
            timestamp: Required,
            session_uuid: true,
        },
        KeyKind::Migrate => KeyShape {
            key_type: if public { "migrateKeyPublic" } else { "migrateKeyPrivate" },
            algorithm: None,
            raw_len: if public {
                mlkem::PUBLIC_KEY_SIZE
            } else {
                mlkem::SECRET_KEY_SIZE
            },
            timestamp: Optional,
            session_uuid: false,
        },
        KeyKind::MigrateSign => KeyShape {
            key_type: if public { "migrateSignKeyPublic" } else { "migrateSignKeyPrivate" },
            algorithm: None,
            raw_len: if public {
                mldsa::MLDSA65_PUBLIC_KEY_SIZE
            } else {
                mldsa::MLDSA65_SECRET_KEY_SIZE
            },
            timestamp: Optional,
            session_uuid: false,
        },
        KeyKind::Device => KeyShape {
            key_type: "deviceKey",
            algorithm: None,
            raw_len: aes::KEY_SIZE,
            timestamp: Forbidden,
            session_uuid: false,
        },
        KeyKind::Server => KeyShape {
            key_type: if public { "serverKeyPublic" } else { "serverKeyPrivate" },
            algorithm: None,
            raw_len: if public {
                mldsa::MLDSA65_PUBLIC_KEY_SIZE
            } else {
                mldsa::MLDSA65_SECRET_KEY_SIZE
            },
            timestamp: Required,
            session_uuid: false,
        },
    }
}

/// One key's wire JSON. A single struct covers every kind; the per-kind
/// field policy lives in [`KeyShape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyJson {
    #[serde(rename = "keyType")]
    pub key_type: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "sessionUuid", skip_serializing_if = "Option::is_none")]
    pub session_uuid: Option<String>,
}

impl KeyJson {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::input(format!("serialize key: {e}")))
    }
}

/// Parse + structurally validate one key JSON string against a shape.
/// Returns the parsed fields and the decoded raw key bytes.
pub(crate) fn parse_key_json(s: &str, shape: &KeyShape) -> Result<(KeyJson, Vec<u8>)> {
    let parsed: KeyJson =
        serde_json::from_str(s).map_err(|e| Error::input(format!("parse key: {e}")))?;

    if parsed.key_type != shape.key_type {
        return Err(Error::input(format!(
            "keyType {:?}, expected {:?}",
            parsed.key_type, shape.key_type
        )));
    }
    match (shape.algorithm, parsed.algorithm.as_deref()) {
        (Some(want), Some(got)) if want == got => {}
        (None, None) => {}
        (want, got) => {
            return Err(Error::input(format!(
                "algorithm {got:?}, expected {want:?}"
            )));
        }
    }
    match (shape.timestamp, parsed.timestamp) {
        (TimestampRule::Required, None) => {
            return Err(Error::input("missing timestamp"));
        }
        (TimestampRule::Forbidden, Some(_)) => {
            return Err(Error::input("unexpected timestamp"));
        }
        _ => {}
    }
    match (shape.session_uuid, parsed.session_uuid.as_deref()) {
        (true, Some(uuid)) if is_valid_uuid_v7(uuid) => {}
        (true, Some(_)) => return Err(Error::input("sessionUuid is not a UUIDv7")),
        (true, None) => return Err(Error::input("missing sessionUuid")),
        (false, Some(_)) => return Err(Error::input("unexpected sessionUuid")),
        (false, None) => {}
    }

    let raw = b64_decode(&parsed.key).ok_or_else(|| Error::input("key is not base64"))?;
    if raw.len() != shape.raw_len {
        return Err(Error::input(format!(
            "key is {} bytes, expected {}",
            raw.len(),
            shape.raw_len
        )));
    }
    Ok((parsed, raw))
}

/// `bool`-total form of [`parse_key_json`] for the validation surface.
pub(crate) fn key_json_matches(s: &str, shape: &KeyShape) -> bool {
    parse_key_json(s, shape).is_ok()
}

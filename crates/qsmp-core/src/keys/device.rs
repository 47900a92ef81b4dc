//! Device key: the 32-byte AES-256-GCM key local to one device.
//!
//! Encrypts material at rest on that device (key backups, drafts). Never
//! leaves the device, so it carries no timestamp or session binding.

use rand::RngCore;
use zeroize::Zeroizing;

use crate::codec::key_hash;
use crate::envelope::{
    key_json_matches, key_shape, parse_key_json, EncryptedEnvelope, EnvelopeForm, KeyKind,
    Visibility,
};
use crate::error::{Error, Result};
use crate::keys::build_key_json;
use crate::seal;

const WIRE_ROLE: &str = "deviceKey";

pub struct DeviceKey {
    key: Zeroizing<[u8; 32]>,
}

impl DeviceKey {
    pub fn generate() -> DeviceKey {
        let mut key = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(&mut *key);
        DeviceKey { key }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let shape = key_shape(KeyKind::Device, Visibility::Public);
        let (_, raw) = parse_key_json(s, &shape)?;
        let key: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::input("device key is not 32 bytes"))?;
        Ok(DeviceKey {
            key: Zeroizing::new(key),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let shape = key_shape(KeyKind::Device, Visibility::Public);
        build_key_json(&shape, self.key.as_slice(), None, None).to_json()
    }

    pub fn hash(&self) -> Result<String> {
        Ok(key_hash(&self.to_json()?))
    }
}

pub fn encrypt_data_device_key(device_key: &DeviceKey, data: &str) -> Result<EncryptedEnvelope> {
    seal::encrypt_with_symmetric_key(
        WIRE_ROLE,
        &device_key.to_json()?,
        &device_key.key,
        data.as_bytes(),
    )
}

pub fn decrypt_data_device_key(
    device_key: &DeviceKey,
    envelope: &EncryptedEnvelope,
) -> Result<String> {
    let plain = seal::decrypt_with_symmetric_key(envelope, WIRE_ROLE, &device_key.key)?;
    String::from_utf8(plain).map_err(|_| Error::input("decrypted payload is not UTF-8"))
}

pub fn is_valid_device_key(s: &str) -> bool {
    key_json_matches(s, &key_shape(KeyKind::Device, Visibility::Public))
}

pub fn is_valid_encrypted_data_device_key(s: &str) -> bool {
    EncryptedEnvelope::from_json(s)
        .and_then(|env| env.validate(WIRE_ROLE, EnvelopeForm::Symmetric).map(|_| ()))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let device = DeviceKey::generate();
        let env = encrypt_data_device_key(&device, "local secret").unwrap();
        assert_eq!(env.key_type, "deviceKey");
        assert!(env.cipher_text.is_none());
        assert!(is_valid_encrypted_data_device_key(&env.to_json().unwrap()));
        assert_eq!(decrypt_data_device_key(&device, &env).unwrap(), "local secret");
    }

    #[test]
    fn json_roundtrip() {
        let device = DeviceKey::generate();
        let json = device.to_json().unwrap();
        assert!(is_valid_device_key(&json));

        let back = DeviceKey::from_json(&json).unwrap();
        let env = encrypt_data_device_key(&device, "payload").unwrap();
        assert_eq!(decrypt_data_device_key(&back, &env).unwrap(), "payload");
    }

    #[test]
    fn wrong_device_key_rejected() {
        let a = DeviceKey::generate();
        let b = DeviceKey::generate();
        let env = encrypt_data_device_key(&a, "secret").unwrap();
        assert!(decrypt_data_device_key(&b, &env).is_err());
    }
}

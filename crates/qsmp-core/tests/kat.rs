//! Known-answer and size-invariant checks for the key algebra.

use hex_literal::hex;

use qsmp_core::codec::{b64_decode, hex_lower, key_hash, sha256};
use qsmp_core::pq::aes;
use qsmp_core::{
    is_valid_uuid_v7, verify_master_key, AccountKeyPair, DeviceKey, IdentityKeyPair,
    MasterKeyPair, MigrateKeyPair, MigrateSignKeyPair, RoomKey, ServerKeyPair, ShareKeyPair,
    ShareSignKeyPair,
};

const UUID: &str = "018fdb31-0798-78a2-b4c9-e145d5b5b88e";

fn raw_key_len(key_json: &str) -> usize {
    let parsed: serde_json::Value = serde_json::from_str(key_json).unwrap();
    let key = parsed.get("key").and_then(|v| v.as_str()).unwrap();
    b64_decode(key).unwrap().len()
}

#[test]
fn sha256_kat() {
    let digest = sha256(b"hello world");
    let expected = hex!(
        "b94d27b9934d3e08a52e52d7da7dabfa"
        "c484efe37a5380ee9088f7ace2efcde9"
    );
    assert_eq!(digest, expected);
    assert_eq!(hex_lower(&digest), hex_lower(&expected));
}

#[test]
fn key_hash_kat() {
    assert_eq!(
        key_hash("hello world"),
        "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek="
    );
}

#[test]
fn aes_256_gcm_kat() {
    // NIST GCM validation vectors: 256-bit zero key, 96-bit zero IV, no AAD.
    let key = [0u8; 32];
    let iv = [0u8; 12];

    // empty plaintext: output is the tag alone
    let enc = aes::encrypt(&key, &iv, b"").unwrap();
    assert_eq!(enc, hex!("530f8afbc74536b9a963b4f1c4cb738b"));

    // one zero block: ciphertext || tag
    let enc = aes::encrypt(&key, &iv, &[0u8; 16]).unwrap();
    let expected = hex!(
        "cea7403d4d606b6e074ec5d3baf39d18"
        "d0d1c8a799996bf0265b98b5d48ab919"
    );
    assert_eq!(enc, expected);
    assert_eq!(aes::decrypt(&key, &iv, &expected).unwrap(), [0u8; 16]);
}

#[test]
fn uuid_v7_gate() {
    assert!(is_valid_uuid_v7("018fdb31-0798-78a2-b4c9-e145d5b5b88e"));
    assert!(!is_valid_uuid_v7("invalid-uuid"));
    // v4 and v1 are rejected
    assert!(!is_valid_uuid_v7("7c2a5a3e-9b5e-4d5c-8f2a-1f0e9b8c7d6e"));
    assert!(!is_valid_uuid_v7("c232ab00-9414-11ec-b3c8-9f6bdeced846"));
}

#[test]
fn master_sign_hello_world() {
    let master = MasterKeyPair::generate(&[21u8; 32]);
    let sig = master
        .secret
        .sign(b"Hello, World!", &master.public.hash().unwrap())
        .unwrap();
    assert!(verify_master_key(&master.public, &sig, b"Hello, World!"));
}

#[test]
fn generator_outputs_match_size_table() {
    let master = MasterKeyPair::generate_random();
    assert_eq!(raw_key_len(&master.public.to_json().unwrap()), 2592);
    assert_eq!(raw_key_len(&master.secret.to_json().unwrap()), 4896);

    let (identity, _) = IdentityKeyPair::generate(UUID, &master).unwrap();
    assert_eq!(raw_key_len(&identity.public.to_json().unwrap()), 1952);
    assert_eq!(raw_key_len(&identity.secret.to_json().unwrap()), 4032);

    let (account, _) = AccountKeyPair::generate(&master).unwrap();
    assert_eq!(raw_key_len(&account.public.to_json().unwrap()), 1184);
    assert_eq!(raw_key_len(&account.secret.to_json().unwrap()), 2400);

    let room = RoomKey::generate(UUID).unwrap();
    assert_eq!(raw_key_len(&room.to_json().unwrap()), 32);

    let (share, _) = ShareKeyPair::generate(UUID, &master).unwrap();
    assert_eq!(raw_key_len(&share.public.to_json().unwrap()), 1184);
    assert_eq!(raw_key_len(&share.secret.to_json().unwrap()), 2400);

    let (share_sign, _) = ShareSignKeyPair::generate(UUID, &master).unwrap();
    assert_eq!(raw_key_len(&share_sign.public.to_json().unwrap()), 1952);
    assert_eq!(raw_key_len(&share_sign.secret.to_json().unwrap()), 4032);

    let migrate = MigrateKeyPair::generate();
    assert_eq!(raw_key_len(&migrate.public.to_json().unwrap()), 1184);
    assert_eq!(raw_key_len(&migrate.secret.to_json().unwrap()), 2400);

    let migrate_sign = MigrateSignKeyPair::generate();
    assert_eq!(raw_key_len(&migrate_sign.public.to_json().unwrap()), 1952);
    assert_eq!(raw_key_len(&migrate_sign.secret.to_json().unwrap()), 4032);

    let device = DeviceKey::generate();
    assert_eq!(raw_key_len(&device.to_json().unwrap()), 32);

    let server = ServerKeyPair::generate();
    assert_eq!(raw_key_len(&server.public.to_json().unwrap()), 1952);
    assert_eq!(raw_key_len(&server.secret.to_json().unwrap()), 4032);
}

#[test]
fn signature_sizes_match_table() {
    let master = MasterKeyPair::generate_random();
    let master_sig = master.sign(b"d").unwrap();
    let raw = b64_decode(&master_sig.signature).unwrap();
    assert_eq!(raw.len(), 4627);
    assert_eq!(master_sig.signature.len(), 6172);

    let (identity, _) = IdentityKeyPair::generate(UUID, &master).unwrap();
    let identity_sig = identity.sign(b"d").unwrap();
    let raw = b64_decode(&identity_sig.signature).unwrap();
    assert_eq!(raw.len(), 3309);
    assert_eq!(identity_sig.signature.len(), 4412);
}

#[test]
fn key_hashes_are_stable_across_reserialization() {
    let master = MasterKeyPair::generate_random();
    let json = master.public.to_json().unwrap();
    let hash = key_hash(&json);
    assert_eq!(hash.len(), 44);
    assert_eq!(b64_decode(&hash).unwrap().len(), 32);

    let reparsed = qsmp_core::MasterPublicKey::from_json(&json).unwrap();
    assert_eq!(key_hash(&reparsed.to_json().unwrap()), hash);
    assert_eq!(reparsed.hash().unwrap(), hash);
}

#[test]
fn cross_signing_graph_holds_for_all_issued_kinds() {
    let master = MasterKeyPair::generate_random();

    let (identity, sig) = IdentityKeyPair::generate(UUID, &master).unwrap();
    assert!(verify_master_key(
        &master.public,
        &sig,
        identity.public.to_json().unwrap().as_bytes()
    ));
    assert_eq!(sig.key_hash, master.public.hash().unwrap());

    let (account, sig) = AccountKeyPair::generate(&master).unwrap();
    assert!(verify_master_key(
        &master.public,
        &sig,
        account.public.to_json().unwrap().as_bytes()
    ));

    let (share, sig) = ShareKeyPair::generate(UUID, &master).unwrap();
    assert!(verify_master_key(
        &master.public,
        &sig,
        share.public.to_json().unwrap().as_bytes()
    ));

    let (share_sign, sig) = ShareSignKeyPair::generate(UUID, &master).unwrap();
    assert!(verify_master_key(
        &master.public,
        &sig,
        share_sign.public.to_json().unwrap().as_bytes()
    ));
}

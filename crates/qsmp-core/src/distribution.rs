//! Room-key distribution: wrap one room key to every member's account key
//! and sign the fan-out with the sender's identity key.
//!
//! The metadata block commits to the room-key hash and the exact member
//! list, so a server relaying the fan-out cannot add or drop recipients
//! without breaking the identity signature.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::key_hash;
use crate::envelope::{EncryptedEnvelope, SignatureEnvelope};
use crate::error::{Error, Result};
use crate::keys::account::{encrypt_data_account_key, AccountPublicKey};
use crate::keys::identity::IdentityKeyPair;
use crate::keys::master::{verify_master_key, MasterPublicKey};
use crate::keys::room::is_valid_room_key;

/// One member of the fan-out, as assembled by the caller from the room
/// roster.
pub struct RoomKeyRecipient {
    pub user_id: String,
    pub master_pub: MasterPublicKey,
    pub account_pub: AccountPublicKey,
    /// Master signature over the account public-key JSON, if the caller
    /// has it. Required when `is_verify` is set.
    pub account_sign: Option<SignatureEnvelope>,
    /// Verify the account key's master signature before wrapping to it.
    pub is_verify: bool,
}

/// Per-member row of the signed metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "masterKeyHash")]
    pub master_key_hash: String,
    #[serde(rename = "accountKeyTimeStamp")]
    pub account_key_time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomKeyMetadata {
    #[serde(rename = "roomKeyHash")]
    pub room_key_hash: String,
    #[serde(rename = "sharedUser")]
    pub shared_user: Vec<SharedUser>,
}

impl RoomKeyMetadata {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::input(format!("serialize metadata: {e}")))
    }
}

/// One member's wrapped room key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEncryptedRoomKey {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "encryptedData")]
    pub encrypted_data: EncryptedEnvelope,
}

/// The complete signed fan-out returned to the caller for relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributedRoomKey {
    pub metadata: RoomKeyMetadata,
    #[serde(rename = "metadataSign")]
    pub metadata_sign: SignatureEnvelope,
    #[serde(rename = "encryptedData")]
    pub encrypted_data: Vec<UserEncryptedRoomKey>,
    pub sign: SignatureEnvelope,
}

/// Wrap `room_key_json` to every recipient's account key, emit the signed
/// membership metadata, and sign the room key itself.
///
/// Both output lists preserve the input recipient order.
pub fn encrypt_room_key_with_account_keys(
    recipients: &[RoomKeyRecipient],
    room_key_json: &str,
    identity: &IdentityKeyPair,
) -> Result<DistributedRoomKey> {
    if !is_valid_room_key(room_key_json) {
        return Err(Error::input("not a valid room key"));
    }

    let mut shared_user = Vec::with_capacity(recipients.len());
    let mut encrypted_data = Vec::with_capacity(recipients.len());

    for recipient in recipients {
        if recipient.is_verify {
            let account_json = recipient.account_pub.to_json()?;
            let verified = recipient.account_sign.as_ref().map_or(false, |sign| {
                verify_master_key(&recipient.master_pub, sign, account_json.as_bytes())
            });
            if !verified {
                debug!(user_id = %recipient.user_id, "account key failed master verification");
                return Err(Error::Prerequisite);
            }
        }

        let envelope = encrypt_data_account_key(&recipient.account_pub, room_key_json)?;
        shared_user.push(SharedUser {
            user_id: recipient.user_id.clone(),
            master_key_hash: recipient.master_pub.hash()?,
            account_key_time_stamp: recipient.account_pub.timestamp(),
        });
        encrypted_data.push(UserEncryptedRoomKey {
            user_id: recipient.user_id.clone(),
            encrypted_data: envelope,
        });
    }

    let metadata = RoomKeyMetadata {
        room_key_hash: key_hash(room_key_json),
        shared_user,
    };
    let metadata_sign = identity.sign(metadata.to_json()?.as_bytes())?;
    let sign = identity.sign(room_key_json.as_bytes())?;

    Ok(DistributedRoomKey {
        metadata,
        metadata_sign,
        encrypted_data,
        sign,
    })
}

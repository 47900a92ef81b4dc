use thiserror::Error;

/// Failure classes surfaced across the API boundary.
///
/// Validation helpers (`is_valid_*`) stay `bool`-total; operations that
/// produce or consume envelopes return one of these instead. Nothing in the
/// library panics on malformed caller input.
#[derive(Debug, Error)]
pub enum Error {
    /// Structurally invalid input: JSON parse failure, unknown `keyType`,
    /// wrong algorithm literal, wrong raw size, malformed base64, bad UUIDv7.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Signature verification failed, AEAD tag invalid, or decapsulation
    /// did not yield a usable shared secret.
    #[error("authentication failure: {0}")]
    Auth(&'static str),

    /// Message timestamp outside the freshness window relative to the
    /// server-provided timestamp.
    #[error("timestamp outside freshness window (skew {skew_ms} ms)")]
    Freshness { skew_ms: i64 },

    /// A hash or identifier in an envelope does not match what the caller
    /// expected (roomid mismatch, signer keyHash mismatch).
    #[error("binding mismatch: {0}")]
    Binding(&'static str),

    /// A master signature over an issued subkey does not verify.
    #[error("master signature over subkey does not verify")]
    Prerequisite,
}

impl Error {
    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

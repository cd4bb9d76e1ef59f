use thiserror::Error;

/// Errors raised by the crypto envelope.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Hex-decoding the wire payload failed.
    #[error("invalid hex in ciphertext: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded payload was shorter than one IV block.
    #[error("ciphertext shorter than one IV block (got {0} bytes)")]
    Truncated(usize),

    /// PKCS#7 unpadding found a bad padding byte or count.
    #[error("invalid PKCS#7 padding")]
    BadPadding,

    /// The key supplied to the block cipher was not exactly 16 bytes.
    #[error("key material is not valid for AES-128 (need 16 bytes, got {0})")]
    InvalidKeyLength(usize),

    /// Signature or challenge-response comparison failed.
    #[error("signature verification failed")]
    VerificationFailed,

    /// The referenced challenge does not exist or has expired.
    #[error("challenge not found or expired")]
    ChallengeExpired,

    /// The decrypted envelope plaintext was not a JSON mapping.
    #[error("decrypted envelope is not a JSON object")]
    NotJson,

    /// The decrypted envelope mapping carried no `"signature"` field.
    #[error("decrypted envelope is missing its signature")]
    MissingSignature,

    /// The plaintext mapping could not be serialized before encryption.
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

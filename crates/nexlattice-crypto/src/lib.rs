//! # NexLattice Crypto Envelope
//!
//! Symmetric confidentiality, keyed-hash authentication, and challenge/
//! response liveness proof for a NexLattice mesh node.
//!
//! | Concern | Primitive |
//! |---|---|
//! | Confidentiality | AES-128-CBC + PKCS#7, XOR-keystream fallback |
//! | Authentication | `SHA-256(data \|\| key)`, asymmetric sign/verify keys |
//! | Liveness proof | random hex challenge, 30s TTL, single-use |
//! | Session keys | derived per-peer from `KEY_EXCHANGE` material |
//!
//! The sign/verify asymmetry (signing hashes the signer's private key,
//! verifying hashes the verifier's PSK) is carried over from the original
//! device firmware unchanged; see `DESIGN.md` for why this is a
//! shared-secret MAC rather than a real signature scheme.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod challenge;
mod cipher;
mod error;
mod identity;
mod session;
mod sign;

pub use challenge::ChallengeCache;
pub use cipher::{derive_key, select_mode, CipherMode};
pub use error::CryptoError;
pub use identity::NodeIdentity;
pub use session::SessionContext;
pub use sign::{sign, verify};

/// Compute the response to a challenge issued by a peer, using this node's
/// key material. An alias for [`sign`] under the name the challenge/response
/// protocol calls it by.
#[must_use]
pub fn compute_response(challenge: &str, key: &[u8]) -> String {
    sign::sign(challenge.as_bytes(), key)
}

/// Canonicalize a JSON mapping the way the signature contract requires:
/// serialize with keys sorted lexicographically. `serde_json::Map` is
/// backed by a `BTreeMap` (the `preserve_order` feature is not enabled), so
/// a plain serialization already yields sorted keys.
fn canonical_json(object: &serde_json::Map<String, serde_json::Value>) -> Result<String, CryptoError> {
    Ok(serde_json::to_string(object)?)
}

/// Encrypt `plaintext` under `key`, signing it with `private_key` first.
///
/// The signature is computed over the canonical (sorted-key JSON) form of
/// `{"payload": hex(plaintext)}`, then inserted into that same mapping
/// under the `"signature"` key before the whole mapping is encrypted — the
/// signature travels inside the ciphertext, never as a separate cleartext
/// field. Returns the hex-encoded `iv || ciphertext` ready for the wire.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyLength`] if `key` does not derive to a
/// usable AES-128 key and no fallback mode applies.
pub fn sign_and_encrypt(
    plaintext: &[u8],
    key: &[u8],
    private_key: &[u8],
) -> Result<String, CryptoError> {
    let mut object = serde_json::Map::new();
    object.insert(
        "payload".to_string(),
        serde_json::Value::String(hex::encode(plaintext)),
    );
    let canonical = canonical_json(&object)?;
    let signature = sign::sign(canonical.as_bytes(), private_key);
    object.insert("signature".to_string(), serde_json::Value::String(signature));

    let signed = serde_json::to_vec(&serde_json::Value::Object(object))?;
    let mode = cipher::select_mode(key);
    cipher::encrypt(&signed, key, mode)
}

/// Decrypt `ciphertext_hex` under `key`, extract and remove its embedded
/// `"signature"` field, and verify the remainder against `psk`.
///
/// Returns the original plaintext bytes only if decryption, JSON parsing,
/// and signature verification all succeed.
///
/// # Errors
///
/// Returns a [`CryptoError`] variant from the underlying decrypt step
/// (`InvalidHex`, `Truncated`, `InvalidKeyLength`, `BadPadding`) if
/// decryption fails; [`CryptoError::NotJson`] if the plaintext is not a JSON
/// mapping; [`CryptoError::MissingSignature`] if it has no `"signature"`
/// field; [`CryptoError::VerificationFailed`] if the signature does not
/// match.
pub fn decrypt_and_verify(
    ciphertext_hex: &str,
    key: &[u8],
    psk: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mode = cipher::select_mode(key);
    let raw = cipher::decrypt(ciphertext_hex, key, mode)?;

    let value: serde_json::Value = serde_json::from_slice(&raw).map_err(|_| CryptoError::NotJson)?;
    let mut object = match value {
        serde_json::Value::Object(object) => object,
        _ => return Err(CryptoError::NotJson),
    };

    let signature = object
        .remove("signature")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or(CryptoError::MissingSignature)?;

    let canonical = canonical_json(&object)?;
    if !sign::verify(canonical.as_bytes(), &signature, psk) {
        return Err(CryptoError::VerificationFailed);
    }

    let payload_hex = object
        .get("payload")
        .and_then(serde_json::Value::as_str)
        .ok_or(CryptoError::NotJson)?;
    Ok(hex::decode(payload_hex)?)
}

//! Message authentication.
//!
//! `sign` and `verify` are intentionally asymmetric: `sign` hashes the
//! signer's own private key into the digest, while `verify` hashes the
//! verifier's configured pre-shared key. This reproduces the original
//! device firmware's behavior faithfully rather than "fixing" it into a
//! real signature scheme — see `DESIGN.md` for the rationale and the
//! operational consequence (this is a shared-secret MAC, not an
//! asymmetric signature, and only verifies correctly when every node on
//! the mesh is provisioned with the same key material as `private_key`).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Sign `data` using `private_key` as the keyed hash input.
#[must_use]
pub fn sign(data: &[u8], private_key: &[u8]) -> String {
    digest_hex(data, private_key)
}

/// Verify `signature` against `data` using `psk` as the keyed hash input.
///
/// Comparison is constant-time in the signature length to avoid leaking
/// timing information about how many leading hex characters matched.
#[must_use]
pub fn verify(data: &[u8], signature: &str, psk: &[u8]) -> bool {
    let expected = digest_hex(data, psk);
    if expected.len() != signature.len() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

fn digest_hex(data: &[u8], key: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.update(key);
    hex::encode(hasher.finalize())
}

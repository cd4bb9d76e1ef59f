//! Symmetric envelope cipher: AES-128-CBC with PKCS#7 padding as the
//! primary mode, and a repeating-keystream XOR as the degraded fallback
//! used when valid AES key material isn't available.

use crate::error::CryptoError;
use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const IV_LEN: usize = 16;
const AES_KEY_LEN: usize = 16;

/// Which primitive was actually used for a given envelope.
///
/// A node always prefers [`CipherMode::Aes128Cbc`]; it only falls back to
/// [`CipherMode::XorKeystream`] when the derived key material isn't valid
/// for the block cipher, mirroring the original `CryptoUnavailable` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    /// AES-128-CBC with PKCS#7 padding, IV prepended to the ciphertext.
    Aes128Cbc,
    /// XOR of the plaintext with a PSK-derived keystream, repeated to length.
    XorKeystream,
}

/// Derive a 16-byte AES key from arbitrary-length key material.
///
/// Matches the original device code's approach of hashing the configured
/// pre-shared key down to a fixed-size key rather than requiring operators
/// to provision an already-16-byte secret.
#[must_use]
pub fn derive_key(key_material: &[u8]) -> [u8; AES_KEY_LEN] {
    let digest = Sha256::digest(key_material);
    let mut key = [0u8; AES_KEY_LEN];
    key.copy_from_slice(&digest[..AES_KEY_LEN]);
    key
}

/// Pick the cipher mode available for the given derived key.
///
/// `derive_key` always yields 16 bytes, so in this implementation the
/// fallback path is unreachable in practice; it exists so a future key
/// derivation scheme (or a key supplied directly by an operator) that
/// doesn't land on 16 bytes degrades instead of hard-failing, per the
/// `CryptoUnavailable` contract.
#[must_use]
pub fn select_mode(key: &[u8]) -> CipherMode {
    if key.len() == AES_KEY_LEN {
        CipherMode::Aes128Cbc
    } else {
        CipherMode::XorKeystream
    }
}

/// Encrypt `plaintext` under `key`, returning `hex(iv || ciphertext)` for
/// [`CipherMode::Aes128Cbc`], or `hex(nonce || ciphertext)` for
/// [`CipherMode::XorKeystream`] (the "nonce" there is just a random prefix
/// mixed into the keystream so identical plaintexts don't produce identical
/// output).
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyLength`] if `mode` is
/// [`CipherMode::Aes128Cbc`] and `key` is not 16 bytes.
pub fn encrypt(plaintext: &[u8], key: &[u8], mode: CipherMode) -> Result<String, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let body = match mode {
        CipherMode::Aes128Cbc => {
            if key.len() != AES_KEY_LEN {
                return Err(CryptoError::InvalidKeyLength(key.len()));
            }
            let encryptor = Aes128CbcEnc::new(key.into(), &iv.into());
            encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        }
        CipherMode::XorKeystream => xor_keystream(plaintext, key, &iv),
    };

    let mut out = Vec::with_capacity(IV_LEN + body.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&body);
    Ok(hex::encode(out))
}

/// Decrypt a `hex(iv || ciphertext)` envelope produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`CryptoError::InvalidHex`] if `ciphertext_hex` isn't valid hex,
/// [`CryptoError::Truncated`] if it decodes to fewer than 16 bytes,
/// [`CryptoError::InvalidKeyLength`] for a non-16-byte key under
/// [`CipherMode::Aes128Cbc`], and [`CryptoError::BadPadding`] if the
/// decrypted PKCS#7 padding is malformed.
pub fn decrypt(ciphertext_hex: &str, key: &[u8], mode: CipherMode) -> Result<Vec<u8>, CryptoError> {
    let raw = hex::decode(ciphertext_hex)?;
    if raw.len() < IV_LEN {
        return Err(CryptoError::Truncated(raw.len()));
    }
    let (iv, body) = raw.split_at(IV_LEN);

    match mode {
        CipherMode::Aes128Cbc => {
            if key.len() != AES_KEY_LEN {
                return Err(CryptoError::InvalidKeyLength(key.len()));
            }
            let decryptor = Aes128CbcDec::new(key.into(), iv.into());
            decryptor
                .decrypt_padded_vec_mut::<Pkcs7>(body)
                .map_err(|_| CryptoError::BadPadding)
        }
        CipherMode::XorKeystream => Ok(xor_keystream(body, key, iv)),
    }
}

/// XOR `data` with a keystream built by repeating `nonce || key` to length.
///
/// This is a degraded-mode cipher, not a secure one: it exists only so a
/// node without usable AES key material can still exchange obfuscated
/// (not confidential) payloads rather than falling silent.
fn xor_keystream(data: &[u8], key: &[u8], nonce: &[u8]) -> Vec<u8> {
    let mut seed = Vec::with_capacity(nonce.len() + key.len());
    seed.extend_from_slice(nonce);
    seed.extend_from_slice(key);
    if seed.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ seed[i % seed.len()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_round_trips() {
        let key = derive_key(b"shared-secret");
        let mode = select_mode(&key);
        assert_eq!(mode, CipherMode::Aes128Cbc);
        let ct = encrypt(b"hello mesh", &key, mode).unwrap();
        let pt = decrypt(&ct, &key, mode).unwrap();
        assert_eq!(pt, b"hello mesh");
    }

    #[test]
    fn aes_produces_distinct_ciphertext_for_same_plaintext() {
        let key = derive_key(b"shared-secret");
        let a = encrypt(b"same", &key, CipherMode::Aes128Cbc).unwrap();
        let b = encrypt(b"same", &key, CipherMode::Aes128Cbc).unwrap();
        assert_ne!(a, b, "random IV should make repeated encryptions differ");
    }

    #[test]
    fn xor_fallback_round_trips() {
        let key = b"short";
        let mode = select_mode(key);
        assert_eq!(mode, CipherMode::XorKeystream);
        let ct = encrypt(b"fallback payload", key, mode).unwrap();
        let pt = decrypt(&ct, key, mode).unwrap();
        assert_eq!(pt, b"fallback payload");
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let key = derive_key(b"k");
        let err = decrypt("aabb", &key, CipherMode::Aes128Cbc).unwrap_err();
        assert!(matches!(err, CryptoError::Truncated(_)));
    }

    #[test]
    fn invalid_hex_is_rejected() {
        let key = derive_key(b"k");
        let err = decrypt("not-hex!!", &key, CipherMode::Aes128Cbc).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidHex(_)));
    }

    #[test]
    fn bad_padding_is_rejected() {
        let key = derive_key(b"k");
        // 32 bytes of zero: valid length, but not a genuine PKCS7 padded block.
        let raw = vec![0u8; 32];
        let err = decrypt(&hex::encode(raw), &key, CipherMode::Aes128Cbc).unwrap_err();
        assert!(matches!(err, CryptoError::BadPadding));
    }
}

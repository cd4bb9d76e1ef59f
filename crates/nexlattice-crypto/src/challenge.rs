//! Challenge/response authentication.
//!
//! A challenge is a random hex nonce with a short TTL, outstanding for at
//! most one peer at a time: issuing a new challenge for a peer that already
//! has one outstanding replaces it. It is consumed (removed from the cache)
//! on the first verification attempt regardless of whether that attempt
//! succeeds, so a challenge can never be replayed even by the legitimate
//! responder.

use crate::error::CryptoError;
use rand::RngCore;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const CHALLENGE_LEN: usize = 16;
const CHALLENGE_TTL: Duration = Duration::from_secs(30);

/// One outstanding challenge: the hex nonce and when it stops being
/// acceptable.
#[derive(Debug, Clone)]
struct ChallengeRecord {
    challenge: String,
    expiry: Instant,
}

/// Outstanding challenges this node has issued, keyed by `peer_id`: at most
/// one challenge is ever outstanding per peer.
#[derive(Debug, Default)]
pub struct ChallengeCache {
    pending: HashMap<String, ChallengeRecord>,
}

impl ChallengeCache {
    /// Construct an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Generate and register a new challenge for `peer_id`, hex-encoded.
    /// Replaces any challenge already outstanding for that peer.
    #[must_use]
    pub fn generate_challenge(&mut self, peer_id: &str) -> String {
        let mut bytes = [0u8; CHALLENGE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let challenge = hex::encode(bytes);
        self.pending.insert(
            peer_id.to_string(),
            ChallengeRecord {
                challenge: challenge.clone(),
                expiry: Instant::now() + CHALLENGE_TTL,
            },
        );
        challenge
    }

    /// Consume the challenge outstanding for `peer_id` and check `response`
    /// against it using `psk`.
    ///
    /// The challenge is removed from the cache whether or not verification
    /// succeeds, matching the original's "never reusable" guarantee. A
    /// missing or expired challenge is reported as
    /// [`CryptoError::ChallengeExpired`]; a present-but-wrong response is
    /// reported as [`CryptoError::VerificationFailed`].
    ///
    /// # Errors
    ///
    /// See above.
    pub fn verify_response(
        &mut self,
        peer_id: &str,
        response: &str,
        psk: &[u8],
    ) -> Result<(), CryptoError> {
        let record = self
            .pending
            .remove(peer_id)
            .ok_or(CryptoError::ChallengeExpired)?;
        if Instant::now() > record.expiry {
            return Err(CryptoError::ChallengeExpired);
        }
        if crate::sign::verify(record.challenge.as_bytes(), response, psk) {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed)
        }
    }

    /// Drop expired, never-answered challenges. Call periodically to bound
    /// cache growth; correctness does not depend on calling this, since
    /// `verify_response` independently checks expiry.
    pub fn sweep_expired(&mut self) {
        let now = Instant::now();
        self.pending.retain(|_, record| record.expiry > now);
    }

    /// Number of peers with a challenge currently outstanding.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign;

    #[test]
    fn accepts_correct_response_for_matching_psk() {
        let mut cache = ChallengeCache::new();
        let challenge = cache.generate_challenge("peer-b");
        let response = sign::sign(challenge.as_bytes(), b"psk");
        assert!(cache.verify_response("peer-b", &response, b"psk").is_ok());
    }

    #[test]
    fn challenge_is_consumed_on_first_use_even_if_wrong() {
        let mut cache = ChallengeCache::new();
        let challenge = cache.generate_challenge("peer-b");
        let wrong = sign::sign(challenge.as_bytes(), b"wrong-psk");
        assert!(cache.verify_response("peer-b", &wrong, b"psk").is_err());

        let correct = sign::sign(challenge.as_bytes(), b"psk");
        let retry = cache.verify_response("peer-b", &correct, b"psk");
        assert!(matches!(retry, Err(CryptoError::ChallengeExpired)));
    }

    #[test]
    fn unknown_peer_is_rejected() {
        let mut cache = ChallengeCache::new();
        let err = cache
            .verify_response("never-issued", "whatever", b"psk")
            .unwrap_err();
        assert!(matches!(err, CryptoError::ChallengeExpired));
    }

    #[test]
    fn sweep_expired_does_not_remove_live_challenges() {
        let mut cache = ChallengeCache::new();
        let challenge = cache.generate_challenge("peer-b");
        cache.sweep_expired();
        assert_eq!(cache.pending_count(), 1);
        let _ = challenge;
    }

    #[test]
    fn issuing_a_new_challenge_for_the_same_peer_replaces_the_old_one() {
        let mut cache = ChallengeCache::new();
        let first = cache.generate_challenge("peer-b");
        let _second = cache.generate_challenge("peer-b");
        assert_eq!(cache.pending_count(), 1, "at most one outstanding per peer");

        let response_to_first = sign::sign(first.as_bytes(), b"psk");
        let result = cache.verify_response("peer-b", &response_to_first, b"psk");
        assert!(
            result.is_err(),
            "the first challenge was superseded and must no longer verify"
        );
    }
}

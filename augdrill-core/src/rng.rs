//! Seeded random streams.
//!
//! Every random decision in the engine takes an injected `Rng`. These
//! helpers derive independent ChaCha20 streams from one user-visible seed
//! so that a whole set, or a single spot of it, can be regenerated exactly.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::constants::RNG_DOMAIN_SPOT;

type HmacSha256 = Hmac<Sha256>;

/// Derive a 64-bit stream seed from `user_seed` and a domain tag.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = HmacSha256::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// ChaCha20 stream for `domain_tag`.
#[must_use]
pub fn stream_rng(user_seed: u64, domain_tag: &[u8]) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_stream_seed(user_seed, domain_tag))
}

/// Stream dedicated to one spot of a set. Regenerating spot `index`
/// with the same seed reproduces the same options.
#[must_use]
pub fn spot_rng(seed: u64, index: usize) -> ChaCha20Rng {
    let mut tag = Vec::with_capacity(RNG_DOMAIN_SPOT.len() + 8);
    tag.extend_from_slice(RNG_DOMAIN_SPOT);
    tag.extend_from_slice(&(index as u64).to_le_bytes());
    stream_rng(seed, &tag)
}

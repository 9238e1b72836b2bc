//! Randomness delivered for each ticket claim.
//!
//! The coordinator's HMAC secret turns a request's seed, block and id into
//! the 32-byte word that resolves the claim. The same request always yields
//! the same word; without the secret it cannot be predicted.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tickets::{Randomness, RequestId};

type HmacSha256 = Hmac<Sha256>;

/// Compute the 32-byte VRF output for a given randomness request.
///
/// ```text
/// output = HMAC-SHA256(secret, seed || request_block_le || request_id)
/// ```
///
/// The `seed` is fixed by the coordinator when the request is placed,
/// `request_block` binds the output to the coordinator's state at that
/// moment, and `request_id` ensures uniqueness across requests.
pub fn compute_randomness(
    hmac_secret: &[u8],
    seed: &[u8; 32],
    request_block: u64,
    request_id: &RequestId,
) -> Randomness {
    let mut mac =
        HmacSha256::new_from_slice(hmac_secret).expect("HMAC accepts keys of any size");

    mac.update(seed);
    mac.update(&request_block.to_le_bytes());
    mac.update(request_id.as_bytes());

    let bytes = mac.finalize().into_bytes();

    let mut output = [0u8; 32];
    output.copy_from_slice(&bytes);
    output
}

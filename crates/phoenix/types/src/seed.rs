use crate::hash::ContentHash;

/// Derives a reproducible 64-bit seed from the spec hash, a domain label and
/// an iteration index. Distinct labels give independent streams.
pub fn derive_seed(spec_hash: &ContentHash, label: &str, iteration: u32) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(spec_hash.as_bytes());
    hasher.update(label.as_bytes());
    hasher.update(&iteration.to_le_bytes());
    let digest = hasher.finalize();
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(first)
}

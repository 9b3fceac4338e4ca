//! The 128-bit hash primitive is an external collaborator: this crate only
//! needs *some* function that turns a byte stream into exactly 16 bytes.
//! [`Hasher128`] is that seam. Two reference implementations are provided
//! so the crate is useful out of the box without forcing a specific choice
//! on callers who already have their own 128-bit hash in house.

/// Produces a 128-bit (16-byte) digest of a byte stream.
///
/// Implementations are not required to be cryptographically secure — this
/// crate only relies on reasonable avalanche/uniformity, not collision
/// resistance against an adversary.
pub trait Hasher128 {
    /// Hashes `bytes`, returning exactly 16 output bytes.
    fn hash128(&self, bytes: &[u8]) -> [u8; 16];
}

/// Hand-rolled MurmurHash3 x64-128, the reference hash used to size and
/// test this crate's filters. A direct-port, non-seeded-per-call variant
/// (fixed seed 0) in the spirit of the widely used 128-bit murmur-family
/// hash this crate's sizing math assumes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Murmur3X64128 {
    seed: u64,
}

impl Murmur3X64128 {
    /// Reference instance using seed 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { seed: 0 }
    }

    /// Reference instance using a caller-supplied seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Hasher128 for Murmur3X64128 {
    fn hash128(&self, bytes: &[u8]) -> [u8; 16] {
        murmur3_x64_128(bytes, self.seed)
    }
}

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

fn murmur3_x64_128(data: &[u8], seed: u64) -> [u8; 16] {
    let mut h1 = seed;
    let mut h2 = seed;
    let len = data.len();
    let nblocks = len / 16;

    for block in data[..nblocks * 16].chunks_exact(16) {
        let mut k1 = u64::from_le_bytes(block[0..8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(block[8..16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;

        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;

        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];

    if tail.len() > 8 {
        let mut buf = [0u8; 8];
        buf[..tail.len() - 8].copy_from_slice(&tail[8..]);
        let mut k2 = u64::from_le_bytes(buf);
        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
    }
    if !tail.is_empty() {
        let mut buf = [0u8; 8];
        let low_len = tail.len().min(8);
        buf[..low_len].copy_from_slice(&tail[..low_len]);
        let mut k1 = u64::from_le_bytes(buf);
        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u64;
    h2 ^= len as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(&h1.to_le_bytes());
    out[8..16].copy_from_slice(&h2.to_le_bytes());
    out
}

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// Truncates a [`blake3`] digest to 16 bytes. Useful for callers who
/// already depend on blake3 elsewhere and would rather not pull in a
/// second hash implementation.
#[cfg(feature = "blake3-hasher")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Hash128;

#[cfg(feature = "blake3-hasher")]
impl Hasher128 for Blake3Hash128 {
    fn hash128(&self, bytes: &[u8]) -> [u8; 16] {
        let digest = blake3::hash(bytes);
        let full = digest.as_bytes();
        let mut out = [0u8; 16];
        out.copy_from_slice(&full[..16]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_input() {
        let h = Murmur3X64128::new();
        assert_eq!(h.hash128(b"hello world"), h.hash128(b"hello world"));
    }

    #[test]
    fn differs_for_different_input() {
        let h = Murmur3X64128::new();
        assert_ne!(h.hash128(b"hello"), h.hash128(b"world"));
    }

    #[test]
    fn handles_all_tail_lengths() {
        let h = Murmur3X64128::new();
        for len in 0..40 {
            let data: Vec<u8> = (0..len as u8).collect();
            // Must not panic, and must be reproducible.
            let a = h.hash128(&data);
            let b = h.hash128(&data);
            assert_eq!(a, b, "len {len}");
        }
    }

    #[test]
    fn seed_changes_digest() {
        let a = Murmur3X64128::new();
        let b = Murmur3X64128::with_seed(42);
        assert_ne!(a.hash128(b"abc"), b.hash128(b"abc"));
    }

    #[cfg(feature = "blake3-hasher")]
    #[test]
    fn blake3_variant_produces_16_bytes() {
        let h = Blake3Hash128;
        let digest = h.hash128(b"abc");
        assert_eq!(digest.len(), 16);
    }
}

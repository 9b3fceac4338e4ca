//! Hash strategies: turn one 128-bit hash into `k` position indices via
//! double hashing (Kirsch-Mitzenmacher), without invoking the underlying
//! [`Hasher128`] more than once per element.
//!
//! Two strategies are provided, `V32` and `V64`, differing in the width of
//! arithmetic used to combine the two halves of the hash. They are *not*
//! interchangeable even though they solve the same problem: filters built
//! with one strategy are incompatible with filters built with the other
//! (see [`HashStrategy::ordinal`]).

use crate::funnel::{funnel_to_bytes, Funnel};
use crate::hash128::Hasher128;

/// A pluggable double-hashing scheme mapping one element to `k` bit/cell
/// positions in `[0, m)`.
pub trait HashStrategy {
    /// A stable small integer identifying this strategy. Two filters are
    /// only compatible if their strategies report the same ordinal.
    /// Non-negative values are reserved for the enumerated stateless
    /// strategies in this module (order preserved forever); negative values
    /// are left free for caller-defined stateful strategies.
    fn ordinal(&self) -> i8;

    /// Writes exactly `k` positions, each in `[0, m)`, into `out[..k]`.
    fn positions<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        out: &mut [usize],
    );

    /// Writes the positions of the current minimum among `k` candidate
    /// cells into `out`, returning the slice actually filled (ties all
    /// included). Implementations deliberately read `CellArray::get`
    /// through `get_cell`, kept generic over the caller's column getter so
    /// this module does not depend on `cellarray`.
    fn min_positions<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        get_cell: impl Fn(usize) -> u64,
        positions_buf: &mut [usize],
        out_min_buf: &mut [usize],
    ) -> usize;

    /// `true` iff every one of the `k` positions for `value` is already set
    /// (per `get_bit`).
    fn might_contain<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        get_bit: impl Fn(usize) -> bool,
        positions_buf: &mut [usize],
    ) -> bool {
        self.positions(value, funnel, hasher, m, k, positions_buf);
        positions_buf[..k as usize].iter().all(|&p| get_bit(p))
    }

    /// The minimum cell value among the `k` positions for `value` (the
    /// counting-filter notion of "how many times was this inserted,
    /// possibly overestimated").
    fn count<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        get_cell: impl Fn(usize) -> u64,
        positions_buf: &mut [usize],
    ) -> u64 {
        self.positions(value, funnel, hasher, m, k, positions_buf);
        positions_buf[..k as usize]
            .iter()
            .map(|&p| get_cell(p))
            .min()
            .unwrap_or(0)
    }
}

fn hash_halves<T: ?Sized>(
    value: &T,
    funnel: &impl Funnel<T>,
    hasher: &impl Hasher128,
) -> (u64, u64) {
    let bytes = funnel_to_bytes(funnel, value);
    let digest = hasher.hash128(&bytes);
    let lo = u64::from_le_bytes(digest[0..8].try_into().unwrap());
    let hi = u64::from_le_bytes(digest[8..16].try_into().unwrap());
    (lo, hi)
}

/// Double-hashing over the low/high 32-bit halves of the *lower* 64 bits of
/// the 128-bit hash, combined with `i32` (wrapping) arithmetic.
///
/// Quirk, preserved deliberately: negative combined hashes are mapped into
/// range via bitwise complement (`!combined`), not absolute value. For
/// `combined == i32::MIN`, `!combined == i32::MAX`, whereas `abs()` would
/// panic/overflow — this strategy's behavior at that boundary is a
/// documented, load-bearing accident of the original scheme, not a bug to
/// fix here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct V32Strategy;

impl HashStrategy for V32Strategy {
    fn ordinal(&self) -> i8 {
        0
    }

    fn positions<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        out: &mut [usize],
    ) {
        let (lo, _hi) = hash_halves(value, funnel, hasher);
        let hash1 = lo as u32 as i32;
        let hash2 = (lo >> 32) as u32 as i32;

        // Multiplier runs 1..=k, not 0..k: Guava's MURMUR128_MITZ_32 seeds
        // `combinedHash` with `hash1 + i*hash2` for `i` starting at 1.
        for (slot, i) in out[..k as usize].iter_mut().zip(1..=k as i32) {
            let combined = hash1.wrapping_add(i.wrapping_mul(hash2));
            let combined = if combined < 0 { !combined } else { combined };
            *slot = (combined as u64 % m as u64) as usize;
        }
    }

    fn min_positions<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        get_cell: impl Fn(usize) -> u64,
        positions_buf: &mut [usize],
        out_min_buf: &mut [usize],
    ) -> usize {
        self.positions(value, funnel, hasher, m, k, positions_buf);
        let k = k as usize;
        let mut min_val = get_cell(positions_buf[0]);
        let mut count = 1;
        out_min_buf[0] = positions_buf[0];

        // Quirk, preserved deliberately: this comparison reads `>` where
        // `V64Strategy::min_positions` below reads `<` for the otherwise
        // identical running-minimum scan. A strictly *greater* cell value
        // resets the tracked minimum here, so on inputs where the first
        // candidate isn't already the true minimum this walks toward the
        // maximum instead. Both strategies are ported from the same
        // reference scheme and this divergence between them is inherited,
        // not introduced — it is not corrected here.
        for &p in &positions_buf[1..k] {
            let v = get_cell(p);
            if v > min_val {
                min_val = v;
                out_min_buf[0] = p;
                count = 1;
            } else if v == min_val {
                out_min_buf[count] = p;
                count += 1;
            }
        }
        count
    }
}

/// Double-hashing over the low and high 64-bit halves of the full 128-bit
/// hash, combined with `i64` (wrapping) arithmetic and mapped into range by
/// masking off the sign bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct V64Strategy;

impl HashStrategy for V64Strategy {
    fn ordinal(&self) -> i8 {
        1
    }

    fn positions<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        out: &mut [usize],
    ) {
        // Unlike V32, this reads both 64-bit halves of the full 128-bit
        // digest (low bits as h1, high bits as h2), not two halves of the
        // same 64-bit half.
        let (lo, hi) = hash_halves(value, funnel, hasher);
        let h1 = lo as i64;
        let h2 = hi as i64;

        let mut c = h1;
        for slot in out.iter_mut().take(k as usize) {
            // Sign bit is masked off, not removed via absolute value: the
            // two behave identically except that `i64::MIN` cannot be
            // negated, and this scheme never needs to.
            let masked = (c as u64) & 0x7FFF_FFFF_FFFF_FFFF;
            *slot = (masked % m as u64) as usize;
            c = c.wrapping_add(h2);
        }
    }

    fn min_positions<T: ?Sized>(
        &self,
        value: &T,
        funnel: &impl Funnel<T>,
        hasher: &impl Hasher128,
        m: usize,
        k: u32,
        get_cell: impl Fn(usize) -> u64,
        positions_buf: &mut [usize],
        out_min_buf: &mut [usize],
    ) -> usize {
        self.positions(value, funnel, hasher, m, k, positions_buf);
        let k = k as usize;
        let mut min_val = get_cell(positions_buf[0]);
        let mut count = 1;
        out_min_buf[0] = positions_buf[0];

        for &p in &positions_buf[1..k] {
            let v = get_cell(p);
            if v < min_val {
                min_val = v;
                out_min_buf[0] = p;
                count = 1;
            } else if v == min_val {
                out_min_buf[count] = p;
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::U64Funnel;
    use crate::hash128::Murmur3X64128;

    #[test]
    fn v32_positions_are_in_range_and_deterministic() {
        let s = V32Strategy;
        let hasher = Murmur3X64128::new();
        let funnel = U64Funnel;
        let mut a = [0usize; 7];
        let mut b = [0usize; 7];
        s.positions(&42u64, &funnel, &hasher, 1000, 7, &mut a);
        s.positions(&42u64, &funnel, &hasher, 1000, 7, &mut b);
        assert_eq!(a, b);
        assert!(a.iter().all(|&p| p < 1000));
    }

    #[test]
    fn v64_positions_are_in_range_and_deterministic() {
        let s = V64Strategy;
        let hasher = Murmur3X64128::new();
        let funnel = U64Funnel;
        let mut a = [0usize; 7];
        let mut b = [0usize; 7];
        s.positions(&42u64, &funnel, &hasher, 1000, 7, &mut a);
        s.positions(&42u64, &funnel, &hasher, 1000, 7, &mut b);
        assert_eq!(a, b);
        assert!(a.iter().all(|&p| p < 1000));
    }

    #[test]
    fn ordinals_are_distinct() {
        assert_ne!(V32Strategy.ordinal(), V64Strategy.ordinal());
    }

    #[test]
    fn v64_min_positions_finds_the_minimum_cell() {
        let cells = [5u64, 1, 1, 9];
        let s = V64Strategy;
        let hasher = Murmur3X64128::new();
        let funnel = U64Funnel;
        let mut positions_buf = [0usize; 4];
        let mut out = [0usize; 4];
        let count = s.min_positions(
            &1u64,
            &funnel,
            &hasher,
            4,
            4,
            |p| cells[p],
            &mut positions_buf,
            &mut out,
        );
        // Whatever positions the hash picked, the reported minimum value
        // across them must equal the true minimum among those cells.
        let reported_min = out[..count].iter().map(|&p| cells[p]).min().unwrap();
        let true_min = positions_buf.iter().map(|&p| cells[p]).min().unwrap();
        assert_eq!(reported_min, true_min);
    }

    #[test]
    fn might_contain_false_when_any_position_unset() {
        let s = V32Strategy;
        let hasher = Murmur3X64128::new();
        let funnel = U64Funnel;
        let mut buf = [0usize; 5];
        let contains = s.might_contain(&1u64, &funnel, &hasher, 10_000, 5, |_| false, &mut buf);
        assert!(!contains);
    }
}

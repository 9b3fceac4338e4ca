//! Bit-packed counting and spectral membership filters.
//!
//! # Architecture
//!
//! Storage is layered bottom-up:
//!
//! - [`words`] — a flat, word-addressable bit buffer with no notion of
//!   "bit" vs. "cell"; everything above this module is built on
//!   `get_bits`/`set_bits`/`xor_bits` over a possibly word-straddling span.
//! - [`bitset`] — a dense `BitSet` over that buffer, used both as a
//!   membership set and, internally, as a per-batch transaction cache.
//! - [`cellarray`] — a `CellArray` of saturating `b`-bit counters over that
//!   same buffer, one cell per hash position.
//! - [`hash128`] and [`funnel`] — the two injected collaborators a caller
//!   supplies: a 128-bit hash primitive and a byte serialization of the
//!   element type.
//! - [`strategy`] — double-hashing schemes that turn one 128-bit hash into
//!   `k` cell positions, and the per-element "minimum" scan the spectral
//!   filter needs.
//! - [`filter`] — the public facade: [`filter::CountingFilter`] and
//!   [`filter::SpectralFilter`], sharing one [`filter::Filter`] core.
//!
//! # Concurrency
//!
//! Every mutating method takes `&mut self`. This crate makes no attempt at
//! internal synchronization; callers needing concurrent access must
//! serialize writers themselves (e.g. behind a `Mutex`), the same way a
//! `Vec` or `HashMap` would be used from multiple threads.

#![warn(missing_docs)]

mod bitset;
mod cellarray;
pub mod error;
pub mod filter;
pub mod funnel;
pub mod hash128;
mod strategy;
mod words;

pub use bitset::{BitSet, ClearingIter};
pub use cellarray::{CellArray, ClearingCursor, Cursor};
pub use error::{Result, SketchError};
pub use filter::{optimal_num_cells, optimal_num_hashes, CountingFilter, Filter, FilterMetrics, SpectralFilter, MAX_K};
pub use funnel::{BytesFunnel, ByteSink, Funnel, I64Funnel, StrFunnel, U64Funnel};
pub use hash128::{Hasher128, Murmur3X64128};
#[cfg(feature = "blake3-hasher")]
pub use hash128::Blake3Hash128;
pub use strategy::{HashStrategy, V32Strategy, V64Strategy};

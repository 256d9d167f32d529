//! Systematic Reed-Solomon erasure codec over GF(2^8).
//!
//! This crate provides:
//! - [`Codec`] — build a `(k, n)` code, produce any shard by index, and
//!   reconstruct the `k` source shards in place from any `k` received
//!   shards.
//! - [`encode_chunk`] / [`decode_chunk`] — split one buffer into a block
//!   of shards and reassemble it from any `k` of them.
//! - [`suggest_params`] — recommend `(k, n)` for a given cluster size.
//!
//! The code is block-synchronous and stateless across blocks: each block
//! of `k` equal-size shards is encoded and decoded independently. The
//! first `k` shards of a block equal the sources byte for byte, so the
//! common no-loss path never touches the field arithmetic.
//!
//! The generator matrix is derived from a Vandermonde matrix over GF(2^8)
//! with polynomial 0x11D and is bit-compatible with other codecs using
//! the same construction; see [`reef_gf`] for the field details.
//!
//! Codecs are cheap to build (`O(k^2 + (n-k) k^2)` table work) and
//! immutable afterwards; share one instance across threads and encode
//! concurrently into distinct output buffers.

mod chunk;
mod codec;
mod config;
mod error;
mod matrix;

pub use chunk::{decode_chunk, encode_chunk, Shard};
pub use codec::Codec;
pub use config::{suggest_params, ParamsSuggestion};
pub use error::CodecError;

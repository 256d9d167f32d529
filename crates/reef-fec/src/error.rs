//! Error types for codec operations.

/// Errors that can occur while constructing a codec or encoding/decoding
/// a block.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Codec parameters outside `1 <= k <= n <= 256`.
    #[error("invalid parameters: k={k}, n={n} (need 1 <= k <= n <= 256)")]
    InvalidParameters {
        /// Requested number of source shards.
        k: usize,
        /// Requested total number of shards.
        n: usize,
    },

    /// A shard index at or beyond `n`.
    #[error("shard index {index} out of range for n={n}")]
    InvalidIndex {
        /// The offending index.
        index: usize,
        /// Total number of shards in the code.
        n: usize,
    },

    /// Two received shards claim the same source slot.
    #[error("two shards claim source slot {index}")]
    DuplicateIndex {
        /// The source slot claimed twice.
        index: usize,
    },

    /// The decode matrix could not be inverted. With distinct in-range
    /// indices this indicates corrupted input.
    #[error("decode matrix is singular")]
    SingularMatrix,

    /// An operation was handed the wrong number of shards.
    #[error("wrong shard count: need {needed}, got {got}")]
    WrongShardCount {
        /// Shards the operation requires (k).
        needed: usize,
        /// Shards actually provided.
        got: usize,
    },

    /// Not enough distinct shards were provided to reconstruct a chunk.
    #[error("not enough shards: need {needed}, got {got}")]
    NotEnoughShards {
        /// Minimum distinct shards required (k).
        needed: usize,
        /// Distinct shards actually provided.
        got: usize,
    },

    /// All shards in one block must have the same size.
    #[error("shard size mismatch: expected {expected}, got {got}")]
    ShardSizeMismatch {
        /// Size implied by the first shard or output buffer.
        expected: usize,
        /// Size of the offending shard.
        got: usize,
    },

    /// Zero-length shards are not allowed.
    #[error("shards must be non-empty")]
    EmptyShard,

    /// The input chunk was empty.
    #[error("cannot encode an empty chunk")]
    EmptyChunk,
}

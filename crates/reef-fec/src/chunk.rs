//! Chunk-level convenience layer.
//!
//! Callers that hold one contiguous buffer can split it into a block of
//! `k` equal shards, produce all `n` coded shards, and later reassemble
//! the buffer from any `k` of them. Everything stays within a single
//! block; shard identity and integrity are the caller's concern.

use bytes::Bytes;
use tracing::debug;

use crate::codec::Codec;
use crate::error::CodecError;

/// One coded shard of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    /// Position in the coding scheme: `0..k` source, `k..n` parity.
    pub index: u8,
    /// The shard bytes.
    pub data: Bytes,
}

/// Encode a chunk into all `n` shards of one block.
///
/// The chunk is split into `k` shards of `ceil(len / k)` bytes, the last
/// one zero-padded. Returns the shards (source shards first) and the
/// original chunk length, which [`decode_chunk`] needs to strip the
/// padding again.
pub fn encode_chunk(codec: &Codec, chunk: &[u8]) -> Result<(Vec<Shard>, usize), CodecError> {
    if chunk.is_empty() {
        return Err(CodecError::EmptyChunk);
    }

    let k = codec.k();
    let n = codec.n();
    let original_size = chunk.len();
    let shard_size = original_size.div_ceil(k);

    let mut padded = Vec::with_capacity(k * shard_size);
    padded.extend_from_slice(chunk);
    padded.resize(k * shard_size, 0);

    let sources: Vec<&[u8]> = padded.chunks_exact(shard_size).collect();
    debug_assert_eq!(sources.len(), k);

    let mut shards = Vec::with_capacity(n);
    let mut out = vec![0u8; shard_size];
    for index in 0..n {
        codec.encode(&sources, &mut out, index)?;
        shards.push(Shard {
            index: index as u8,
            data: Bytes::copy_from_slice(&out),
        });
    }

    debug!(k, n, original_size, shard_size, "encoded chunk into shards");
    Ok((shards, original_size))
}

/// Reassemble a chunk from at least `k` of its shards.
///
/// `shards` holds `(index, data)` pairs in any order; duplicates and
/// surplus shards are ignored. `original_size` is the length returned by
/// [`encode_chunk`].
pub fn decode_chunk(
    codec: &Codec,
    shards: &[(u8, Vec<u8>)],
    original_size: usize,
) -> Result<Vec<u8>, CodecError> {
    let k = codec.k();

    // Pick the first k distinct indices.
    let mut seen = [false; Codec::MAX_SHARDS];
    let mut selected: Vec<(usize, &[u8])> = Vec::with_capacity(k);
    for (index, data) in shards {
        let index = *index as usize;
        if seen[index] {
            continue;
        }
        seen[index] = true;
        selected.push((index, data.as_slice()));
        if selected.len() == k {
            break;
        }
    }
    if selected.len() < k {
        return Err(CodecError::NotEnoughShards {
            needed: k,
            got: selected.len(),
        });
    }

    let shard_size = selected[0].1.len();
    if shard_size == 0 {
        return Err(CodecError::EmptyShard);
    }
    for &(_, data) in &selected {
        if data.len() != shard_size {
            return Err(CodecError::ShardSizeMismatch {
                expected: shard_size,
                got: data.len(),
            });
        }
    }

    debug!(
        k,
        n = codec.n(),
        sources = selected.iter().filter(|&&(i, _)| i < k).count(),
        original_size,
        "decoding chunk from shards"
    );

    // All k sources present: plain reassembly, no matrix work.
    if selected.iter().all(|&(index, _)| index < k) {
        let mut chunk = vec![0u8; k * shard_size];
        for &(index, data) in &selected {
            chunk[index * shard_size..(index + 1) * shard_size].copy_from_slice(data);
        }
        chunk.truncate(original_size);
        return Ok(chunk);
    }

    let mut indexes: Vec<usize> = selected.iter().map(|&(index, _)| index).collect();
    let mut bufs: Vec<Vec<u8>> = selected.iter().map(|&(_, data)| data.to_vec()).collect();
    codec.decode(&mut bufs, &mut indexes)?;

    let mut chunk = Vec::with_capacity(k * shard_size);
    for buf in &bufs {
        chunk.extend_from_slice(buf);
    }
    chunk.truncate(original_size);
    Ok(chunk)
}

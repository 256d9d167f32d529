//! The systematic Reed-Solomon codec.

use tracing::debug;

use reef_gf::{addmul_k, exp};

use crate::error::CodecError;
use crate::matrix::{invert_mat, invert_vdm, matmul};

/// A systematic Reed-Solomon code over GF(2^8) with `k` source shards and
/// `n` total shards.
///
/// The first `k` output shards equal the sources; the remaining `n - k`
/// are parity. Any `k` of the `n` shards reconstruct the originals.
///
/// Construction builds the `n x k` encoding matrix from a Vandermonde
/// matrix; after that the codec is immutable, so one instance can serve
/// concurrent [`encode`](Codec::encode) calls from any number of threads.
pub struct Codec {
    k: usize,
    n: usize,
    /// Row-major `n x k`. Top `k` rows are the identity, the rest are the
    /// parity rows of the systematic generator.
    enc_matrix: Vec<u8>,
}

impl Codec {
    /// Largest supported shard count; GF(2^8) has 256 distinct
    /// evaluation points.
    pub const MAX_SHARDS: usize = 256;

    /// Build a codec for `k` source shards out of `n` total.
    ///
    /// Fails with [`CodecError::InvalidParameters`] unless
    /// `1 <= k <= n <= 256`.
    pub fn new(k: usize, n: usize) -> Result<Self, CodecError> {
        if k < 1 || k > n || n > Self::MAX_SHARDS {
            return Err(CodecError::InvalidParameters { k, n });
        }

        // Vandermonde matrix with one row per shard index. Row 0 cannot
        // come from the exp table (0^0 is taken as 1 here); rows r >= 1
        // hold powers of 2^(r-1). This exact convention is what makes
        // the generator bit-compatible with other implementations of the
        // same code.
        let mut vdm = vec![0u8; n * k];
        vdm[0] = 1;
        for row in 1..n {
            for col in 0..k {
                vdm[row * k + col] = exp((row - 1) * col);
            }
        }

        // Systematize: invert the top k x k block, multiply it into the
        // bottom n-k rows, and put the identity on top.
        invert_vdm(&mut vdm[..k * k], k);
        let mut enc_matrix = vec![0u8; n * k];
        let (top_inv, bottom) = vdm.split_at(k * k);
        matmul(bottom, top_inv, &mut enc_matrix[k * k..], n - k, k, k);
        for i in 0..k {
            enc_matrix[i * k + i] = 1;
        }

        debug!(k, n, "built systematic encoding matrix");
        Ok(Self { k, n, enc_matrix })
    }

    /// Number of source shards.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Total number of shards.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of parity shards (`n - k`).
    pub fn parity_count(&self) -> usize {
        self.n - self.k
    }

    /// Produce the shard at `index` from the `k` source shards.
    ///
    /// For `index < k` this is a copy of `src[index]`; otherwise `out` is
    /// filled with the parity combination from the matching generator
    /// row. `out` and every source must share one non-zero length.
    pub fn encode<S: AsRef<[u8]>>(
        &self,
        src: &[S],
        out: &mut [u8],
        index: usize,
    ) -> Result<(), CodecError> {
        if index >= self.n {
            return Err(CodecError::InvalidIndex {
                index,
                n: self.n,
            });
        }
        if src.len() != self.k {
            return Err(CodecError::WrongShardCount {
                needed: self.k,
                got: src.len(),
            });
        }
        let sz = out.len();
        if sz == 0 {
            return Err(CodecError::EmptyShard);
        }
        for s in src {
            let got = s.as_ref().len();
            if got != sz {
                return Err(CodecError::ShardSizeMismatch { expected: sz, got });
            }
        }

        if index < self.k {
            out.copy_from_slice(src[index].as_ref());
        } else {
            out.fill(0);
            addmul_k(
                out,
                src,
                &self.enc_matrix[index * self.k..(index + 1) * self.k],
            );
        }
        Ok(())
    }

    /// Reconstruct the `k` source shards in place from any `k` received
    /// shards.
    ///
    /// `indexes[i]` names which shard `shards[i]` is. Both slices are
    /// permuted during decoding; on success `shards[i]` holds source
    /// shard `i` for every `i`. Entries that arrived as parity are
    /// overwritten with the recovered data.
    pub fn decode<S>(&self, shards: &mut [S], indexes: &mut [usize]) -> Result<(), CodecError>
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        let k = self.k;
        if shards.len() != k {
            return Err(CodecError::WrongShardCount {
                needed: k,
                got: shards.len(),
            });
        }
        if indexes.len() != k {
            return Err(CodecError::WrongShardCount {
                needed: k,
                got: indexes.len(),
            });
        }
        let sz = shards[0].as_ref().len();
        if sz == 0 {
            return Err(CodecError::EmptyShard);
        }
        for s in shards.iter() {
            let got = s.as_ref().len();
            if got != sz {
                return Err(CodecError::ShardSizeMismatch { expected: sz, got });
            }
        }
        for &index in indexes.iter() {
            if index >= self.n {
                return Err(CodecError::InvalidIndex {
                    index,
                    n: self.n,
                });
            }
        }

        shuffle(shards, indexes, k)?;
        let dec_matrix = self.build_decode_matrix(indexes)?;

        // Every parity position is reconstructed into scratch before any
        // write-back: a recovered shard must not replace an input that a
        // later reconstruction still reads.
        let mut recovered: Vec<(usize, Vec<u8>)> = Vec::new();
        for row in 0..k {
            if indexes[row] >= k {
                let mut buf = vec![0u8; sz];
                addmul_k(&mut buf, shards, &dec_matrix[row * k..(row + 1) * k]);
                recovered.push((row, buf));
            }
        }

        let missing = recovered.len();
        for (row, buf) in recovered {
            shards[row].as_mut().copy_from_slice(&buf);
        }

        debug!(k, n = self.n, recovered = missing, "decoded block in place");
        Ok(())
    }

    /// Rows of the generator for the received indices, inverted. After
    /// the shuffle every `indexes[i] < k` satisfies `indexes[i] == i`,
    /// so those rows are unit vectors.
    fn build_decode_matrix(&self, indexes: &[usize]) -> Result<Vec<u8>, CodecError> {
        let k = self.k;
        let mut m = vec![0u8; k * k];
        for (row, &index) in indexes.iter().enumerate() {
            if index < k {
                m[row * k + row] = 1;
            } else {
                m[row * k..(row + 1) * k]
                    .copy_from_slice(&self.enc_matrix[index * k..(index + 1) * k]);
            }
        }
        invert_mat(&mut m, k)?;
        Ok(m)
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("k", &self.k)
            .field("n", &self.n)
            .finish_non_exhaustive()
    }
}

/// Move every shard whose index is a source position to that position.
///
/// Walks the block swapping shards home; a slot whose occupant already
/// claims it means two shards carry the same source index.
fn shuffle<S>(shards: &mut [S], indexes: &mut [usize], k: usize) -> Result<(), CodecError> {
    let mut i = 0;
    while i < k {
        if indexes[i] >= k || indexes[i] == i {
            i += 1;
        } else {
            let home = indexes[i];
            if indexes[home] == home {
                return Err(CodecError::DuplicateIndex { index: home });
            }
            indexes.swap(i, home);
            shards.swap(i, home);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn encode_all(codec: &Codec, src: &[Vec<u8>], sz: usize) -> Vec<Vec<u8>> {
        (0..codec.n())
            .map(|index| {
                let mut out = vec![0u8; sz];
                codec.encode(src, &mut out, index).unwrap();
                out
            })
            .collect()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            Codec::new(0, 1),
            Err(CodecError::InvalidParameters { .. })
        ));
        assert!(matches!(
            Codec::new(5, 4),
            Err(CodecError::InvalidParameters { .. })
        ));
        assert!(matches!(
            Codec::new(2, 257),
            Err(CodecError::InvalidParameters { .. })
        ));
        assert!(Codec::new(1, 1).is_ok());
        assert!(Codec::new(256, 256).is_ok());
    }

    #[test]
    fn generator_top_is_identity() {
        for (k, n) in [(1, 1), (3, 5), (4, 8), (16, 32)] {
            let codec = Codec::new(k, n).unwrap();
            for row in 0..k {
                for col in 0..k {
                    let expected = u8::from(row == col);
                    assert_eq!(codec.enc_matrix[row * k + col], expected, "k={k}, n={n}");
                }
            }
        }
    }

    // Parity rows must match the reference construction exactly; these
    // values pin the generator for interoperability.
    #[test]
    fn generator_parity_rows_reference_values() {
        let codec = Codec::new(3, 5).unwrap();
        assert_eq!(codec.enc_matrix[9..15], [0x0F, 0x08, 0x06, 0x2D, 0x30, 0x1C]);

        let codec = Codec::new(4, 6).unwrap();
        assert_eq!(
            codec.enc_matrix[16..24],
            [0x77, 0x40, 0x38, 0x0E, 0xC7, 0xA7, 0x0D, 0x6C]
        );
    }

    #[test]
    fn single_shard_roundtrip() {
        let codec = Codec::new(1, 1).unwrap();
        let src = vec![vec![0x11u8, 0x22, 0x33, 0x44]];

        let mut out = vec![0u8; 4];
        codec.encode(&src, &mut out, 0).unwrap();
        assert_eq!(out, [0x11, 0x22, 0x33, 0x44]);

        let mut shards = vec![out];
        let mut indexes = vec![0usize];
        codec.decode(&mut shards, &mut indexes).unwrap();
        assert_eq!(shards[0], [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn systematic_prefix_equals_sources() {
        let codec = Codec::new(4, 7).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let src: Vec<Vec<u8>> = (0..4)
            .map(|_| {
                let mut s = vec![0u8; 100];
                rng.fill(&mut s[..]);
                s
            })
            .collect();
        for index in 0..4 {
            let mut out = vec![0u8; 100];
            codec.encode(&src, &mut out, index).unwrap();
            assert_eq!(out, src[index]);
        }
    }

    #[test]
    fn encode_is_deterministic() {
        let codec_a = Codec::new(5, 9).unwrap();
        let codec_b = Codec::new(5, 9).unwrap();
        let src: Vec<Vec<u8>> = (0..5).map(|i| vec![i as u8 * 31 + 1; 64]).collect();
        for index in 0..9 {
            let mut out_a = vec![0u8; 64];
            let mut out_b = vec![0u8; 64];
            codec_a.encode(&src, &mut out_a, index).unwrap();
            codec_b.encode(&src, &mut out_b, index).unwrap();
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn known_parity_bytes() {
        let codec = Codec::new(3, 5).unwrap();
        let src = vec![vec![0x01u8], vec![0x02], vec![0x03]];
        let shards = encode_all(&codec, &src, 1);
        assert_eq!(shards, [[0x01], [0x02], [0x03], [0x15], [0x69]]);
    }

    #[test]
    fn decode_from_parity_only_subset() {
        let codec = Codec::new(3, 5).unwrap();
        let src = vec![vec![0x01u8], vec![0x02], vec![0x03]];
        let shards = encode_all(&codec, &src, 1);

        let mut received = vec![shards[1].clone(), shards[3].clone(), shards[4].clone()];
        let mut indexes = vec![1usize, 3, 4];
        codec.decode(&mut received, &mut indexes).unwrap();
        assert_eq!(received, src);
    }

    #[test]
    fn parity_is_nonzero_for_nonzero_input() {
        let codec = Codec::new(2, 4).unwrap();
        let src = vec![vec![0u8; 8], vec![0xFFu8; 8]];
        let shards = encode_all(&codec, &src, 8);

        assert!(shards[2].iter().any(|&b| b != 0));
        assert!(shards[3].iter().any(|&b| b != 0));

        let mut received = vec![shards[2].clone(), shards[3].clone()];
        let mut indexes = vec![2usize, 3];
        codec.decode(&mut received, &mut indexes).unwrap();
        assert_eq!(received, src);
    }

    #[test]
    fn every_k_subset_decodes() {
        let k = 4;
        let n = 8;
        let sz = 1024;
        let codec = Codec::new(k, n).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let src: Vec<Vec<u8>> = (0..k)
            .map(|_| {
                let mut s = vec![0u8; sz];
                rng.fill(&mut s[..]);
                s
            })
            .collect();
        let shards = encode_all(&codec, &src, sz);

        // All C(8,4) = 70 subsets.
        let mut subsets = 0;
        for a in 0..n {
            for b in (a + 1)..n {
                for c in (b + 1)..n {
                    for d in (c + 1)..n {
                        let mut received = vec![
                            shards[a].clone(),
                            shards[b].clone(),
                            shards[c].clone(),
                            shards[d].clone(),
                        ];
                        let mut indexes = vec![a, b, c, d];
                        codec.decode(&mut received, &mut indexes).unwrap();
                        assert_eq!(received, src, "subset [{a},{b},{c},{d}]");
                        subsets += 1;
                    }
                }
            }
        }
        assert_eq!(subsets, 70);
    }

    #[test]
    fn decode_accepts_any_arrival_order() {
        let codec = Codec::new(3, 6).unwrap();
        let src: Vec<Vec<u8>> = (0..3).map(|i| vec![0x40 + i as u8; 17]).collect();
        let shards = encode_all(&codec, &src, 17);

        let mut received = vec![shards[5].clone(), shards[0].clone(), shards[4].clone()];
        let mut indexes = vec![5usize, 0, 4];
        codec.decode(&mut received, &mut indexes).unwrap();
        assert_eq!(received, src);
    }

    #[test]
    fn decode_rejects_duplicate_source_index() {
        let codec = Codec::new(10, 20).unwrap();
        let mut shards: Vec<Vec<u8>> = (0..10).map(|_| vec![0u8]).collect();
        let mut indexes = vec![0usize, 0, 1, 2, 3, 4, 5, 6, 7, 8];
        assert!(matches!(
            codec.decode(&mut shards, &mut indexes),
            Err(CodecError::DuplicateIndex { index: 0 })
        ));
    }

    #[test]
    fn decode_rejects_duplicate_parity_index() {
        let codec = Codec::new(2, 4).unwrap();
        let src = vec![vec![0xAAu8; 4], vec![0xBBu8; 4]];
        let shards = encode_all(&codec, &src, 4);

        // The same parity shard twice is not two equations.
        let mut received = vec![shards[3].clone(), shards[3].clone()];
        let mut indexes = vec![3usize, 3];
        assert!(matches!(
            codec.decode(&mut received, &mut indexes),
            Err(CodecError::SingularMatrix)
        ));
    }

    #[test]
    fn encode_rejects_out_of_range_index() {
        let codec = Codec::new(2, 4).unwrap();
        let src = vec![vec![1u8], vec![2u8]];
        let mut out = vec![0u8; 1];
        assert!(matches!(
            codec.encode(&src, &mut out, 4),
            Err(CodecError::InvalidIndex { index: 4, n: 4 })
        ));
    }

    #[test]
    fn decode_rejects_out_of_range_index() {
        let codec = Codec::new(2, 4).unwrap();
        let mut shards = vec![vec![1u8], vec![2u8]];
        let mut indexes = vec![0usize, 9];
        assert!(matches!(
            codec.decode(&mut shards, &mut indexes),
            Err(CodecError::InvalidIndex { index: 9, n: 4 })
        ));
    }

    #[test]
    fn encode_rejects_size_mismatch() {
        let codec = Codec::new(2, 3).unwrap();
        let src = vec![vec![1u8, 2], vec![3u8]];
        let mut out = vec![0u8; 2];
        assert!(matches!(
            codec.encode(&src, &mut out, 2),
            Err(CodecError::ShardSizeMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn encode_rejects_wrong_shard_count() {
        let codec = Codec::new(3, 5).unwrap();
        let src = vec![vec![1u8], vec![2u8]];
        let mut out = vec![0u8; 1];
        assert!(matches!(
            codec.encode(&src, &mut out, 0),
            Err(CodecError::WrongShardCount { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn encode_rejects_empty_shards() {
        let codec = Codec::new(1, 2).unwrap();
        let src = vec![Vec::<u8>::new()];
        let mut out = Vec::new();
        assert!(matches!(
            codec.encode(&src, &mut out, 0),
            Err(CodecError::EmptyShard)
        ));
    }

    #[test]
    fn max_width_code_is_identity() {
        let k = 256;
        let codec = Codec::new(k, k).unwrap();
        let src: Vec<Vec<u8>> = (0..k).map(|i| vec![i as u8]).collect();

        for index in 0..k {
            let mut out = vec![0u8; 1];
            codec.encode(&src, &mut out, index).unwrap();
            assert_eq!(out, src[index], "index {index}");
        }

        let mut shards = src.clone();
        let mut indexes: Vec<usize> = (0..k).collect();
        codec.decode(&mut shards, &mut indexes).unwrap();
        assert_eq!(shards, src);
    }

    #[test]
    fn decode_of_pure_source_block_is_noop_on_data() {
        let codec = Codec::new(3, 5).unwrap();
        let src: Vec<Vec<u8>> = (0..3).map(|i| vec![i as u8; 9]).collect();

        // Sources arriving out of order are shuffled home.
        let mut shards = vec![src[2].clone(), src[0].clone(), src[1].clone()];
        let mut indexes = vec![2usize, 0, 1];
        codec.decode(&mut shards, &mut indexes).unwrap();
        assert_eq!(shards, src);
        assert_eq!(indexes, [0, 1, 2]);
    }

    #[test]
    fn codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
    }

    #[test]
    fn concurrent_encodes_share_one_codec() {
        let codec = std::sync::Arc::new(Codec::new(4, 8).unwrap());
        let src: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8 + 1; 256]).collect();

        let mut expected = Vec::new();
        for index in 0..8 {
            let mut out = vec![0u8; 256];
            codec.encode(&src, &mut out, index).unwrap();
            expected.push(out);
        }

        let handles: Vec<_> = (0..8)
            .map(|index| {
                let codec = codec.clone();
                let src = src.clone();
                std::thread::spawn(move || {
                    let mut out = vec![0u8; 256];
                    codec.encode(&src, &mut out, index).unwrap();
                    out
                })
            })
            .collect();
        for (index, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), expected[index]);
        }
    }
}

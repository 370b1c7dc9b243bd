//! Base-`2^radix` decomposition of balances into fixed-width chunks.
//!
//! A 128-bit balance is too large to recover by discrete-log search, so
//! it is split into chunks that each fit a bounded search range. The
//! decomposition is "maximal radix": after extracting canonical digits,
//! value is greedily borrowed from high chunks into lower chunks until
//! every non-last chunk is either saturated or followed by a zero chunk.
//! This keeps the highest nonzero chunk (and hence the solver's search
//! range) as small as the amount allows.

use curve25519_dalek::scalar::Scalar;

use crate::errors::{Error, Result};
use crate::Balance;

/// One plaintext chunk value, always below `2^bits_per_chunk`.
pub type ChunkValue = u64;

/// The width of one radix digit before borrowing, in bits.
pub const RADIX_DECOMP_BITS: u32 = 16;
/// Total width of a balance, in bits.
pub const BALANCE_BITS: u32 = 128;
/// Upper bit-width bound of one chunk after borrowing; also the
/// kangaroo search range used to decrypt a chunk.
pub const BITS_PER_CHUNK: u32 = 32;
/// Number of chunks in the default decomposition.
pub const BALANCE_CHUNKS: u32 = BALANCE_BITS / RADIX_DECOMP_BITS;

/// The validated parameter triple of a decomposition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecompositionParams {
    pub radix_decomp_bits: u32,
    pub total_bits: u32,
    pub bits_per_chunk: u32,
}

impl Default for DecompositionParams {
    fn default() -> Self {
        Self {
            radix_decomp_bits: RADIX_DECOMP_BITS,
            total_bits: BALANCE_BITS,
            bits_per_chunk: BITS_PER_CHUNK,
        }
    }
}

impl DecompositionParams {
    pub fn new(radix_decomp_bits: u32, total_bits: u32, bits_per_chunk: u32) -> Result<Self> {
        let params = Self {
            radix_decomp_bits,
            total_bits,
            bits_per_chunk,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason| Error::InvalidDecompositionParameters { reason };
        if self.radix_decomp_bits == 0 {
            return Err(invalid("radix_decomp_bits must be positive"));
        }
        if self.total_bits == 0 {
            return Err(invalid("total_bits must be positive"));
        }
        if self.bits_per_chunk == 0 {
            return Err(invalid("bits_per_chunk must be positive"));
        }
        if self.total_bits % self.radix_decomp_bits != 0 {
            return Err(invalid("total_bits must be a multiple of radix_decomp_bits"));
        }
        if self.bits_per_chunk < self.radix_decomp_bits {
            return Err(invalid("bits_per_chunk must not be below radix_decomp_bits"));
        }
        if self.total_bits > Balance::BITS {
            return Err(invalid("total_bits exceeds the balance width"));
        }
        if self.bits_per_chunk > ChunkValue::BITS {
            return Err(invalid("bits_per_chunk exceeds the chunk width"));
        }
        Ok(())
    }

    pub fn chunk_count(&self) -> usize {
        (self.total_bits / self.radix_decomp_bits) as usize
    }

    /// `2^radix_decomp_bits`, one borrowing unit.
    fn radix_unit(&self) -> u128 {
        1u128 << self.radix_decomp_bits
    }

    /// `2^bits_per_chunk - 1`, the largest value one chunk may hold.
    fn chunk_ceiling(&self) -> u128 {
        if self.bits_per_chunk == ChunkValue::BITS {
            ChunkValue::MAX as u128
        } else {
            (1u128 << self.bits_per_chunk) - 1
        }
    }

    fn amount_in_range(&self, amount: Balance) -> bool {
        self.total_bits == Balance::BITS || amount >> self.total_bits == 0
    }
}

/// An ordered sequence of plaintext chunk values together with the
/// parameters that produced it, least-significant chunk first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkedAmount {
    chunks: Vec<ChunkValue>,
    params: DecompositionParams,
}

impl ChunkedAmount {
    /// Decomposes `amount` into `total_bits / radix_decomp_bits` chunks
    /// and normalizes them to the maximal-radix form.
    ///
    /// Deterministic: the borrow pass always runs least-significant
    /// first, so equal inputs produce equal chunk sequences.
    pub fn decompose(amount: Balance, params: DecompositionParams) -> Result<Self> {
        params.validate()?;
        if !params.amount_in_range(amount) {
            return Err(Error::ValueOutOfRange {
                bits: params.total_bits,
            });
        }

        let count = params.chunk_count();
        let radix_mask = params.radix_unit() - 1;
        let mut chunks: Vec<u128> = (0..count)
            .map(|i| (amount >> (params.radix_decomp_bits as usize * i)) & radix_mask)
            .collect();

        // Greedy borrow-down to a fixed point.
        let ceiling = params.chunk_ceiling();
        let unit = params.radix_unit();
        loop {
            let mut changed = false;
            for i in 0..count.saturating_sub(1) {
                let room = ceiling - chunks[i];
                if room >= unit {
                    let transfer = chunks[i + 1].min(room >> params.radix_decomp_bits);
                    if transfer > 0 {
                        chunks[i] += transfer << params.radix_decomp_bits;
                        chunks[i + 1] -= transfer;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        Ok(Self {
            // Chunks are bounded by `chunk_ceiling`, which fits a ChunkValue.
            chunks: chunks.into_iter().map(|c| c as ChunkValue).collect(),
            params,
        })
    }

    /// Wraps already-solved chunk values (e.g. from decryption) without
    /// re-normalizing them.
    pub fn from_chunks(chunks: Vec<ChunkValue>, params: DecompositionParams) -> Result<Self> {
        params.validate()?;
        if chunks.len() != params.chunk_count() {
            return Err(Error::InvalidDecompositionParameters {
                reason: "chunk count does not match the decomposition parameters",
            });
        }
        let ceiling = params.chunk_ceiling();
        if chunks.iter().any(|c| (*c as u128) > ceiling) {
            return Err(Error::ValueOutOfRange {
                bits: params.bits_per_chunk,
            });
        }
        Ok(Self { chunks, params })
    }

    pub fn chunks(&self) -> &[ChunkValue] {
        &self.chunks
    }

    pub fn params(&self) -> DecompositionParams {
        self.params
    }

    /// Chunk values as scalars, ready for per-chunk encryption.
    pub fn scalars(&self) -> Vec<Scalar> {
        self.chunks.iter().map(|c| Scalar::from(*c)).collect()
    }

    /// `Σ chunks[i] * 2^(radix_decomp_bits * i)`, the exact inverse of
    /// `decompose` for any normalized or canonical chunk sequence.
    pub fn recompose(&self) -> Result<Balance> {
        recompose_chunks(&self.chunks, self.params.radix_decomp_bits)
    }
}

/// Recomposes chunk values with the given radix. Pure; fails with
/// `ValueOutOfRange` if the weighted sum overflows the balance width.
pub fn recompose_chunks(chunks: &[ChunkValue], radix_decomp_bits: u32) -> Result<Balance> {
    if radix_decomp_bits == 0 || radix_decomp_bits > Balance::BITS {
        return Err(Error::InvalidDecompositionParameters {
            reason: "radix_decomp_bits must be positive and within the balance width",
        });
    }
    let out_of_range = Error::ValueOutOfRange {
        bits: Balance::BITS,
    };
    let mut total: Balance = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        if *chunk == 0 {
            continue;
        }
        let shift = radix_decomp_bits
            .checked_mul(i as u32)
            .filter(|s| *s < Balance::BITS)
            .ok_or(out_of_range.clone())?;
        let weighted = (*chunk as Balance)
            .checked_shl(shift)
            .filter(|w| w >> shift == *chunk as Balance)
            .ok_or(out_of_range.clone())?;
        total = total.checked_add(weighted).ok_or(out_of_range.clone())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use wasm_bindgen_test::*;

    fn assert_maximal_radix(amount: &ChunkedAmount) {
        let params = amount.params();
        let ceiling = (1u128 << params.bits_per_chunk) - 1;
        let unit = 1u128 << params.radix_decomp_bits;
        let chunks = amount.chunks();
        for i in 0..chunks.len() - 1 {
            assert!(
                chunks[i] as u128 + unit > ceiling || chunks[i + 1] == 0,
                "chunk {i} is not saturated but chunk {} is nonzero",
                i + 1
            );
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn canonical_digits_round_trip() {
        let params = DecompositionParams::default();
        for amount in [0u128, 1, 0xffff, 0x1_0000, u64::MAX as u128, u128::MAX] {
            let decomposed = ChunkedAmount::decompose(amount, params).unwrap();
            assert_eq!(decomposed.chunks().len(), BALANCE_CHUNKS as usize);
            assert_eq!(decomposed.recompose().unwrap(), amount);
            assert_maximal_radix(&decomposed);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn zero_decomposes_to_all_zero_chunks() {
        let decomposed =
            ChunkedAmount::decompose(0, DecompositionParams::default()).unwrap();
        assert!(decomposed.chunks().iter().all(|c| *c == 0));
        assert_eq!(decomposed.recompose().unwrap(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn max_value_saturates_low_chunks() {
        let params = DecompositionParams::new(16, 128, 32).unwrap();
        let decomposed = ChunkedAmount::decompose(u128::MAX, params).unwrap();
        assert_eq!(decomposed.chunks().len(), 8);
        // The low chunks hold as much as they can; the tail collapses to zero.
        assert_eq!(decomposed.chunks()[0], u32::MAX as u64);
        assert_eq!(*decomposed.chunks().last().unwrap(), 0);
        assert_eq!(decomposed.recompose().unwrap(), u128::MAX);
        assert_maximal_radix(&decomposed);
    }

    #[test]
    #[wasm_bindgen_test]
    fn chunk_bounds_hold_after_borrowing() {
        let params = DecompositionParams::new(8, 64, 16).unwrap();
        for amount in [0u128, 0xff, 0xffff_ffff, (1u128 << 64) - 1] {
            let decomposed = ChunkedAmount::decompose(amount, params).unwrap();
            assert_eq!(decomposed.chunks().len(), 8);
            for chunk in decomposed.chunks() {
                assert!(*chunk < 1 << 16);
            }
            assert_eq!(decomposed.recompose().unwrap(), amount);
            assert_maximal_radix(&decomposed);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn rejects_amount_above_total_bits() {
        let params = DecompositionParams::new(16, 64, 32).unwrap();
        assert_eq!(
            ChunkedAmount::decompose(1u128 << 64, params),
            Err(Error::ValueOutOfRange { bits: 64 })
        );
        // The largest representable amount is fine.
        assert!(ChunkedAmount::decompose((1u128 << 64) - 1, params).is_ok());
    }

    #[test]
    #[wasm_bindgen_test]
    fn rejects_inconsistent_params() {
        for (radix, total, per_chunk) in [
            (0u32, 128u32, 32u32),
            (16, 0, 32),
            (16, 128, 0),
            (24, 128, 32),
            (16, 128, 8),
            (16, 192, 32),
        ] {
            assert!(
                DecompositionParams::new(radix, total, per_chunk).is_err(),
                "({radix}, {total}, {per_chunk}) should be rejected"
            );
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn recompose_is_deterministic() {
        let chunks = vec![7u64, 0xffff, 3, 0, 0, 0, 0, 1];
        let a = recompose_chunks(&chunks, 16).unwrap();
        let b = recompose_chunks(&chunks, 16).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    #[wasm_bindgen_test]
    fn recompose_rejects_overflow() {
        // A saturated chunk at the top weight overflows 128 bits.
        let mut chunks = vec![0u64; 8];
        chunks[7] = u32::MAX as u64;
        chunks[0] = u32::MAX as u64;
        // 2^112 * (2^32 - 1) + ... > 2^128 - 1.
        assert!(recompose_chunks(&chunks, 16).is_err());
    }

    #[test]
    #[wasm_bindgen_test]
    fn from_chunks_validates_count_and_bounds() {
        let params = DecompositionParams::new(16, 64, 32).unwrap();
        assert!(ChunkedAmount::from_chunks(vec![0; 3], params).is_err());
        assert!(ChunkedAmount::from_chunks(vec![1u64 << 32, 0, 0, 0], params).is_err());
        let ok = ChunkedAmount::from_chunks(vec![5, 0, 0, 0], params).unwrap();
        assert_eq!(ok.recompose().unwrap(), 5);
    }
}

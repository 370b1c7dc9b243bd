//! Chunked confidential amounts: the tie between the Elgamal cipher,
//! the chunk codec and the kangaroo solver.
//!
//! An amount is decomposed into chunks, each chunk encrypted as one
//! independent ciphertext under the same public key with its own
//! blinding. Decryption walks the pipeline backwards: per-chunk
//! `decrypt_to_point`, kangaroo solve per point, recompose.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use rand_core::{CryptoRng, RngCore};

use codec::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunked::{ChunkValue, ChunkedAmount, DecompositionParams},
    elgamal::{CipherText, CommitmentWitness, ElgamalPublicKey, ElgamalSecretKey, CIPHERTEXT_SIZE},
    errors::{Error, Result},
    kangaroo::KangarooTableCache,
    Balance, ElgamalKeys,
};

/// Smallest supported kangaroo regime that covers `span` values.
fn range_bits_for(span: u128) -> Result<u32> {
    for bits in [16u32, 32, 48, 64] {
        if span <= 1u128 << bits {
            return Ok(bits);
        }
    }
    Err(Error::InvalidDecompositionParameters {
        reason: "chunk search range exceeds 64 bits",
    })
}

/// An amount encrypted as an ordered sequence of chunk ciphertexts.
///
/// The chunk count is never inferred from context at decryption time;
/// every operation validates it against explicit parameters and fails
/// with `InvalidDecompositionParameters` on mismatch.
#[derive(Clone, Encode, Decode, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidentialAmount {
    chunks: Vec<CipherText>,
}

impl ConfidentialAmount {
    /// Encrypts `amount` with the default 16/128/32 decomposition.
    pub fn encrypt<R: RngCore + CryptoRng>(
        pub_key: &ElgamalPublicKey,
        amount: Balance,
        rng: &mut R,
    ) -> Result<Self> {
        Self::encrypt_with_params(pub_key, amount, DecompositionParams::default(), rng)
    }

    /// Encrypts each chunk with an independent random blinding.
    pub fn encrypt_with_params<R: RngCore + CryptoRng>(
        pub_key: &ElgamalPublicKey,
        amount: Balance,
        params: DecompositionParams,
        rng: &mut R,
    ) -> Result<Self> {
        let decomposed = ChunkedAmount::decompose(amount, params)?;
        let chunks = decomposed
            .scalars()
            .into_iter()
            .map(|value| pub_key.encrypt_value(value, rng).1)
            .collect();
        Ok(Self { chunks })
    }

    /// Encrypts with caller-supplied blindings, one per chunk.
    ///
    /// Deterministic; exists so tests can reproduce exact ciphertexts.
    /// The blinding count must match the chunk count of `params`.
    pub fn encrypt_with_blindings(
        pub_key: &ElgamalPublicKey,
        amount: Balance,
        params: DecompositionParams,
        blindings: &[Scalar],
    ) -> Result<Self> {
        let decomposed = ChunkedAmount::decompose(amount, params)?;
        if blindings.len() != params.chunk_count() {
            return Err(Error::InvalidDecompositionParameters {
                reason: "blinding count does not match the chunk count",
            });
        }
        let chunks = decomposed
            .scalars()
            .into_iter()
            .zip(blindings)
            .map(|(value, blinding)| pub_key.encrypt(&CommitmentWitness::new(value, *blinding)))
            .collect();
        Ok(Self { chunks })
    }

    /// The encryption of zero in every chunk, with zero blindings.
    pub fn zero(chunk_count: usize) -> Self {
        Self {
            chunks: vec![CipherText::zero(); chunk_count],
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[CipherText] {
        &self.chunks
    }

    /// Decrypts with the default decomposition parameters.
    pub fn decrypt(
        &self,
        secret: &ElgamalSecretKey,
        tables: &KangarooTableCache,
    ) -> Result<Balance> {
        self.decrypt_with_params(secret, tables, DecompositionParams::default())
    }

    /// Per-chunk point decryption, kangaroo solve and recomposition.
    ///
    /// The search range of every chunk is `[0, 2^bits_per_chunk)`. A
    /// chunk outside that range (wrong key, corrupted ciphertext, or an
    /// unnormalized sum of many amounts) fails with
    /// `DiscreteLogNotFound`; the range is never widened silently.
    pub fn decrypt_with_params(
        &self,
        secret: &ElgamalSecretKey,
        tables: &KangarooTableCache,
        params: DecompositionParams,
    ) -> Result<Balance> {
        params.validate()?;
        let ceiling = 1u128 << params.bits_per_chunk;
        self.decrypt_inner(secret, tables, params, (0, ceiling))
    }

    /// Narrows every chunk's search range to `[range.0, range.1)`.
    ///
    /// Purely a performance hint: when the true chunk values lie in the
    /// range the result equals `decrypt_with_params`, otherwise the
    /// solve fails instead of guessing.
    pub fn decrypt_with_hint(
        &self,
        secret: &ElgamalSecretKey,
        tables: &KangarooTableCache,
        params: DecompositionParams,
        range: (u128, u128),
    ) -> Result<Balance> {
        self.decrypt_inner(secret, tables, params, range)
    }

    fn decrypt_inner(
        &self,
        secret: &ElgamalSecretKey,
        tables: &KangarooTableCache,
        params: DecompositionParams,
        range: (u128, u128),
    ) -> Result<Balance> {
        params.validate()?;
        if self.chunks.len() != params.chunk_count() {
            return Err(Error::InvalidDecompositionParameters {
                reason: "ciphertext chunk count does not match the decomposition parameters",
            });
        }
        let (lower, upper) = range;
        if lower >= upper || upper > 1u128 << params.bits_per_chunk {
            return Err(Error::InvalidDecompositionParameters {
                reason: "chunk range hint is empty or wider than bits_per_chunk",
            });
        }

        let table = tables.get_or_build(range_bits_for(upper - lower)?)?;
        let points: Vec<RistrettoPoint> = self
            .chunks
            .iter()
            .map(|chunk| secret.decrypt_to_point(chunk))
            .collect();

        // Chunk searches are independent; fan out and reassemble by index.
        #[cfg(feature = "rayon")]
        let values = {
            use rayon::prelude::*;
            points
                .par_iter()
                .map(|point| table.solve_in_range(point, lower, upper).map(|v| v as ChunkValue))
                .collect::<Result<Vec<ChunkValue>>>()?
        };
        #[cfg(not(feature = "rayon"))]
        let values = points
            .iter()
            .map(|point| table.solve_in_range(point, lower, upper).map(|v| v as ChunkValue))
            .collect::<Result<Vec<ChunkValue>>>()?;

        ChunkedAmount::from_chunks(values, params)?.recompose()
    }

    /// Elementwise homomorphic addition: the sum decrypts to the sum of
    /// the plaintexts. Repeated additions can push a chunk past its
    /// search range; [`refresh`](Self::refresh) re-normalizes.
    pub fn add(&self, other: &Self) -> Result<Self> {
        if self.chunks.len() != other.chunks.len() {
            return Err(Error::InvalidDecompositionParameters {
                reason: "cannot combine ciphertexts with different chunk counts",
            });
        }
        Ok(Self {
            chunks: self
                .chunks
                .iter()
                .zip(&other.chunks)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Elementwise homomorphic subtraction.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        if self.chunks.len() != other.chunks.len() {
            return Err(Error::InvalidDecompositionParameters {
                reason: "cannot combine ciphertexts with different chunk counts",
            });
        }
        Ok(Self {
            chunks: self
                .chunks
                .iter()
                .zip(&other.chunks)
                .map(|(a, b)| a - b)
                .collect(),
        })
    }

    /// Decrypts and re-encrypts with fresh blindings, restoring the
    /// maximal-radix chunk form after homomorphic arithmetic.
    pub fn refresh<R: RngCore + CryptoRng>(
        &self,
        keys: &ElgamalKeys,
        tables: &KangarooTableCache,
        params: DecompositionParams,
        rng: &mut R,
    ) -> Result<Self> {
        let amount = self.decrypt_with_params(&keys.secret, tables, params)?;
        Self::encrypt_with_params(&keys.public, amount, params, rng)
    }

    /// Concatenation of the 64-byte chunk encodings, low chunk first.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.to_bytes())
            .collect()
    }

    /// Decodes ciphertext bytes fetched from chain storage. The chunk
    /// count is explicit; a length mismatch is a caller error, not a
    /// guess the engine makes.
    pub fn from_slice(bytes: &[u8], chunk_count: usize) -> Result<Self> {
        if chunk_count == 0 {
            return Err(Error::InvalidDecompositionParameters {
                reason: "chunk count must be positive",
            });
        }
        if bytes.len() != chunk_count * CIPHERTEXT_SIZE {
            return Err(Error::DecodeError);
        }
        let chunks = bytes
            .chunks_exact(CIPHERTEXT_SIZE)
            .map(CipherText::from_slice)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { chunks })
    }
}

/// The two per-account ciphertext columns: incoming transfers land in
/// `pending`, the owner folds them into `actual`. Each side decrypts
/// independently; nothing ties them together beyond both being valid
/// chunked amounts.
#[derive(Clone, Encode, Decode, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidentialBalance {
    pub pending: ConfidentialAmount,
    pub actual: ConfidentialAmount,
}

impl ConfidentialBalance {
    /// A fresh account balance: zero pending, zero actual.
    pub fn zero(chunk_count: usize) -> Self {
        Self {
            pending: ConfidentialAmount::zero(chunk_count),
            actual: ConfidentialAmount::zero(chunk_count),
        }
    }

    pub fn decrypt_pending(
        &self,
        secret: &ElgamalSecretKey,
        tables: &KangarooTableCache,
        params: DecompositionParams,
    ) -> Result<Balance> {
        self.pending.decrypt_with_params(secret, tables, params)
    }

    pub fn decrypt_actual(
        &self,
        secret: &ElgamalSecretKey,
        tables: &KangarooTableCache,
        params: DecompositionParams,
    ) -> Result<Balance> {
        self.actual.decrypt_with_params(secret, tables, params)
    }

    /// Folds pending into actual homomorphically, without decrypting.
    pub fn apply_pending(&mut self) -> Result<()> {
        self.actual = self.actual.add(&self.pending)?;
        self.pending = ConfidentialAmount::zero(self.pending.chunk_count());
        Ok(())
    }
}

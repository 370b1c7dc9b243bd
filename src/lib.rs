//! Confidential balances: twisted-Elgamal encryption of chunked
//! amounts over the Ristretto 25519 curve, decrypted with a bounded
//! Pollard-kangaroo discrete-log search.
//!
//! A balance of up to [`BALANCE_BITS`] bits is split into
//! [`BALANCE_CHUNKS`] chunks by a maximal-radix decomposition
//! ([`chunked`]), each chunk is encrypted independently ([`elgamal`]),
//! and decryption recovers each chunk with a precomputed kangaroo table
//! ([`kangaroo`]). [`ConfidentialAmount`] drives the whole pipeline.
//!
//! The crate has no transport concerns: ciphertext bytes come in,
//! amounts go out. Fetching ciphertexts from a chain and submitting
//! transactions belong to the surrounding SDK.

use rand_core::{CryptoRng, RngCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode};

pub use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};

#[macro_use]
pub(crate) mod macros;

pub mod errors;

pub mod balance;
pub mod chunked;
pub mod codec_wrapper;
pub mod elgamal;
pub mod kangaroo;

pub mod testing;

pub use balance::{ConfidentialAmount, ConfidentialBalance};
pub use chunked::{
    ChunkValue, ChunkedAmount, DecompositionParams, BALANCE_BITS, BALANCE_CHUNKS, BITS_PER_CHUNK,
    RADIX_DECOMP_BITS,
};
pub use elgamal::{
    CipherText, CompressedCipherText, CompressedElgamalPublicKey, ElgamalGens, ElgamalPublicKey,
    ElgamalSecretKey,
};
pub use errors::{Error, Result};
pub use kangaroo::{KangarooParams, KangarooTable, KangarooTableCache};

/// The balance value to keep confidential.
///
/// Decryption searches one bounded discrete-log range per chunk, so the
/// full balance width is limited only by the chunk count; 128 bits
/// covers every ledger the SDK talks to.
pub type Balance = u128;

/// Holds ElGamal encryption keys.
#[derive(Clone, Encode, Decode, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ElgamalKeys {
    #[zeroize(skip)]
    pub public: ElgamalPublicKey,
    pub secret: ElgamalSecretKey,
}

impl ElgamalKeys {
    /// Generates a fresh random key pair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = ElgamalSecretKey::new(Scalar::random(rng));
        Self {
            public: secret.get_public_key(),
            secret,
        }
    }
}

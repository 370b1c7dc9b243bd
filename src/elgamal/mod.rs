//! Twisted-Elgamal encryption over the Ristretto 25519 curve.
//!
//! The cipher is additively homomorphic: addition and subtraction of
//! ciphertexts (and multiplication by a public scalar) act on the
//! encrypted values. Decryption deliberately stops at the curve point
//! `value * h`; inverting that point back to an integer is the job of
//! the kangaroo solver in [`crate::kangaroo`].

use crate::{
    codec_wrapper::{
        point_from_slice, scalar_from_slice, WrappedCompressedRistretto, WrappedRistretto,
        WrappedScalar, RISTRETTO_POINT_SIZE,
    },
    errors::{Error, Result},
};

use core::ops::{Add, AddAssign, Deref, Mul, Sub, SubAssign};
use curve25519_dalek::{
    constants::{RISTRETTO_BASEPOINT_COMPRESSED, RISTRETTO_BASEPOINT_POINT},
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand_core::{CryptoRng, RngCore};
use sha3::Sha3_512;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode, Error as CodecError, Input, MaxEncodedLen};
use scale_info::{build::Fields, Path, Type, TypeInfo};

use core::cmp::Ordering;

/// A serialized `CipherText` is the concatenation of its two compressed points.
pub const CIPHERTEXT_SIZE: usize = RISTRETTO_POINT_SIZE * 2;

/// The two orthogonal generators of the scheme.
///
/// `value_gen` carries the encrypted value, `blinding_gen` carries the
/// blinding factor and the key pair. `blinding_gen` is derived by hashing
/// the compressed basepoint, so no party knows the discrete log relation
/// between the two.
#[derive(Clone, Copy, Debug)]
pub struct ElgamalGens {
    pub value_gen: RistrettoPoint,
    pub blinding_gen: RistrettoPoint,
}

impl Default for ElgamalGens {
    fn default() -> Self {
        Self {
            value_gen: RISTRETTO_BASEPOINT_POINT,
            blinding_gen: RistrettoPoint::hash_from_bytes::<Sha3_512>(
                RISTRETTO_BASEPOINT_COMPRESSED.as_bytes(),
            ),
        }
    }
}

impl ElgamalGens {
    /// Pedersen commitment `value * value_gen + blinding * blinding_gen`.
    pub fn commit(&self, value: Scalar, blinding: Scalar) -> RistrettoPoint {
        value * self.value_gen + blinding * self.blinding_gen
    }
}

/// Prover's representation of the commitment secret.
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop, Debug)]
pub struct CommitmentWitness {
    /// The encrypted chunk value in Scalar format.
    value: Scalar,

    /// A random blinding factor.
    blinding: Scalar,
}

impl CommitmentWitness {
    pub fn new(value: Scalar, blinding: Scalar) -> Self {
        CommitmentWitness { value, blinding }
    }

    pub fn value(&self) -> Scalar {
        self.value
    }

    pub fn blinding(&self) -> Scalar {
        self.blinding
    }
}

/// One twisted-Elgamal ciphertext.
///
/// `x` binds the blinding factor to the public key, `y` is the Pedersen
/// commitment to the value. Operations never mutate in place; the
/// arithmetic impls below produce new ciphertexts.
#[derive(Copy, Clone, Encode, Decode, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CipherText {
    pub x: WrappedRistretto,
    pub y: WrappedRistretto,
}

impl TypeInfo for CipherText {
    type Identity = Self;
    fn type_info() -> Type {
        Type::builder()
            .path(Path::new("CipherText", module_path!()))
            .composite(Fields::unnamed().field(|f| {
                f.ty::<[u8; CIPHERTEXT_SIZE]>()
                    .type_name("CompressedCipherText")
            }))
    }
}

impl CipherText {
    /// Create a `CipherText` when the `value` isn't secret (asset minting).
    pub fn value(value: Scalar) -> Self {
        let gens = ElgamalGens::default();
        Self {
            x: Default::default(),
            y: (value * gens.value_gen).into(),
        }
    }

    /// Create a `CipherText` with zero value and blinding factors.
    ///
    /// Useful for account initialization (zero balance).
    pub fn zero() -> Self {
        Default::default()
    }

    pub fn compress(&self) -> CompressedCipherText {
        CompressedCipherText::from_points(self.x.compress(), self.y.compress())
    }

    /// The canonical 64-byte encoding: `compress(x) || compress(y)`.
    pub fn to_bytes(&self) -> [u8; CIPHERTEXT_SIZE] {
        self.compress().to_bytes()
    }

    /// Decodes a ciphertext fetched from an external source.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CIPHERTEXT_SIZE {
            return Err(Error::DecodeError);
        }
        Ok(Self {
            x: point_from_slice(&bytes[0..RISTRETTO_POINT_SIZE])?.into(),
            y: point_from_slice(&bytes[RISTRETTO_POINT_SIZE..])?.into(),
        })
    }
}

// ------------------------------------------------------------------------
// Arithmetic operations on the ciphertext.
// ------------------------------------------------------------------------

impl<'a, 'b> Add<&'b CipherText> for &'a CipherText {
    type Output = CipherText;

    fn add(self, other: &'b CipherText) -> CipherText {
        CipherText {
            x: (*self.x + *other.x).into(),
            y: (*self.y + *other.y).into(),
        }
    }
}
define_add_variants!(LHS = CipherText, RHS = CipherText, Output = CipherText);

impl<'b> AddAssign<&'b CipherText> for CipherText {
    fn add_assign(&mut self, _rhs: &CipherText) {
        *self = (self as &CipherText) + _rhs;
    }
}
define_add_assign_variants!(LHS = CipherText, RHS = CipherText);

impl<'a, 'b> Sub<&'b CipherText> for &'a CipherText {
    type Output = CipherText;

    fn sub(self, other: &'b CipherText) -> CipherText {
        CipherText {
            x: (*self.x - *other.x).into(),
            y: (*self.y - *other.y).into(),
        }
    }
}
define_sub_variants!(LHS = CipherText, RHS = CipherText, Output = CipherText);

impl<'b> SubAssign<&'b CipherText> for CipherText {
    fn sub_assign(&mut self, _rhs: &CipherText) {
        *self = (self as &CipherText) - _rhs;
    }
}
define_sub_assign_variants!(LHS = CipherText, RHS = CipherText);

impl<'a, 'b> Mul<&'b Scalar> for &'a CipherText {
    type Output = CipherText;

    /// Scalar multiplication of a ciphertext multiplies the plaintext.
    fn mul(self, scalar: &'b Scalar) -> CipherText {
        CipherText {
            x: (scalar * *self.x).into(),
            y: (scalar * *self.y).into(),
        }
    }
}
define_mul_variants!(LHS = CipherText, RHS = Scalar, Output = CipherText);

/// Compressed `CipherText`.
#[derive(Copy, Clone, TypeInfo, Encode, Debug, PartialEq, Eq)]
pub struct CompressedCipherText([u8; CIPHERTEXT_SIZE]);

impl Decode for CompressedCipherText {
    /// Decodes a `CompressedCipherText` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let (x, y) = <(WrappedCompressedRistretto, WrappedCompressedRistretto)>::decode(input)?;
        Ok(Self::from_points(*x, *y))
    }
}

impl Default for CompressedCipherText {
    fn default() -> Self {
        Self([0u8; CIPHERTEXT_SIZE])
    }
}

impl From<CipherText> for CompressedCipherText {
    fn from(other: CipherText) -> Self {
        other.compress()
    }
}

impl CompressedCipherText {
    pub fn from_points(x: CompressedRistretto, y: CompressedRistretto) -> Self {
        let mut bytes = [0u8; CIPHERTEXT_SIZE];
        bytes[0..RISTRETTO_POINT_SIZE].copy_from_slice(x.as_bytes());
        bytes[RISTRETTO_POINT_SIZE..].copy_from_slice(y.as_bytes());
        CompressedCipherText(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CIPHERTEXT_SIZE {
            return Err(Error::DecodeError);
        }
        let mut raw = [0u8; CIPHERTEXT_SIZE];
        raw.copy_from_slice(bytes);
        Ok(CompressedCipherText(raw))
    }

    pub fn to_bytes(&self) -> [u8; CIPHERTEXT_SIZE] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; CIPHERTEXT_SIZE] {
        &self.0
    }

    /// Decompresses back into a `CipherText`, validating both points.
    pub fn decompress(&self) -> Result<CipherText> {
        CipherText::from_slice(&self.0)
    }
}

// ------------------------------------------------------------------------
// Elgamal Encryption.
// ------------------------------------------------------------------------

/// Elgamal key pair:
/// secret_key := scalar
/// public_key := secret_key * g
///
/// Encryption:
/// plaintext := (value, blinding_factor)
/// cipher_text := (X, Y)
/// X := blinding_factor * public_key
/// Y := value * h + blinding_factor * g
///
/// Decryption:
/// Given (secret_key, X, Y) find `value` such that:
/// value * h = Y - X / secret_key
///
/// where g and h are 2 orthogonal generators (`blinding_gen` and
/// `value_gen` of [`ElgamalGens`]).

/// An Elgamal Secret Key is a random scalar.
#[derive(Clone, Encode, Decode, Zeroize, ZeroizeOnDrop, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElgamalSecretKey {
    pub secret: WrappedScalar,
}

impl Deref for ElgamalSecretKey {
    type Target = Scalar;
    fn deref(&self) -> &Self::Target {
        &self.secret
    }
}

/// Compressed ElgamalPublicKey.
#[derive(
    Copy, Clone, Default, Encode, MaxEncodedLen, TypeInfo, PartialOrd, Ord, PartialEq, Eq, Debug,
)]
pub struct CompressedElgamalPublicKey([u8; RISTRETTO_POINT_SIZE]);

impl CompressedElgamalPublicKey {
    pub fn from_public_key(key: &ElgamalPublicKey) -> Self {
        Self(key.pub_key.compress().to_bytes())
    }

    pub fn into_public_key(&self) -> Result<ElgamalPublicKey> {
        let pub_key = point_from_slice(&self.0)?;
        Ok(ElgamalPublicKey {
            pub_key: pub_key.into(),
        })
    }
}

impl Decode for CompressedElgamalPublicKey {
    /// Decodes a `CompressedElgamalPublicKey` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let compressed = WrappedCompressedRistretto::decode(input)?;
        Ok(Self(compressed.to_bytes()))
    }
}

impl From<&ElgamalPublicKey> for CompressedElgamalPublicKey {
    fn from(other: &ElgamalPublicKey) -> Self {
        Self::from_public_key(other)
    }
}

impl From<ElgamalPublicKey> for CompressedElgamalPublicKey {
    fn from(other: ElgamalPublicKey) -> Self {
        Self::from_public_key(&other)
    }
}

/// The Elgamal Public Key is the secret key multiplied by the blinding generator (g).
#[derive(Copy, Clone, Encode, Decode, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElgamalPublicKey {
    pub pub_key: WrappedRistretto,
}

impl ElgamalPublicKey {
    fn encrypt_helper(&self, value: Scalar, blinding: Scalar) -> CipherText {
        let x = blinding * *self.pub_key;
        let gens = ElgamalGens::default();
        let y = gens.commit(value, blinding).into();
        CipherText { x: x.into(), y }
    }

    /// Encrypts with the explicit blinding carried by the witness.
    ///
    /// Deterministic; tests rely on this to reproduce ciphertexts.
    pub fn encrypt(&self, witness: &CommitmentWitness) -> CipherText {
        self.encrypt_helper(witness.value, witness.blinding)
    }

    /// Generates a blinding factor, and encrypts the value.
    pub fn encrypt_value<R: RngCore + CryptoRng>(
        &self,
        value: Scalar,
        rng: &mut R,
    ) -> (CommitmentWitness, CipherText) {
        let blinding = Scalar::random(rng);
        (
            CommitmentWitness { value, blinding },
            self.encrypt_helper(value, blinding),
        )
    }

    /// Decodes a public key fetched from an external source.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            pub_key: point_from_slice(bytes)?.into(),
        })
    }

    pub fn to_bytes(&self) -> [u8; RISTRETTO_POINT_SIZE] {
        self.pub_key.compress().to_bytes()
    }
}

impl PartialOrd for ElgamalPublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ElgamalPublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let l = self.pub_key.compress().to_bytes();
        let r = other.pub_key.compress().to_bytes();
        l.cmp(&r)
    }
}

impl ElgamalSecretKey {
    pub fn new(secret: Scalar) -> Self {
        ElgamalSecretKey {
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> Scalar {
        *self.secret
    }

    /// Decodes a secret key from canonical scalar bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(scalar_from_slice(bytes)?))
    }

    pub fn get_public_key(&self) -> ElgamalPublicKey {
        let gens = ElgamalGens::default();
        ElgamalPublicKey {
            pub_key: (self.secret() * gens.blinding_gen).into(),
        }
    }

    /// Removes the key term from a ciphertext, producing `value * h`.
    ///
    /// This never searches for the value itself; feed the returned point
    /// to the kangaroo solver to recover the integer.
    pub fn decrypt_to_point(&self, cipher_text: &CipherText) -> RistrettoPoint {
        // value * h = Y - X / secret_key
        *cipher_text.y - self.invert() * *cipher_text.x
    }

    /// Verifies that a cipher text encrypts the given `value`.
    /// This follows the same logic as decryption, except that the `value`
    /// is provided and we don't need to search for it.
    pub fn verify(&self, cipher_text: &CipherText, value: &Scalar) -> Result<()> {
        let gens = ElgamalGens::default();
        let value_h = self.decrypt_to_point(cipher_text);
        if value * gens.value_gen == value_h {
            return Ok(());
        }

        Err(Error::CipherTextMismatch)
    }
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------

use codec::{Decode, Encode, Error as CodecError, Input, MaxEncodedLen, Output};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use core::ops::{Deref, DerefMut};

use crate::errors::{Error, Result};

/// Constants:
/// A serialized Ristretto point size.
pub const RISTRETTO_POINT_SIZE: usize = 32;

/// A serialized Scalar size.
pub const SCALAR_SIZE: usize = 32;

/// Decodes a Ristretto point from its canonical compressed encoding.
///
/// Fails on wrong length or bytes that do not decode to a valid point.
pub fn point_from_slice(bytes: &[u8]) -> Result<RistrettoPoint> {
    let compressed =
        CompressedRistretto::from_slice(bytes).map_err(|_| Error::DecodeError)?;
    compressed.decompress().ok_or(Error::DecodeError)
}

/// Decodes a scalar from its canonical 32-byte little-endian encoding.
///
/// Non-canonical encodings (values above the group order) are rejected.
pub fn scalar_from_slice(bytes: &[u8]) -> Result<Scalar> {
    let bytes: [u8; SCALAR_SIZE] = bytes.try_into().map_err(|_| Error::DecodeError)?;
    Option::from(Scalar::from_canonical_bytes(bytes)).ok_or(Error::DecodeError)
}

/// Wrapper for `RistrettoPoint` to implement SCALE encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedRistretto(pub RistrettoPoint);

impl Default for WrappedRistretto {
    fn default() -> Self {
        Self(RistrettoPoint::identity())
    }
}

impl Encode for WrappedRistretto {
    #[inline]
    fn size_hint(&self) -> usize {
        RISTRETTO_POINT_SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.compress().as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedRistretto {
    /// Decodes a `Ristretto` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let id = <[u8; RISTRETTO_POINT_SIZE]>::decode(input)?;
        let compressed = CompressedRistretto(id);

        let inner = compressed
            .decompress()
            .ok_or_else(|| CodecError::from("Invalid `CompressedRistretto`."))?;

        Ok(Self(inner))
    }
}

impl MaxEncodedLen for WrappedRistretto {
    fn max_encoded_len() -> usize {
        RISTRETTO_POINT_SIZE
    }
}

impl From<WrappedRistretto> for RistrettoPoint {
    fn from(data: WrappedRistretto) -> Self {
        data.0
    }
}

impl Deref for WrappedRistretto {
    type Target = RistrettoPoint;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WrappedRistretto {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<RistrettoPoint> for WrappedRistretto {
    fn from(data: RistrettoPoint) -> Self {
        Self(data)
    }
}

/// Wrapper for `CompressedRistretto` to implement SCALE encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedCompressedRistretto(pub CompressedRistretto);

impl Default for WrappedCompressedRistretto {
    fn default() -> Self {
        Self(CompressedRistretto([0u8; RISTRETTO_POINT_SIZE]))
    }
}

impl Encode for WrappedCompressedRistretto {
    #[inline]
    fn size_hint(&self) -> usize {
        RISTRETTO_POINT_SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedCompressedRistretto {
    /// Decodes a `CompressedRistretto` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let id = <[u8; RISTRETTO_POINT_SIZE]>::decode(input)?;
        let inner = CompressedRistretto(id);

        // Ensure it is a valid RistrettoPoint.
        inner
            .decompress()
            .ok_or_else(|| CodecError::from("Invalid `CompressedRistretto`."))?;

        Ok(Self(inner))
    }
}

impl MaxEncodedLen for WrappedCompressedRistretto {
    fn max_encoded_len() -> usize {
        RISTRETTO_POINT_SIZE
    }
}

impl From<WrappedCompressedRistretto> for RistrettoPoint {
    fn from(data: WrappedCompressedRistretto) -> Self {
        data.decompress()
    }
}

impl Deref for WrappedCompressedRistretto {
    type Target = CompressedRistretto;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WrappedCompressedRistretto {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<RistrettoPoint> for WrappedCompressedRistretto {
    fn from(data: RistrettoPoint) -> Self {
        Self(data.compress())
    }
}

impl From<CompressedRistretto> for WrappedCompressedRistretto {
    fn from(data: CompressedRistretto) -> Self {
        Self(data)
    }
}

impl WrappedCompressedRistretto {
    pub fn decompress(&self) -> RistrettoPoint {
        // The compressed RistrettoPoint is validated in the SCALE `decode` method.
        self.0.decompress().unwrap_or_else(RistrettoPoint::identity)
    }

    pub fn compress(&self) -> CompressedRistretto {
        self.0
    }
}

/// Wrapper for Scalar to implement SCALE encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Zeroize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedScalar(pub Scalar);

impl Default for WrappedScalar {
    fn default() -> Self {
        Self(Scalar::ZERO)
    }
}

impl Encode for WrappedScalar {
    #[inline]
    fn size_hint(&self) -> usize {
        SCALAR_SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedScalar {
    /// Decodes a `Scalar` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let s = <[u8; SCALAR_SIZE]>::decode(input)?;

        let inner = Option::from(Scalar::from_canonical_bytes(s))
            .ok_or_else(|| CodecError::from("Non-canonical `Scalar`."))?;
        Ok(Self(inner))
    }
}

impl MaxEncodedLen for WrappedScalar {
    fn max_encoded_len() -> usize {
        SCALAR_SIZE
    }
}

impl From<WrappedScalar> for Scalar {
    fn from(data: WrappedScalar) -> Self {
        data.0
    }
}

impl Deref for WrappedScalar {
    type Target = Scalar;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WrappedScalar {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Scalar> for WrappedScalar {
    fn from(data: Scalar) -> Self {
        Self(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sha3::Sha3_512;

    /// Test encode wrapper `$wrapper` using `data` as input.
    /// The input `data` is a list of tuples, where first element is the object to encode, and the
    /// second is the expected value of the encoded object.
    macro_rules! test_codec_wrapper {
        ($wrapper:ident, $data:expr) => {
            for (input, expected) in $data.into_iter() {
                let wrapped: $wrapper = input.into();
                let mut encoded = wrapped.encode();
                assert_eq!(encoded, *expected);

                let mut encoded_slice: &[u8] = encoded.as_mut_slice();
                let decoded = <$wrapper>::decode(&mut encoded_slice)?;
                assert_eq!(decoded, wrapped);
            }
        };
    }

    #[test]
    fn ristretto_codec() -> Result<(), CodecError> {
        use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;

        // The cipher's value generator, and the identity (the `x`
        // component of a zero-blinding ciphertext).
        let data = [
            (
                RISTRETTO_BASEPOINT_POINT,
                hex::decode("e2f2ae0a6abc4e71a884a961c500515f58e30b6aa582dd8db6a65945e08d2d76")
                    .unwrap(),
            ),
            (
                RistrettoPoint::identity(),
                hex::decode("0000000000000000000000000000000000000000000000000000000000000000")
                    .unwrap(),
            ),
        ];

        test_codec_wrapper!(WrappedRistretto, data);

        Ok(())
    }

    #[test]
    fn compressed_ristretto_codec() -> Result<(), CodecError> {
        use curve25519_dalek::constants::RISTRETTO_BASEPOINT_COMPRESSED;

        let data = [
            (
                RISTRETTO_BASEPOINT_COMPRESSED,
                hex::decode("e2f2ae0a6abc4e71a884a961c500515f58e30b6aa582dd8db6a65945e08d2d76")
                    .unwrap(),
            ),
            (
                RistrettoPoint::identity().compress(),
                hex::decode("0000000000000000000000000000000000000000000000000000000000000000")
                    .unwrap(),
            ),
        ];

        test_codec_wrapper!(WrappedCompressedRistretto, data);
        Ok(())
    }

    #[test]
    fn scalar_codec() -> Result<(), CodecError> {
        let data = [
            (
                Scalar::hash_from_bytes::<Sha3_512>(b"confidential-balances value"),
                hex::decode("b6e261613a348f3103af06621f3186b835ce7742df8d99044c016c1b1b535108")
                    .unwrap(),
            ),
            (
                Scalar::hash_from_bytes::<Sha3_512>(b"confidential-balances blinding"),
                hex::decode("2e04788adc43bbf6f8f89f7d26bfd920e5baf3073b5a782f0999244da2326703")
                    .unwrap(),
            ),
        ];

        test_codec_wrapper!(WrappedScalar, data);
        Ok(())
    }

    #[test]
    fn rejects_malformed_point_bytes() {
        // Not a valid Ristretto encoding.
        let bad = [0xffu8; RISTRETTO_POINT_SIZE];
        assert_eq!(point_from_slice(&bad), Err(Error::DecodeError));
        // Wrong length.
        assert_eq!(point_from_slice(&bad[..31]), Err(Error::DecodeError));
    }

    #[test]
    fn rejects_non_canonical_scalar_bytes() {
        // The group order minus one is canonical; all-0xff is not.
        let bad = [0xffu8; SCALAR_SIZE];
        assert_eq!(scalar_from_slice(&bad), Err(Error::DecodeError));

        let good = (Scalar::ZERO - Scalar::ONE).to_bytes();
        assert!(scalar_from_slice(&good).is_ok());
    }
}

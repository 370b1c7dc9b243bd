use thiserror::Error;

/// Confidential balance error.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The chunk/bit-width parameters passed by the caller are inconsistent.
    #[error("Invalid decomposition parameters: {reason}")]
    InvalidDecompositionParameters { reason: &'static str },

    /// An amount does not fit the declared bit width, or chunks recomposed
    /// out of range.
    #[error("Value does not fit in {bits} bits")]
    ValueOutOfRange { bits: u32 },

    /// Malformed point or scalar bytes from an external source.
    #[error("Failed to decode a curve point or scalar")]
    DecodeError,

    /// A ciphertext did not decrypt to a claimed value during verification.
    #[error("The cipher text does not encrypt the claimed value")]
    CipherTextMismatch,

    /// The kangaroo search exhausted its jump budget without finding the
    /// discrete log. The caller may retry with a larger bit-width hint;
    /// the solver never escalates the range on its own.
    #[error("Discrete log not found within a {range_bits}-bit search range")]
    DiscreteLogNotFound { range_bits: u32 },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

//! Helpers shared by tests and benchmarks.

use rand_core::{CryptoRng, RngCore};

use crate::{
    balance::ConfidentialAmount, chunked::DecompositionParams, elgamal::ElgamalPublicKey, Balance,
    ElgamalKeys, Scalar,
};

/// The fast decomposition used by most tests: 8 chunks of at most
/// 16 bits, solvable with the cheap 16-bit kangaroo table.
pub fn small_params() -> DecompositionParams {
    DecompositionParams::new(8, 64, 16).expect("valid params")
}

pub fn gen_keys<R: RngCore + CryptoRng>(rng: &mut R) -> ElgamalKeys {
    ElgamalKeys::generate(rng)
}

/// Homomorphically mints `amount` on top of an existing balance.
pub fn issue_assets<R: RngCore + CryptoRng>(
    rng: &mut R,
    pub_account: &ElgamalPublicKey,
    init_balance: &ConfidentialAmount,
    amount: Balance,
    params: DecompositionParams,
) -> ConfidentialAmount {
    let encrypted_amount = ConfidentialAmount::encrypt_with_params(pub_account, amount, params, rng)
        .expect("amount in range");
    init_balance.add(&encrypted_amount).expect("chunk counts match")
}

/// Creates a key pair plus an encrypted initial balance.
pub fn create_account_with_amount<R: RngCore + CryptoRng>(
    rng: &mut R,
    initial_amount: Balance,
    params: DecompositionParams,
) -> (ElgamalKeys, ConfidentialAmount) {
    let account = gen_keys(rng);
    let initial_balance =
        ConfidentialAmount::encrypt_with_params(&account.public, initial_amount, params, rng)
            .expect("amount in range");

    (account, initial_balance)
}

/// Deterministic non-zero blindings for reproducible ciphertexts.
pub fn fixed_blindings(count: usize) -> Vec<Scalar> {
    (0..count).map(|i| Scalar::from(i as u64 + 7)).collect()
}

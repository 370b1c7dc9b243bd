mod utility;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, SeedableRng};

use confidential_balances::{
    testing::gen_keys, Balance, ChunkedAmount, ConfidentialAmount,
};
use utility::balance_range::{MAX_BALANCE_ORDER, MIN_BALANCE_ORDER};

fn bench_decompose_recompose(c: &mut Criterion) {
    let params = utility::default_params();
    let mut group = c.benchmark_group("chunked decompose");

    for order in [MIN_BALANCE_ORDER, 15, MAX_BALANCE_ORDER, 38] {
        let amount = 10u128.pow(order);
        group.bench_with_input(BenchmarkId::new("decompose", order), &amount, |b, &amount| {
            b.iter(|| ChunkedAmount::decompose(amount, params).expect("in range"))
        });
        let decomposed = ChunkedAmount::decompose(amount, params).expect("in range");
        group.bench_with_input(
            BenchmarkId::new("recompose", order),
            &decomposed,
            |b, decomposed| b.iter(|| decomposed.recompose().expect("in range")),
        );
    }
    group.finish();
}

fn bench_encrypt_amount(c: &mut Criterion) {
    let mut rng = StdRng::from_seed([42u8; 32]);
    let keys = gen_keys(&mut rng);
    let mut group = c.benchmark_group("confidential_amount encrypt");

    for order in [MIN_BALANCE_ORDER, MAX_BALANCE_ORDER] {
        let amount: Balance = 10u128.pow(order);
        group.bench_with_input(BenchmarkId::new("encrypt", order), &amount, |b, &amount| {
            b.iter(|| ConfidentialAmount::encrypt(&keys.public, amount, &mut rng).expect("in range"))
        });
    }
    group.finish();
}

fn bench_decrypt_amount(c: &mut Criterion) {
    let mut rng = StdRng::from_seed([42u8; 32]);
    let keys = gen_keys(&mut rng);
    let cache = utility::cache();
    // Warm the 32-bit table outside the timed region.
    cache.initialize_tables(&[32]).expect("table");

    let mut group = c.benchmark_group("confidential_amount decrypt");
    for order in MIN_BALANCE_ORDER..=MAX_BALANCE_ORDER {
        let amount: Balance = 10u128.pow(order);
        let enc = ConfidentialAmount::encrypt(&keys.public, amount, &mut rng).expect("in range");
        group.bench_with_input(BenchmarkId::new("decrypt", order), &enc, |b, enc| {
            b.iter(|| {
                let decrypted = enc.decrypt(&keys.secret, cache).expect("decrypts");
                assert_eq!(decrypted, amount);
            })
        });
    }
    group.finish();
}

fn bench_homomorphic_add(c: &mut Criterion) {
    let mut rng = StdRng::from_seed([42u8; 32]);
    let keys = gen_keys(&mut rng);
    let a = ConfidentialAmount::encrypt(&keys.public, 1_000_000, &mut rng).expect("in range");
    let b_enc = ConfidentialAmount::encrypt(&keys.public, 2_000_000, &mut rng).expect("in range");

    c.bench_function("confidential_amount add", |b| {
        b.iter(|| a.add(&b_enc).expect("chunk counts match"))
    });
}

criterion_group! {
    name = chunked_amount;
    // 10 is the minimum allowed sample size in Criterion.
    config = Criterion::default()
        .sample_size(10);
    targets = bench_decompose_recompose, bench_encrypt_amount, bench_decrypt_amount, bench_homomorphic_add,
}

criterion_main!(chunked_amount);

use axon_core::CipherMode;
use axon_crypto::{encrypt_authenticated, encrypt_block_cipher, DerivedKey, EnvelopeKeys};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_seal_authenticated(bencher: divan::Bencher, size: usize) {
    let keys = EnvelopeKeys::derive(&DerivedKey::from_bytes([42u8; 32]), CipherMode::Authenticated)
        .unwrap();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| keys.seal(divan::black_box(&data), b"bench-id"));
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_open_authenticated(bencher: divan::Bencher, size: usize) {
    let keys = EnvelopeKeys::derive(&DerivedKey::from_bytes([42u8; 32]), CipherMode::Authenticated)
        .unwrap();
    let envelope = keys.seal(&make_data(size), b"bench-id");
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| keys.open(divan::black_box(&envelope), b"bench-id").unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt_block_cipher(bencher: divan::Bencher, size: usize) {
    let key = DerivedKey::from_bytes([42u8; 32]);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| encrypt_block_cipher(divan::black_box(&key), divan::black_box(&data), None));
}

#[divan::bench(args = [1024, 65536])]
fn bench_encrypt_token(bencher: divan::Bencher, size: usize) {
    let key = DerivedKey::from_bytes([42u8; 32]);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| encrypt_authenticated(divan::black_box(&key), divan::black_box(&data)));
}

fn main() {
    divan::main();
}

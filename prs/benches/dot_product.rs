use ckks::{Ciphertext, Encryptor, Evaluator, ParametersLiteral};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use prs::pipeline::KeySet;
use prs::{EncryptedMatrix, dot_product_matrix, dot_product_matrix_par, encrypt_matrix};
use sampling::source::Source;

fn dot_product(c: &mut Criterion) {
    let mut b: criterion::BenchmarkGroup<'_, criterion::measurement::WallTime> =
        c.benchmark_group("dot_product_matrix");
    b.sample_size(10);

    let mut source: Source = Source::new([0u8; 32]);
    let keys: KeySet = match KeySet::generate(&ParametersLiteral::PN12, &mut source) {
        Ok(keys) => keys,
        Err(e) => panic!("{}", e),
    };
    let slots: usize = keys.params.slots();
    let mut encryptor: Encryptor = Encryptor::with_source(&keys.params, &keys.pk, &mut source);
    let evaluator: Evaluator = Evaluator::new(&keys.params, keys.rlk, keys.rtks);

    for samples in [4usize, 16] {
        let genotypes: Vec<Vec<f64>> = (0..samples)
            .map(|s| (0..2 * slots).map(|k| ((s + k) % 3) as f64).collect())
            .collect();
        let coefficients: Vec<Vec<f64>> = vec![(0..2 * slots).map(|k| 1e-4 * (k % 100) as f64).collect()];
        let (x, w): (EncryptedMatrix<Ciphertext>, EncryptedMatrix<Ciphertext>) = match (
            encrypt_matrix(&mut encryptor, &genotypes),
            encrypt_matrix(&mut encryptor, &coefficients),
        ) {
            (Ok(x), Ok(w)) => (x, w),
            _ => panic!("encryption failed"),
        };

        let id: String = format!("samples={}", samples);
        b.bench_with_input(BenchmarkId::new("sequential", &id), &(), |b, _| {
            b.iter(|| dot_product_matrix(&evaluator, &w, &x, slots))
        });
        b.bench_with_input(BenchmarkId::new("rayon", &id), &(), |b, _| {
            b.iter(|| dot_product_matrix_par(&evaluator, &w, &x, slots))
        });
    }
}

criterion_group!(benches, dot_product);
criterion_main!(benches);

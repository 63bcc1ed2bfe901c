use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quantvec::{vec_mat_mult_t_s16_with, ActivationRange, Backend, QuantParams};

fn make_case(rows: usize, cols: usize) -> (Vec<i16>, Vec<i8>, Vec<i64>) {
    let mut seed = 0x1234_5678_9abc_def0u64;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (seed >> 32) as i32
    };
    let lhs = (0..cols).map(|_| (next() % 512) as i16).collect();
    let rhs = (0..rows * cols).map(|_| (next() % 128) as i8).collect();
    let bias = (0..rows).map(|_| (next() % 10_000) as i64).collect();
    (lhs, rhs, bias)
}

fn bench_vec_mat(c: &mut Criterion) {
    let rows = 256;
    let cols = 1024;
    let (lhs, rhs, bias) = make_case(rows, cols);
    let params = QuantParams { multiplier: 3, shift: 5 };
    let range = ActivationRange::s16();

    let mut backends = vec![(Backend::Scalar, "scalar")];
    if Backend::detect() == Backend::Packed {
        backends.push((Backend::Packed, "packed"));
    }

    for (backend, name) in backends {
        c.bench_function(&format!("vec_mat_256x1024_{}", name), |ben| {
            let mut dst = vec![0i16; rows];
            ben.iter(|| {
                vec_mat_mult_t_s16_with(
                    backend,
                    black_box(&lhs),
                    black_box(&rhs),
                    Some(black_box(&bias)),
                    &mut dst,
                    params,
                    range,
                );
                black_box(dst[0])
            })
        });
    }
}

criterion_group!(benches, bench_vec_mat);
criterion_main!(benches);

use pretty_assertions::assert_eq;
use quantvec::kernel::requant::requantize_s64;
use quantvec::{vec_mat_mult_t_s16, vec_mat_mult_t_s16_with, ActivationRange, Backend, QuantParams};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_case(rng: &mut SmallRng, rows: usize, cols: usize) -> (Vec<i16>, Vec<i8>, Vec<i64>) {
    let lhs = (0..cols).map(|_| rng.gen_range(-512i32..=512) as i16).collect();
    let rhs = (0..rows * cols).map(|_| rng.gen_range(-128i32..=127) as i8).collect();
    let bias = (0..rows).map(|_| rng.gen_range(-10_000i64..=10_000)).collect();
    (lhs, rhs, bias)
}

/// Row-by-row reference: bias-seeded i64 dot, requantize, clamp.
fn reference(
    lhs: &[i16],
    rhs: &[i8],
    bias: Option<&[i64]>,
    params: QuantParams,
    range: ActivationRange,
) -> Vec<i16> {
    let cols = lhs.len();
    let rows = if cols == 0 { 0 } else { rhs.len() / cols };
    (0..rows)
        .map(|r| {
            let mut acc: i64 = bias.map_or(0, |b| b[r]);
            for c in 0..cols {
                acc += lhs[c] as i64 * rhs[r * cols + c] as i64;
            }
            let v = requantize_s64(acc, params.multiplier, params.shift);
            v.clamp(range.min, range.max) as i16
        })
        .collect()
}

#[test]
fn packed_matches_scalar_across_shapes() {
    if Backend::detect() != Backend::Packed {
        println!("Skipping - packed core not available");
        return;
    }

    // Chunk boundaries around the 16-wide packed step, plus tiny shapes.
    let shapes = [
        (1, 1),
        (1, 5),
        (2, 4),
        (3, 5),
        (2, 15),
        (2, 16),
        (3, 17),
        (5, 31),
        (8, 32),
        (7, 33),
        (4, 48),
        (16, 64),
        (9, 100),
    ];
    let param_sets = [QuantParams::identity(), QuantParams { multiplier: 3, shift: 5 }];
    let range = ActivationRange::s16();

    let mut rng = SmallRng::seed_from_u64(42);
    for (rows, cols) in shapes {
        let (lhs, rhs, bias) = random_case(&mut rng, rows, cols);
        for params in param_sets {
            for bias in [None, Some(bias.as_slice())] {
                let mut dst_packed = vec![0i16; rows];
                let mut dst_scalar = vec![0i16; rows];
                vec_mat_mult_t_s16_with(Backend::Packed, &lhs, &rhs, bias, &mut dst_packed, params, range);
                vec_mat_mult_t_s16_with(Backend::Scalar, &lhs, &rhs, bias, &mut dst_scalar, params, range);
                assert_eq!(dst_packed, dst_scalar, "shape {}x{} params {:?}", rows, cols, params);
            }
        }
    }
}

#[test]
fn both_cores_match_row_by_row_reference() {
    let shapes = [(1, 3), (2, 7), (3, 16), (5, 33), (6, 50)];
    let params = QuantParams { multiplier: 5, shift: 3 };
    let range = ActivationRange::s16();

    let mut rng = SmallRng::seed_from_u64(7);
    for (rows, cols) in shapes {
        let (lhs, rhs, bias) = random_case(&mut rng, rows, cols);
        let expected = reference(&lhs, &rhs, Some(&bias), params, range);

        let mut dst = vec![0i16; rows];
        vec_mat_mult_t_s16_with(Backend::Scalar, &lhs, &rhs, Some(&bias), &mut dst, params, range);
        assert_eq!(dst, expected, "scalar, shape {}x{}", rows, cols);

        let mut dst = vec![0i16; rows];
        vec_mat_mult_t_s16(&lhs, &rhs, Some(&bias), &mut dst, params, range);
        assert_eq!(dst, expected, "detected backend, shape {}x{}", rows, cols);
    }
}

#[test]
fn remainder_columns_match_reference() {
    // cols 1..=5 exercises both the chunked path (as a pure remainder) and
    // its drain on the packed core.
    let params = QuantParams::identity();
    let range = ActivationRange::s16();
    let mut rng = SmallRng::seed_from_u64(99);
    for cols in 1..=5 {
        let (lhs, rhs, _) = random_case(&mut rng, 3, cols);
        let expected = reference(&lhs, &rhs, None, params, range);
        let mut dst = vec![0i16; 3];
        vec_mat_mult_t_s16(&lhs, &rhs, None, &mut dst, params, range);
        assert_eq!(dst, expected, "cols={}", cols);
    }
}

#[test]
fn odd_row_count_fills_the_trailing_row() {
    let params = QuantParams::identity();
    let range = ActivationRange::s16();
    let mut rng = SmallRng::seed_from_u64(123);
    for rows in [1, 3, 5, 9] {
        let (lhs, rhs, bias) = random_case(&mut rng, rows, 20);
        let expected = reference(&lhs, &rhs, Some(&bias), params, range);
        let mut dst = vec![0i16; rows];
        vec_mat_mult_t_s16(&lhs, &rhs, Some(&bias), &mut dst, params, range);
        assert_eq!(dst, expected, "rows={}", rows);
    }
}

//! s16 vector by transposed-matrix multiply kernels.
//!
//! One input vector of `i16` activations against a row-major `i8` weight
//! matrix where each row holds one output's weights. Per row: dot product,
//! optional `i64` bias, requantize by a shared multiplier/shift pair,
//! clamp to the activation range, truncate to `i16`.
//!
//! Two cores implement the same contract: a packed AVX2 core and a
//! portable scalar core. They produce bit-identical output for any input
//! whose row dot products fit a 32-bit accumulator; [`Backend::detect`]
//! picks the fastest one available.

pub mod requant;
pub mod scalar;

#[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
pub mod packed;

/// Requantization constants applied identically to every row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantParams {
    pub multiplier: i32,
    pub shift: i32,
}

impl QuantParams {
    /// Pass-through rescaling: `multiplier = 1`, `shift = 0`.
    pub fn identity() -> Self {
        QuantParams { multiplier: 1, shift: 0 }
    }
}

/// Inclusive clamp bounds applied after requantization.
///
/// Callers are responsible for picking bounds representable in the output
/// width; the kernel truncates to `i16` after clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivationRange {
    pub min: i32,
    pub max: i32,
}

impl ActivationRange {
    /// The full s16 range, the widest clamp a 16-bit output can carry.
    pub fn s16() -> Self {
        ActivationRange { min: i16::MIN as i32, max: i16::MAX as i32 }
    }
}

/// Execution strategy for the column loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// AVX2 packed multiply-accumulate core.
    Packed,
    /// Portable scalar core; the semantic reference.
    Scalar,
}

impl Backend {
    /// Picks the fastest core available on this CPU.
    pub fn detect() -> Self {
        #[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
        {
            if is_x86_feature_detected!("avx2") {
                return Backend::Packed;
            }
        }
        Backend::Scalar
    }

    /// Whether this core can run on the current CPU and build.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Scalar => true,
            Backend::Packed => {
                #[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
                {
                    is_x86_feature_detected!("avx2")
                }
                #[cfg(not(all(target_arch = "x86_64", feature = "simd-avx2")))]
                {
                    false
                }
            }
        }
    }

    #[inline]
    fn row_pair(self, lhs: &[i16], row0: &[i8], row1: &[i8]) -> (i64, i64) {
        match self {
            Backend::Scalar => scalar::row_pair(lhs, row0, row1),
            #[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
            // Availability asserted at driver entry.
            Backend::Packed => unsafe { packed::row_pair(lhs, row0, row1) },
            #[cfg(not(all(target_arch = "x86_64", feature = "simd-avx2")))]
            Backend::Packed => unreachable!("packed core compiled out"),
        }
    }

    #[inline]
    fn row(self, lhs: &[i16], row: &[i8]) -> i64 {
        match self {
            Backend::Scalar => scalar::row(lhs, row),
            #[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
            // Availability asserted at driver entry.
            Backend::Packed => unsafe { packed::row(lhs, row) },
            #[cfg(not(all(target_arch = "x86_64", feature = "simd-avx2")))]
            Backend::Packed => unreachable!("packed core compiled out"),
        }
    }
}

/// Multiplies `lhs` by the transposed matrix `rhs` into `dst`.
///
/// `lhs` supplies the column count, `dst` the row count; row `r` of `rhs`
/// occupies `rhs[r * cols..(r + 1) * cols]`. Each output is
/// `clamp(requantize(dot + bias[r]))` truncated to `i16`, written in row
/// order, every slot exactly once. `dst.len() == 0` performs no work. An
/// absent bias skips the additive term entirely.
///
/// # Panics
///
/// Panics if `rhs` or `bias` disagree with the dimensions implied by
/// `lhs` and `dst`, or if `range.min > range.max`.
pub fn vec_mat_mult_t_s16(
    lhs: &[i16],
    rhs: &[i8],
    bias: Option<&[i64]>,
    dst: &mut [i16],
    params: QuantParams,
    range: ActivationRange,
) {
    vec_mat_mult_t_s16_with(Backend::detect(), lhs, rhs, bias, dst, params, range);
}

/// Same as [`vec_mat_mult_t_s16`] but with a caller-pinned [`Backend`].
///
/// # Panics
///
/// Additionally panics if `backend` is not available on this CPU.
pub fn vec_mat_mult_t_s16_with(
    backend: Backend,
    lhs: &[i16],
    rhs: &[i8],
    bias: Option<&[i64]>,
    dst: &mut [i16],
    params: QuantParams,
    range: ActivationRange,
) {
    let cols = lhs.len();
    let rows = dst.len();
    assert_eq!(rhs.len(), rows * cols, "rhs: expected {}x{}={} elements", rows, cols, rows * cols);
    if let Some(b) = bias {
        assert_eq!(b.len(), rows, "bias: expected {} elements", rows);
    }
    assert!(range.min <= range.max, "activation range: min {} > max {}", range.min, range.max);
    assert!(backend.is_available(), "backend {:?} not available on this CPU", backend);

    let pairs = rows / 2;
    for i in 0..pairs {
        let base = 2 * i * cols;
        let row0 = &rhs[base..base + cols];
        let row1 = &rhs[base + cols..base + 2 * cols];
        let (mut acc0, mut acc1) = backend.row_pair(lhs, row0, row1);
        if let Some(b) = bias {
            acc0 += b[2 * i];
            acc1 += b[2 * i + 1];
        }
        dst[2 * i] = requantize_and_clamp(acc0, params, range);
        dst[2 * i + 1] = requantize_and_clamp(acc1, params, range);
    }

    if rows & 1 == 1 {
        let r = rows - 1;
        let mut acc = backend.row(lhs, &rhs[r * cols..(r + 1) * cols]);
        if let Some(b) = bias {
            acc += b[r];
        }
        dst[r] = requantize_and_clamp(acc, params, range);
    }
}

#[inline]
fn requantize_and_clamp(acc: i64, params: QuantParams, range: ActivationRange) -> i16 {
    let v = requant::requantize_s64(acc, params.multiplier, params.shift);
    v.clamp(range.min, range.max) as i16
}

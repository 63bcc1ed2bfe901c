pub mod loader;

use thiserror::Error;

use crate::kernel::{self, ActivationRange, QuantParams};

/// Violations of the QVECLIN1 container format.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("bad magic (not a QVECLIN1 file)")]
    BadMagic,
    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("file truncated reading {0}")]
    Truncated(&'static str),
    #[error("dimension overflow: {rows} x {cols}")]
    DimensionOverflow { rows: usize, cols: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct QuantMeta {
    pub version: u32,
    pub rows: usize,
    pub cols: usize,
}

/// One quantized fully-connected layer: row-major s8 weights, optional
/// s64 bias, and the requantization constants baked in at export time.
#[derive(Debug, Clone)]
pub struct QuantLinear {
    pub meta: QuantMeta,
    pub multiplier: i32,
    pub shift: i32,
    pub weights: Vec<i8>, // rows x cols
    pub bias: Option<Vec<i64>>,
}

impl QuantLinear {
    pub fn input_len(&self) -> usize {
        self.meta.cols
    }

    pub fn output_len(&self) -> usize {
        self.meta.rows
    }

    /// Runs the layer into `dst` (`rows` elements) with the given clamp.
    pub fn forward(&self, lhs: &[i16], dst: &mut [i16], range: ActivationRange) {
        kernel::vec_mat_mult_t_s16(
            lhs,
            &self.weights,
            self.bias.as_deref(),
            dst,
            QuantParams { multiplier: self.multiplier, shift: self.shift },
            range,
        );
    }
}

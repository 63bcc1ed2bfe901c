// Quantized s16 vector-matrix kernels and the layer container around them
pub mod kernel;
pub mod model;

// Re-exports kept minimal: the kernel entry points and their parameter types
pub use kernel::{vec_mat_mult_t_s16, vec_mat_mult_t_s16_with, ActivationRange, Backend, QuantParams};

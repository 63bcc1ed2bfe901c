use anyhow::Result;
use clap::Parser;
use log::info;
use quantvec::model::{loader, QuantLinear, QuantMeta};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "create-layer", version, about = "Write a synthetic quantized layer file")]
struct Args {
    /// Output path
    #[arg(long)]
    out: PathBuf,

    /// Output rows (matrix height)
    #[arg(long, default_value_t = 256)]
    rows: usize,

    /// Input columns (vector length)
    #[arg(long, default_value_t = 1024)]
    cols: usize,

    /// Std-dev of the weight distribution before clamping to s8
    #[arg(long, default_value_t = 32.0)]
    weight_sigma: f64,

    /// Include a random bias vector
    #[arg(long, default_value_t = false)]
    bias: bool,

    /// Requantization multiplier baked into the file
    #[arg(long, default_value_t = 1)]
    multiplier: i32,

    /// Requantization shift baked into the file
    #[arg(long, default_value_t = 0)]
    shift: i32,

    /// RNG seed
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let normal = Normal::new(0.0, args.weight_sigma)?;
    let weights: Vec<i8> = (0..args.rows * args.cols)
        .map(|_| normal.sample(&mut rng).round().clamp(-128.0, 127.0) as i8)
        .collect();
    let bias: Option<Vec<i64>> = if args.bias {
        Some((0..args.rows).map(|_| rng.gen_range(-65536i64..=65536)).collect())
    } else {
        None
    };

    let layer = QuantLinear {
        meta: QuantMeta { version: loader::VERSION, rows: args.rows, cols: args.cols },
        multiplier: args.multiplier,
        shift: args.shift,
        weights,
        bias,
    };
    layer.save(&args.out)?;

    info!("wrote layer to {}", args.out.display());
    println!(
        "wrote {} ({}x{} weights, bias={})",
        args.out.display(),
        args.rows,
        args.cols,
        args.bias
    );
    Ok(())
}

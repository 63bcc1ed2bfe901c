use clap::Parser;
use log::info;
use quantvec::{vec_mat_mult_t_s16_with, ActivationRange, Backend, QuantParams};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "qbench", version, about = "Benchmark the s16 vec-mat kernel")]
struct Args {
    /// Output rows (matrix height)
    #[arg(long, default_value_t = 256)]
    rows: usize,

    /// Input columns (vector length)
    #[arg(long, default_value_t = 1024)]
    cols: usize,

    /// Kernel invocations per input vector
    #[arg(long, default_value_t = 1000)]
    iters: usize,

    /// Independent input vectors to spread across threads
    #[arg(long, default_value_t = 1)]
    batch: usize,

    /// Threads (rayon pool; 1 runs inline)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Force the scalar core
    #[arg(long, default_value_t = false)]
    scalar: bool,

    /// Include a bias vector
    #[arg(long, default_value_t = false)]
    bias: bool,

    /// RNG seed for synthetic data
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Emit the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    backend: String,
    rows: usize,
    cols: usize,
    iters: usize,
    batch: usize,
    threads: usize,
    elapsed_s: f64,
    mmacs_per_s: f64,
    checksum: i64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let backend = if args.scalar { Backend::Scalar } else { Backend::detect() };
    info!("using backend {:?}", backend);

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let weights: Vec<i8> = (0..args.rows * args.cols)
        .map(|_| rng.gen_range(-128i32..=127) as i8)
        .collect();
    let inputs: Vec<Vec<i16>> = (0..args.batch.max(1))
        .map(|_| (0..args.cols).map(|_| rng.gen_range(-256i32..=256) as i16).collect())
        .collect();
    let bias: Option<Vec<i64>> = if args.bias {
        Some((0..args.rows).map(|_| rng.gen_range(-1000i64..=1000)).collect())
    } else {
        None
    };

    let params = QuantParams { multiplier: 1, shift: 4 };
    let range = ActivationRange::s16();

    let run = |lhs: &[i16]| {
        let mut dst = vec![0i16; args.rows];
        for _ in 0..args.iters {
            vec_mat_mult_t_s16_with(backend, lhs, &weights, bias.as_deref(), &mut dst, params, range);
        }
        dst
    };

    let t0 = Instant::now();
    let outputs: Vec<Vec<i16>> = if args.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build()
            .expect("thread pool");
        pool.install(|| {
            use rayon::prelude::*;
            inputs.par_iter().map(|lhs| run(lhs)).collect()
        })
    } else {
        inputs.iter().map(|lhs| run(lhs)).collect()
    };
    let dt = t0.elapsed();

    // Checksum keeps the kernel work observable.
    let checksum: i64 = outputs.iter().flatten().map(|&v| v as i64).sum();
    let macs = (args.rows * args.cols) as f64 * args.iters as f64 * inputs.len() as f64;
    let elapsed_s = dt.as_secs_f64();
    let mmacs_per_s = if elapsed_s > 0.0 { macs / elapsed_s / 1e6 } else { 0.0 };

    if args.json {
        let report = Report {
            backend: format!("{:?}", backend),
            rows: args.rows,
            cols: args.cols,
            iters: args.iters,
            batch: inputs.len(),
            threads: args.threads,
            elapsed_s,
            mmacs_per_s,
            checksum,
        };
        println!("{}", serde_json::to_string_pretty(&report).expect("serialize report"));
    } else {
        println!(
            "backend={:?} rows={} cols={} iters={} batch={} threads={} elapsed={:.3}s mmacs={:.1} checksum={}",
            backend, args.rows, args.cols, args.iters, inputs.len(), args.threads, elapsed_s, mmacs_per_s, checksum
        );
    }
}

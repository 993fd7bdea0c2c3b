//! OpenTensorCore simulator CLI.
//!
//! This binary drives the cycle-accurate model with generated jobs. It
//! performs:
//! 1. **Run:** One random matmul per precision pair; verifies the pipelined
//!    result against the reference model bit-for-bit, reports cycle latency
//!    and the relative error against an f32 golden, then checks the identity
//!    and zero edge jobs.
//! 2. **Stress:** Many random trials per precision pair with aggregate
//!    pass/fail counts.

use clap::{Args, Parser, Subcommand};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{fs, process};

use otc_core::config::Config;
use otc_core::fp::convert::fp22_to_output;
use otc_core::fp::format::Format;
use otc_core::fp::rounding::RoundingMode;
use otc_core::reference::reference_matmul;
use otc_core::TensorCore;

mod gen;
mod host;

use gen::{MatrixSet, XorShift32};

#[derive(Parser)]
#[command(
    name = "otcsim",
    author,
    version,
    about = "OpenTensorCore cycle-accurate simulator",
    long_about = "Runs generated D = A×B + C jobs through the pipelined tensor-core model and \
checks every result bit-for-bit against the non-pipelined reference.\n\n\
Examples:\n  otcsim run\n  otcsim run --in-format FP16 --out-format FP32 --dump\n  \
otcsim stress --trials 500 --rm RTZ --seed 42\n  otcsim run --config shape.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct JobArgs {
    /// Restrict the input precision (FP4_E2M1 | FP8_E4M3 | FP8_E5M2 | FP16).
    #[arg(long)]
    in_format: Option<String>,

    /// Restrict the output precision (FP8_E4M3 | FP8_E5M2 | FP16 | FP32).
    #[arg(long)]
    out_format: Option<String>,

    /// Rounding mode (RNE | RTZ | RDN | RUP | RMM).
    #[arg(long, default_value = "RNE")]
    rm: String,

    /// RNG seed; 0 derives one from the current time.
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// JSON configuration file (tile shape, cycle budget).
    #[arg(long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// One random job per precision pair, plus identity/zero edge jobs.
    Run {
        #[command(flatten)]
        job: JobArgs,

        /// Print the result matrices.
        #[arg(long)]
        dump: bool,
    },

    /// Many random jobs per precision pair with aggregate statistics.
    Stress {
        #[command(flatten)]
        job: JobArgs,

        /// Trials per precision pair.
        #[arg(long, default_value_t = 100)]
        trials: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    let failed = match cli.command {
        Commands::Run { job, dump } => cmd_run(&job, dump),
        Commands::Stress { job, trials } => cmd_stress(&job, trials),
    };
    if failed {
        process::exit(1);
    }
}

fn parse_format(name: &str) -> Format {
    match name {
        "FP4_E2M1" | "FP4" => Format::Fp4E2m1,
        "FP8_E4M3" | "E4M3" => Format::Fp8E4m3,
        "FP8_E5M2" | "E5M2" => Format::Fp8E5m2,
        "FP16" => Format::Fp16,
        "FP32" => Format::Fp32,
        other => {
            eprintln!("Error: unknown format '{}'", other);
            eprintln!("Valid: FP4_E2M1 | FP8_E4M3 | FP8_E5M2 | FP16 | FP32");
            process::exit(1);
        }
    }
}

fn parse_rm(name: &str) -> RoundingMode {
    match name {
        "RNE" => RoundingMode::Rne,
        "RTZ" => RoundingMode::Rtz,
        "RDN" => RoundingMode::Rdn,
        "RUP" => RoundingMode::Rup,
        "RMM" => RoundingMode::Rmm,
        other => {
            eprintln!("Error: unknown rounding mode '{}'", other);
            eprintln!("Valid: RNE | RTZ | RDN | RUP | RMM");
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&str>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {}", path, e);
        process::exit(1);
    });
    let config: Config = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config {}: {}", path, e);
        process::exit(1);
    });
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid config: {}", e);
        process::exit(1);
    }
    config
}

struct HarnessSetup {
    config: Config,
    rm: RoundingMode,
    in_formats: Vec<Format>,
    out_formats: Vec<Format>,
    rng: XorShift32,
}

fn setup(job: &JobArgs) -> HarnessSetup {
    let config = load_config(job.config.as_deref());
    let rm = parse_rm(&job.rm);
    let in_formats = match &job.in_format {
        Some(name) => vec![parse_format(name)],
        None => vec![
            Format::Fp4E2m1,
            Format::Fp8E4m3,
            Format::Fp8E5m2,
            Format::Fp16,
        ],
    };
    let out_formats = match &job.out_format {
        Some(name) => vec![parse_format(name)],
        None => vec![
            Format::Fp8E4m3,
            Format::Fp8E5m2,
            Format::Fp16,
            Format::Fp32,
        ],
    };
    for f in &in_formats {
        if !f.is_input_format() {
            eprintln!("Error: {} is not an input format", f);
            process::exit(1);
        }
    }
    for f in &out_formats {
        if !f.is_output_format() {
            eprintln!("Error: {} is not an output format", f);
            process::exit(1);
        }
    }
    let seed = if job.seed != 0 {
        job.seed
    } else {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(1)
    };
    println!(
        "Configuration: {}x{}x{} tile, rm={}, seed={}",
        config.shape.m, config.shape.k, config.shape.n, rm, seed
    );
    println!();
    HarnessSetup {
        config,
        rm,
        in_formats,
        out_formats,
        rng: XorShift32::new(seed),
    }
}

struct JobOutcome {
    cycles: u64,
    fp22_matches: usize,
    out_matches: usize,
    cells: usize,
    max_rel_err: f64,
    d_out: Vec<u32>,
}

/// Runs one job through the engine and scores it against the reference
/// model and the f32 golden.
fn run_job(
    core: &mut TensorCore,
    set: &MatrixSet,
    in_format: Format,
    out_format: Format,
    rm: RoundingMode,
    config: &Config,
) -> JobOutcome {
    let shape = config.shape;
    let reference = reference_matmul(&set.a_fp9, &set.b_fp9, &set.c_fp22, &shape, rm)
        .expect("validated shape");

    core.reset();
    core.load(&set.a_fp9, &set.b_fp9, &set.c_fp22, in_format, out_format, rm)
        .unwrap_or_else(|e| {
            eprintln!("Error: load failed: {}", e);
            process::exit(1);
        });
    let cycles = core.run_to_completion(config.sim.max_cycles).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let golden = host::golden_f32_matmul(
        &set.a_raw, &set.b_raw, &set.c_raw, shape.m, shape.k, shape.n, in_format,
    );

    let cells = shape.units();
    let mut fp22_matches = 0;
    let mut out_matches = 0;
    let mut max_rel_err = 0.0f64;
    let mut d_out = vec![0u32; cells];
    for i in 0..shape.m {
        for j in 0..shape.n {
            let cell = i * shape.n + j;
            let got = core.result_fp22(i, j).expect("completed");
            if got == reference[cell] {
                fp22_matches += 1;
            }
            let got_out = core.result_bits(i, j).expect("completed");
            d_out[cell] = got_out;
            let want_out = fp22_to_output(reference[cell], out_format, rm).expect("output format");
            if got_out == want_out {
                out_matches += 1;
            }
            let expect = golden[cell];
            if expect != 0.0 && expect.is_finite() {
                let actual = host::decode(got_out, out_format);
                let rel = ((actual - expect) / expect).abs();
                if rel > max_rel_err {
                    max_rel_err = rel;
                }
            }
        }
    }
    JobOutcome {
        cycles,
        fp22_matches,
        out_matches,
        cells,
        max_rel_err,
        d_out,
    }
}

fn print_matrix(title: &str, bits: &[u32], rows: usize, cols: usize, format: Format) {
    println!("    {}", title);
    for i in 0..rows {
        print!("      ");
        for j in 0..cols {
            print!("{:9.4} ", host::decode(bits[i * cols + j], format));
        }
        println!();
    }
}

fn cmd_run(job: &JobArgs, dump: bool) -> bool {
    let mut h = setup(job);
    let mut core = TensorCore::new(&h.config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let mut failed = false;
    for &in_format in &h.in_formats {
        for &out_format in &h.out_formats {
            let set = gen::random_set(&mut h.rng, in_format, &h.config.shape);
            let outcome = run_job(&mut core, &set, in_format, out_format, h.rm, &h.config);
            let exact = outcome.fp22_matches == outcome.cells
                && outcome.out_matches == outcome.cells;
            failed |= !exact;
            println!(
                "  In {:9} -> Out {:8} : {:2} cycles | {} | max rel err vs f32 {:.2e}",
                in_format.to_string(),
                out_format.to_string(),
                outcome.cycles,
                if exact {
                    format!("bit-exact {}/{} vs reference", outcome.out_matches, outcome.cells)
                } else {
                    format!(
                        "MISMATCH ({}/{} fp22, {}/{} output)",
                        outcome.fp22_matches, outcome.cells, outcome.out_matches, outcome.cells
                    )
                },
                outcome.max_rel_err,
            );
            if dump {
                print_matrix(
                    "Result matrix",
                    &outcome.d_out,
                    h.config.shape.m,
                    h.config.shape.n,
                    out_format,
                );
            }
        }
    }

    println!();
    failed |= run_edge_jobs(&mut core, &mut h);
    println!();
    core.stats().print();
    failed
}

/// Identity and zero-operand jobs, checked against their closed-form
/// results.
fn run_edge_jobs(core: &mut TensorCore, h: &mut HarnessSetup) -> bool {
    let shape = h.config.shape;
    let mut failed = false;

    let set = gen::identity_set(&shape);
    let outcome = run_job(core, &set, Format::Fp8E4m3, Format::Fp16, h.rm, &h.config);
    let mut identity_ok = outcome.fp22_matches == outcome.cells;
    for i in 0..shape.m.min(shape.n) {
        // Diagonal cells of I × I must decode to exactly 1.0.
        if host::decode(outcome.d_out[i * shape.n + i], Format::Fp16) != 1.0 {
            identity_ok = false;
        }
    }
    println!(
        "  Edge: identity job  {} ({} cycles)",
        if identity_ok { "ok" } else { "MISMATCH" },
        outcome.cycles
    );
    failed |= !identity_ok;

    let set = gen::zero_a_set(&mut h.rng, Format::Fp8E5m2, &shape);
    let outcome = run_job(core, &set, Format::Fp8E5m2, Format::Fp16, h.rm, &h.config);
    let zero_ok = outcome.fp22_matches == outcome.cells
        && outcome
            .d_out
            .iter()
            .all(|&bits| host::decode(bits, Format::Fp16) == 0.0);
    println!(
        "  Edge: zero-A job    {} ({} cycles)",
        if zero_ok { "ok" } else { "MISMATCH" },
        outcome.cycles
    );
    failed |= !zero_ok;
    failed
}

fn cmd_stress(job: &JobArgs, trials: usize) -> bool {
    let mut h = setup(job);
    let mut core = TensorCore::new(&h.config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let mut failed = false;
    for &in_format in &h.in_formats {
        for &out_format in &h.out_formats {
            let mut pass = 0usize;
            let mut total_cycles = 0u64;
            let mut max_rel_err = 0.0f64;
            for _ in 0..trials {
                let set = gen::random_set(&mut h.rng, in_format, &h.config.shape);
                let outcome = run_job(&mut core, &set, in_format, out_format, h.rm, &h.config);
                if outcome.fp22_matches == outcome.cells && outcome.out_matches == outcome.cells {
                    pass += 1;
                }
                total_cycles += outcome.cycles;
                max_rel_err = max_rel_err.max(outcome.max_rel_err);
            }
            failed |= pass != trials;
            println!(
                "  In {:9} -> Out {:8} : {}/{} bit-exact | avg {:.1} cyc | max rel err {:.2e}",
                in_format.to_string(),
                out_format.to_string(),
                pass,
                trials,
                total_cycles as f64 / trials as f64,
                max_rel_err,
            );
        }
    }
    println!();
    core.stats().print();
    failed
}

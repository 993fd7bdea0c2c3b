//! The M×N tensor-core array and its job control surface.
//!
//! The array owns one dot-product unit per output element plus the per-job
//! input buses (A rows, B columns, C cells) and result matrices. Units share
//! no mutable state (each reads its own operand slices and writes its own
//! output cell), so a global tick may visit them in any order; this
//! implementation walks them row-major.
//!
//! Job lifecycle: `reset` → `load` → `tick`/`run_to_completion` → indexed
//! result reads. Loading validates the request and mutates nothing on error.
//! Ticking past completion is a no-op on the result cells.

use crate::common::error::SimError;
use crate::config::{Config, ShapeConfig};
use crate::fp::convert;
use crate::fp::format::Format;
use crate::fp::rounding::RoundingMode;
use crate::stats::CoreStats;

use super::dot_product::DotProductUnit;

/// The pipelined tensor-core engine.
#[derive(Debug)]
pub struct TensorCore {
    shape: ShapeConfig,
    units: Vec<DotProductUnit>,
    /// A in row-major `[m][k]` layout.
    a: Vec<u16>,
    /// B stored column-major (`[n][k]`) so each unit gets a contiguous
    /// column slice.
    b_cols: Vec<u16>,
    /// C in row-major `[m][n]` FP22.
    c: Vec<u32>,
    d_fp22: Vec<u32>,
    d_out: Vec<u32>,
    d_valid: Vec<bool>,
    loaded: bool,
    input_format: Format,
    output_format: Format,
    rm: RoundingMode,
    cycle: u64,
    job_cycles: u64,
    stats: CoreStats,
}

impl TensorCore {
    /// Builds an engine for the configured tile shape.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] when the configuration fails validation; no
    /// engine state is built in that case.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let shape = config.shape;
        let cells = shape.units();
        Ok(Self {
            shape,
            units: (0..cells).map(|_| DotProductUnit::new(shape.k)).collect(),
            a: vec![0; shape.m * shape.k],
            b_cols: vec![0; shape.k * shape.n],
            c: vec![0; cells],
            d_fp22: vec![0; cells],
            d_out: vec![0; cells],
            d_valid: vec![false; cells],
            loaded: false,
            input_format: config.job.input_format,
            output_format: config.job.output_format,
            rm: config.job.rounding,
            cycle: 0,
            job_cycles: 0,
            stats: CoreStats::default(),
        })
    }

    /// Clears every unit and completion flag, abandoning any loaded job.
    ///
    /// The global cycle counter and accumulated statistics are preserved.
    pub fn reset(&mut self) {
        for unit in &mut self.units {
            unit.reset();
        }
        for v in &mut self.d_valid {
            *v = false;
        }
        self.loaded = false;
        self.job_cycles = 0;
    }

    /// Loads one job: A and B already converted to FP9, C to FP22.
    ///
    /// `a` is `[m][k]` row-major, `b` is `[k][n]` row-major (transposed
    /// internally), `c` is `[m][n]` row-major. Call after `reset` and before
    /// any `tick`.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] for an unsupported format tag or a slice whose
    /// length does not match the tile shape; no state is mutated on error.
    pub fn load(
        &mut self,
        a: &[u16],
        b: &[u16],
        c: &[u32],
        input_format: Format,
        output_format: Format,
        rm: RoundingMode,
    ) -> Result<(), SimError> {
        if !input_format.is_input_format() {
            return Err(SimError::UnsupportedInputFormat(input_format));
        }
        if !output_format.is_output_format() {
            return Err(SimError::UnsupportedOutputFormat(output_format));
        }
        let (m, k, n) = (self.shape.m, self.shape.k, self.shape.n);
        if a.len() != m * k {
            return Err(SimError::ShapeMismatch("A", m * k, a.len()));
        }
        if b.len() != k * n {
            return Err(SimError::ShapeMismatch("B", k * n, b.len()));
        }
        if c.len() != m * n {
            return Err(SimError::ShapeMismatch("C", m * n, c.len()));
        }

        self.a.copy_from_slice(a);
        for kk in 0..k {
            for j in 0..n {
                self.b_cols[j * k + kk] = b[kk * n + j];
            }
        }
        self.c.copy_from_slice(c);
        for v in &mut self.d_valid {
            *v = false;
        }
        self.input_format = input_format;
        self.output_format = output_format;
        self.rm = rm;
        self.loaded = true;
        self.job_cycles = 0;
        Ok(())
    }

    /// Advances every dot-product unit by one simulated cycle.
    ///
    /// Idempotent after completion: finished units are frozen by converter
    /// backpressure and their result cells never change.
    pub fn tick(&mut self) {
        let (m, k, n) = (self.shape.m, self.shape.k, self.shape.n);
        for i in 0..m {
            for j in 0..n {
                let cell = i * n + j;
                let inputs = if self.loaded {
                    Some((&self.a[i * k..(i + 1) * k], &self.b_cols[j * k..(j + 1) * k]))
                } else {
                    None
                };
                if let Some(v) = self.units[cell].tick(inputs, self.c[cell], self.rm) {
                    self.d_fp22[cell] = v;
                    // Formats are validated at load, so the conversion cannot
                    // fail here.
                    self.d_out[cell] = convert::fp22_to_output(v, self.output_format, self.rm)
                        .unwrap_or_default();
                    self.d_valid[cell] = true;
                    self.stats.results_published += 1;
                }
            }
        }
        self.cycle += 1;
        self.job_cycles += 1;
        self.stats.cycles += 1;
    }

    /// Whether every output cell has latched its final value.
    pub fn is_done(&self) -> bool {
        self.d_valid.iter().all(|&v| v)
    }

    /// Ticks until every output is valid or the budget runs out.
    ///
    /// Returns the number of cycles consumed by this call.
    ///
    /// # Errors
    ///
    /// [`SimError::JobNotLoaded`] when no job is loaded, and
    /// [`SimError::CycleBudgetExceeded`] when the budget runs out first; the
    /// engine state is then indeterminate and must be `reset` before reuse.
    pub fn run_to_completion(&mut self, max_cycles: u64) -> Result<u64, SimError> {
        if !self.loaded {
            return Err(SimError::JobNotLoaded);
        }
        for used in 1..=max_cycles {
            self.tick();
            if self.is_done() {
                self.loaded = false;
                self.stats.jobs_completed += 1;
                self.stats.last_job_cycles = self.job_cycles;
                self.stats.total_job_cycles += self.job_cycles;
                return Ok(used);
            }
        }
        Err(SimError::CycleBudgetExceeded {
            budget: max_cycles,
            completed: self.d_valid.iter().filter(|&&v| v).count(),
            total: self.shape.units(),
        })
    }

    /// Raw FP22 result at `(i, j)`, available once that cell completes.
    pub fn result_fp22(&self, i: usize, j: usize) -> Option<u32> {
        let cell = i * self.shape.n + j;
        self.d_valid[cell].then(|| self.d_fp22[cell])
    }

    /// Result at `(i, j)` converted to the job's output format.
    pub fn result_bits(&self, i: usize, j: usize) -> Option<u32> {
        let cell = i * self.shape.n + j;
        self.d_valid[cell].then(|| self.d_out[cell])
    }

    /// The configured tile shape.
    pub fn shape(&self) -> ShapeConfig {
        self.shape
    }

    /// The job's input format.
    pub fn input_format(&self) -> Format {
        self.input_format
    }

    /// The job's output format.
    pub fn output_format(&self) -> Format {
        self.output_format
    }

    /// Monotonic cycle counter across jobs.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Accumulated statistics.
    pub fn stats(&self) -> &CoreStats {
        &self.stats
    }
}

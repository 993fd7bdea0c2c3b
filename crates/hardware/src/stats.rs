//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the tensor-core model. It
//! provides:
//! 1. **Cycle counts:** Total simulated cycles and per-job completion
//!    latencies.
//! 2. **Throughput:** Jobs completed and derived cycles-per-job.
//! 3. **Reporting:** A plain-text summary printer for the CLI harness.

use std::time::Instant;

/// Statistics accumulated by the tensor-core engine.
///
/// Counters only ever increment; `reset` on the engine clears the per-job
/// state but leaves accumulated totals intact so batch runs can report
/// aggregate throughput.
#[derive(Clone, Debug)]
pub struct CoreStats {
    start_time: Instant,
    /// Total simulated cycles across all jobs.
    pub cycles: u64,
    /// Number of jobs run to completion.
    pub jobs_completed: u64,
    /// Sum of per-job completion latencies in cycles.
    pub total_job_cycles: u64,
    /// Completion latency of the most recent job in cycles.
    pub last_job_cycles: u64,
    /// Output cells published across all jobs.
    pub results_published: u64,
}

impl Default for CoreStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            jobs_completed: 0,
            total_job_cycles: 0,
            last_job_cycles: 0,
            results_published: 0,
        }
    }
}

impl CoreStats {
    /// Average completion latency per job in cycles.
    pub fn avg_job_cycles(&self) -> f64 {
        if self.jobs_completed == 0 {
            0.0
        } else {
            self.total_job_cycles as f64 / self.jobs_completed as f64
        }
    }

    /// Wall-clock seconds since the statistics were created.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Prints a summary of the collected statistics to stdout.
    pub fn print(&self) {
        println!("─── Simulation statistics ───");
        println!("  cycles simulated : {}", self.cycles);
        println!("  jobs completed   : {}", self.jobs_completed);
        println!("  results published: {}", self.results_published);
        if self.jobs_completed > 0 {
            println!("  last job latency : {} cycles", self.last_job_cycles);
            println!("  avg job latency  : {:.1} cycles", self.avg_job_cycles());
        }
        println!("  wall time        : {:.3} s", self.elapsed_secs());
    }
}

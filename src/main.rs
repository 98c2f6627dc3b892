use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use paging_core::frame_table::frame_table::DEFAULT_FRAMES;
use paging_core::proc::proc::MAX_PROCESSES;

use paging_sim::config::config::SimConfig;
use paging_sim::error::error::Result;
use paging_sim::kernel::kernel::{Kernel, RunReport};
use paging_sim::logging::logging;
use paging_sim::shutdown::shutdown::ShutdownReason;

/// Simulates a memory manager servicing paging requests from concurrent
/// user processes with second-chance page replacement.
#[derive(Parser, Debug)]
#[command(name = "oss", version)]
struct Cli {
    /// Maximum number of user processes running at once (capped at 18)
    #[arg(short = 's', long = "max-processes", default_value_t = MAX_PROCESSES)]
    max_processes: usize,

    /// Real seconds before the run is forcibly stopped
    #[arg(short = 't', long, default_value_t = 2)]
    seconds: u64,

    /// Where event notices are written
    #[arg(short = 'l', long, default_value = "program.log")]
    log_file: PathBuf,

    /// Total user processes created over the whole run
    #[arg(long, default_value_t = 100)]
    total: usize,

    /// Physical frames available
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    frames: usize,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> SimConfig {
        SimConfig {
            max_total: self.total,
            frames: self.frames,
            run_budget: Duration::from_secs(self.seconds),
            log_file: self.log_file,
            seed: self.seed,
            ..SimConfig::default()
        }
        .with_max_concurrent(self.max_processes)
    }
}

fn run(config: SimConfig) -> Result<RunReport> {
    config.validate()?;
    logging::init(&config)?;

    let mut kernel = Kernel::new(config)?;
    if let Err(e) = kernel.shutdown_controller().install_interrupt_handler() {
        kernel.shutdown(ShutdownReason::Fatal);
        return Err(e);
    }
    kernel.run()
}

fn main() -> ExitCode {
    let config = Cli::parse().into_config();

    match run(config) {
        Ok(report) => {
            println!("oss: {}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("oss: {}", e);
            ExitCode::FAILURE
        }
    }
}

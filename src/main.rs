use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cpu_governor::config::GovernorConfig;
use cpu_governor::constants::*;
use cpu_governor::error::{GovernorError, Result};
use cpu_governor::policy::PolicyMode;
use cpu_governor::run_governor;
use cpu_governor::util::configured_cpu_count;
use cpu_governor::util::fs::RootedFs;

/// Userspace cpufreq governor: scales each cpu's clock from its measured utilization
#[derive(Parser, Debug)]
#[command(name = "cpu-governor", version, about)]
struct Cli {
	/// Count niced processes as busy time
	#[arg(short = 'n', long = "include-nice")]
	include_nice: bool,

	/// Increase output verbosity, may be repeated
	#[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
	verbose: u8,

	/// Only print errors
	#[arg(short, long)]
	quiet: bool,

	/// Policy mode: 0 = sine, 1 = aggressive, 2 = passive, 3 = leaps
	#[arg(short, long, default_value_t = PolicyMode::Aggressive)]
	mode: PolicyMode,

	/// Frequency step in kHz; forces a synthesized table
	#[arg(short, long)]
	step: Option<u32>,

	/// Polling interval in milliseconds
	#[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
	poll: u64,

	/// Number of logical cpus sharing one frequency domain
	#[arg(short = 'c', long = "threads-per-unit")]
	threads_per_unit: Option<usize>,

	/// Usage percentage at which a cpu asks for more speed
	#[arg(short = 'u', long = "upper", default_value_t = DEFAULT_HIGH_WATER_PCT)]
	high_water: u8,

	/// Usage percentage at which a cpu asks for less speed
	#[arg(short = 'l', long = "lower", default_value_t = DEFAULT_LOW_WATER_PCT)]
	low_water: u8,

	/// Put back the original scaling governors on exit
	#[arg(long)]
	restore_governor: bool,
}

impl Cli {
	fn to_config(&self) -> GovernorConfig {
		GovernorConfig {
			mode: self.mode,
			step_khz: self.step,
			poll_interval: Duration::from_millis(self.poll),
			high_water: self.high_water,
			low_water: self.low_water,
			threads_per_unit: self.threads_per_unit,
			ignore_nice: !self.include_nice,
			restore_governor: self.restore_governor,
		}
	}

	fn default_log_level(&self) -> &'static str {
		if self.quiet {
			return "error";
		}
		match self.verbose {
			0 => "info",
			1 => "debug",
			_ => "trace",
		}
	}
}

fn init_logging(default_level: &str) {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
		.with_target(false)
		.init();
}

fn ensure_root() -> Result<()> {
	// SAFETY: getuid has no preconditions and cannot fail.
	let uid = unsafe { libc::getuid() };
	if uid != 0 {
		return Err(GovernorError::Permission(
			"only root can change cpu frequencies".to_string(),
		));
	}
	Ok(())
}

fn lower_own_priority() {
	// SAFETY: nice only adjusts the calling process's scheduling priority.
	let result = unsafe { libc::nice(DAEMON_NICE_INCREMENT) };
	if result == -1 {
		warn!("Could not lower own priority");
	}
}

fn run(cli: &Cli) -> Result<()> {
	let config = cli.to_config();
	config.validate()?;

	lower_own_priority();
	ensure_root()?;

	let shutdown = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&shutdown);
	// SIGINT, SIGTERM and SIGHUP all stop the daemon
	ctrlc::set_handler(move || {
		flag.store(true, Ordering::SeqCst);
	})
	.map_err(|e| GovernorError::Config(format!("cannot install signal handler: {e}")))?;

	run_governor(config, Box::new(RootedFs::host()), configured_cpu_count(), &shutdown)?;
	info!("Exiting");
	Ok(())
}

fn main() {
	let cli = match Cli::try_parse() {
		Ok(cli) => cli,
		Err(e) => {
			let code = if e.use_stderr() { libc::ENOTSUP } else { 0 };
			let _ = e.print();
			process::exit(code);
		},
	};

	init_logging(cli.default_log_level());

	if let Err(e) = run(&cli) {
		error!("{}", e);
		if let GovernorError::Probe { .. } = e {
			error!("Make sure the kernel has cpufreq support for this cpu and the userspace governor is available");
		}
		process::exit(e.exit_code());
	}
}

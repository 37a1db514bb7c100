pub mod config;
pub mod constants;
pub mod cpufreq;
pub mod decision;
pub mod error;
pub mod freq_table;
pub mod governor;
pub mod policy;
pub mod probe;
pub mod report;
pub mod snapshot;
pub mod topology;
pub mod util;

use std::sync::atomic::AtomicBool;

use crate::config::GovernorConfig;
use crate::error::Result;
use crate::governor::{Governor, RunSummary};
use crate::util::fs::SysfsAccess;

/// Takes over frequency scaling and governs until `shutdown` is set
///
/// This is the main entry point of the daemon. Startup failures are returned before any unit is
/// touched beyond its governor switch; once running, every unit is left at full speed on exit.
///
/// # Arguments
///
/// * `config` - Tunables, validated before anything is probed
/// * `fs` - Access to `/proc` and `/sys`, usually `RootedFs::host()`
/// * `total_cpus` - Number of logical cpus to govern
/// * `shutdown` - Set from the signal handler to stop after the current cycle
pub fn run_governor(
	config: GovernorConfig,
	fs: Box<dyn SysfsAccess>,
	total_cpus: usize,
	shutdown: &AtomicBool,
) -> Result<RunSummary> {
	report::log_settings(&config, total_cpus);

	let mut governor = Governor::new(config, fs, total_cpus)?;
	report::log_units(governor.layout(), governor.units());

	governor.run(shutdown);

	let summary = governor.shutdown();
	report::log_summary(&summary);
	Ok(summary)
}

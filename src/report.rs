use tracing::{debug, info};

use crate::config::GovernorConfig;
use crate::constants::KHZ_PER_MHZ;
use crate::freq_table::FrequencyTable;
use crate::governor::RunSummary;
use crate::probe::UnitLayout;
use crate::topology::ScalableUnit;

/// Formats a table as a space separated list of MHz values, fastest first
pub fn format_steps(table: &FrequencyTable) -> String {
	table
		.entries()
		.iter()
		.map(|khz| (khz / KHZ_PER_MHZ).to_string())
		.collect::<Vec<_>>()
		.join(" ")
}

/// One line describing a unit's range and table
pub fn describe_unit(unit: &ScalableUnit) -> String {
	let last = unit.members.end.saturating_sub(1);
	let cpus = if last > unit.leader {
		format!("cpu{}-{}", unit.leader, last)
	} else {
		format!("cpu{}", unit.leader)
	};

	format!(
		"{}: {} - {} MHz ({} steps, previous governor {}): {}",
		cpus,
		unit.limits.min / KHZ_PER_MHZ,
		unit.limits.max / KHZ_PER_MHZ,
		unit.table.len(),
		unit.original_governor,
		format_steps(&unit.table)
	)
}

/// Logs the settings the daemon starts with
pub fn log_settings(config: &GovernorConfig, total_cpus: usize) {
	info!("cpu-governor v{} starting", env!("CARGO_PKG_VERSION"));
	info!(
		"Settings: mode {} ({}), poll {} ms, upper {}%, lower {}%, step {}",
		config.mode,
		config.mode.code(),
		config.poll_interval.as_millis(),
		config.high_water,
		config.low_water,
		match config.step_khz {
			Some(step) => format!("{} MHz", u64::from(step) / KHZ_PER_MHZ),
			None => "from driver".to_string(),
		}
	);
	debug!(
		total_cpus,
		ignore_nice = config.ignore_nice,
		restore_governor = config.restore_governor,
		"options"
	);
}

/// Logs the detected layout and every unit's frequency table
pub fn log_units(layout: UnitLayout, units: &[ScalableUnit]) {
	info!(
		"Found {} scalable unit(s), {} cpu(s) per unit (from {})",
		layout.unit_count(),
		layout.threads_per_unit,
		layout.source
	);

	for unit in units {
		info!("{}", describe_unit(unit));
	}
}

/// Logs the statistics gathered over the run
pub fn log_summary(summary: &RunSummary) {
	// truncate to whole seconds
	let elapsed = std::time::Duration::from_secs(summary.elapsed.as_secs());
	info!(
		"Ran for {} and made {} frequency transition(s)",
		humantime::format_duration(elapsed),
		summary.transitions
	);
}

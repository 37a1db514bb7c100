use std::io;

use tracing::{debug, info};

use crate::constants::*;
use crate::error::{GovernorError, Result};
use crate::freq_table::{FreqLimits, FreqScale, FrequencyTable};
use crate::util::fs::SysfsAccess;
use crate::util::{cpufreq_attr, parse_leading_u64};

/// Frequency information read from one unit's cpufreq directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFrequencies {
	pub limits: FreqLimits,
	pub scale: FreqScale,
	pub table: FrequencyTable,
}

/// Reads a numeric cpufreq attribute, failing startup if it is missing or malformed
fn read_freq_attr(fs: &dyn SysfsAccess, cpu_id: usize, attr: &str) -> Result<u64> {
	let path = cpufreq_attr(cpu_id, attr);
	let text = fs.read_to_string(&path).map_err(|e| GovernorError::probe(&path, e))?;
	parse_leading_u64(&text).ok_or_else(|| {
		GovernorError::probe(
			&path,
			io::Error::new(io::ErrorKind::InvalidData, format!("not a frequency: {:?}", text.trim())),
		)
	})
}

/// Reads the limits of a unit and builds its frequency table
///
/// The driver's own list of frequencies is used unless `step_override` is given or the list is
/// missing, in which case the table is synthesized from the limits with the given step.
pub fn read_unit_frequencies(
	fs: &dyn SysfsAccess,
	cpu_id: usize,
	step_override: Option<u64>,
	default_step: u64,
) -> Result<UnitFrequencies> {
	let max_raw = read_freq_attr(fs, cpu_id, CPUINFO_MAX_FREQ)?;
	let min_raw = read_freq_attr(fs, cpu_id, CPUINFO_MIN_FREQ)?;

	let scale = FreqScale::detect(max_raw);
	if scale == FreqScale::Mhz {
		info!("cpu{}: driver reports MHz, converting", cpu_id);
	}

	let limits = FreqLimits {
		min: scale.to_khz(min_raw),
		max: scale.to_khz(max_raw),
	};

	let listed = match step_override {
		Some(_) => None,
		None => fs
			.read_to_string(&cpufreq_attr(cpu_id, SCALING_AVAILABLE_FREQUENCIES))
			.ok()
			.and_then(|text| FrequencyTable::parse_available(&text, scale)),
	};

	let table = match listed {
		Some(table) => {
			debug!("cpu{}: using {} driver-listed frequencies", cpu_id, table.len());
			table
		},
		None => {
			let step = step_override.unwrap_or(default_step);
			debug!("cpu{}: synthesizing table with {} kHz step", cpu_id, step);
			FrequencyTable::synthesize(limits, step)
		},
	};

	Ok(UnitFrequencies { limits, scale, table })
}

/// Reads the scaling governor currently active for a cpu
pub fn read_governor(fs: &dyn SysfsAccess, cpu_id: usize) -> Result<String> {
	let path = cpufreq_attr(cpu_id, SCALING_GOVERNOR);
	let text = fs.read_to_string(&path).map_err(|e| GovernorError::probe(&path, e))?;
	Ok(text.trim().to_string())
}

/// Writes a scaling governor name for a cpu
pub fn write_governor(fs: &dyn SysfsAccess, cpu_id: usize, name: &str) -> Result<()> {
	let path = cpufreq_attr(cpu_id, SCALING_GOVERNOR);
	let line = format!("{name}\n");
	let written = fs.write(&path, line.as_bytes()).map_err(|e| GovernorError::probe(&path, e))?;
	if written != line.len() {
		return Err(GovernorError::probe(
			&path,
			io::Error::new(io::ErrorKind::WriteZero, format!("wrote {written} of {} bytes", line.len())),
		));
	}
	Ok(())
}

/// Hands a unit over to the userspace governor so `scaling_setspeed` becomes writable
///
/// The switch is verified by reading the governor back. Returns the governor that was active
/// before.
pub fn engage_userspace(fs: &dyn SysfsAccess, cpu_id: usize) -> Result<String> {
	let previous = read_governor(fs, cpu_id)?;
	if previous == USERSPACE_GOVERNOR {
		return Ok(previous);
	}

	debug!("cpu{}: switching governor {} -> {}", cpu_id, previous, USERSPACE_GOVERNOR);
	write_governor(fs, cpu_id, USERSPACE_GOVERNOR)?;

	let found = read_governor(fs, cpu_id)?;
	if found != USERSPACE_GOVERNOR {
		return Err(GovernorError::GovernorMismatch { cpu: cpu_id, found });
	}

	Ok(previous)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::fs::RootedFs;
	use std::fs;
	use std::path::Path;
	use tempfile::TempDir;

	fn cpufreq_tree(files: &[(&str, &str)]) -> TempDir {
		let dir = tempfile::tempdir().unwrap();
		let cpufreq = dir.path().join("sys/devices/system/cpu/cpu0/cpufreq");
		fs::create_dir_all(&cpufreq).unwrap();
		for (name, contents) in files {
			fs::write(cpufreq.join(name), contents).unwrap();
		}
		dir
	}

	#[test]
	fn test_synthesizes_without_list() {
		let dir = cpufreq_tree(&[("cpuinfo_max_freq", "2000000\n"), ("cpuinfo_min_freq", "800000\n")]);
		let fs = RootedFs::new(dir.path());

		let unit = read_unit_frequencies(&fs, 0, None, 100_000).unwrap();
		assert_eq!(unit.scale, FreqScale::Khz);
		assert_eq!(unit.limits, FreqLimits { min: 800_000, max: 2_000_000 });
		assert_eq!(unit.table.len(), 13);
	}

	#[test]
	fn test_prefers_driver_list() {
		let dir = cpufreq_tree(&[
			("cpuinfo_max_freq", "2000000\n"),
			("cpuinfo_min_freq", "800000\n"),
			("scaling_available_frequencies", "800000 1200000 1600000 2000000 \n"),
		]);
		let fs = RootedFs::new(dir.path());

		let unit = read_unit_frequencies(&fs, 0, None, 100_000).unwrap();
		assert_eq!(unit.table.entries(), &[2_000_000, 1_600_000, 1_200_000, 800_000]);

		let unit = read_unit_frequencies(&fs, 0, Some(600_000), 100_000).unwrap();
		assert_eq!(unit.table.entries(), &[2_000_000, 1_400_000, 800_000]);
	}

	#[test]
	fn test_mhz_driver_is_scaled() {
		let dir = cpufreq_tree(&[
			("cpuinfo_max_freq", "1000\n"),
			("cpuinfo_min_freq", "400\n"),
			("scaling_available_frequencies", "400 600 800 1000\n"),
		]);
		let fs = RootedFs::new(dir.path());

		let unit = read_unit_frequencies(&fs, 0, None, 100_000).unwrap();
		assert_eq!(unit.scale, FreqScale::Mhz);
		assert_eq!(unit.limits, FreqLimits { min: 400_000, max: 1_000_000 });
		assert_eq!(unit.table.entries(), &[1_000_000, 800_000, 600_000, 400_000]);
	}

	#[test]
	fn test_missing_limit_is_probe_error() {
		let dir = cpufreq_tree(&[("cpuinfo_max_freq", "2000000\n")]);
		let fs = RootedFs::new(dir.path());

		let err = read_unit_frequencies(&fs, 0, None, 100_000).unwrap_err();
		assert!(matches!(err, GovernorError::Probe { .. }));
		assert!(err.to_string().contains("cpuinfo_min_freq"));
	}

	#[test]
	fn test_garbage_limit_is_probe_error() {
		let dir = cpufreq_tree(&[("cpuinfo_max_freq", "fast\n"), ("cpuinfo_min_freq", "800000\n")]);
		let fs = RootedFs::new(dir.path());
		assert!(matches!(
			read_unit_frequencies(&fs, 0, None, 100_000),
			Err(GovernorError::Probe { .. })
		));
	}

	#[test]
	fn test_engage_userspace_switches_and_reports_previous() {
		let dir = cpufreq_tree(&[("scaling_governor", "ondemand\n")]);
		let fs = RootedFs::new(dir.path());

		assert_eq!(engage_userspace(&fs, 0).unwrap(), "ondemand");
		assert_eq!(read_governor(&fs, 0).unwrap(), "userspace");
		assert_eq!(engage_userspace(&fs, 0).unwrap(), "userspace");
	}

	#[derive(Debug)]
	struct StubbornFs(RootedFs);

	impl SysfsAccess for StubbornFs {
		fn read_to_string(&self, path: &Path) -> io::Result<String> {
			self.0.read_to_string(path)
		}

		fn write(&self, _path: &Path, contents: &[u8]) -> io::Result<usize> {
			Ok(contents.len())
		}
	}

	#[test]
	fn test_unconfirmed_switch_is_mismatch() {
		let dir = cpufreq_tree(&[("scaling_governor", "performance\n")]);
		let fs = StubbornFs(RootedFs::new(dir.path()));

		let err = engage_userspace(&fs, 0).unwrap_err();
		match err {
			GovernorError::GovernorMismatch { cpu, found } => {
				assert_eq!(cpu, 0);
				assert_eq!(found, "performance");
			},
			other => panic!("unexpected error: {other}"),
		}
	}
}

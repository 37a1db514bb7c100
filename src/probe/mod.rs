pub mod cpuid;
pub mod sibling;

use std::fmt::{self, Debug};

use tracing::{debug, warn};

use crate::util::fs::SysfsAccess;

/// Where the threads-per-unit figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSource {
	/// Set on the command line
	ManualOverride,
	/// Counted from the cpufreq sibling list of cpu0
	SiblingList,
	/// Decoded from the processor identification instruction
	Instruction,
	/// Nothing better was available
	DefaultSingleThread,
}

impl ProbeSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProbeSource::ManualOverride => "manual override",
			ProbeSource::SiblingList => "sibling list",
			ProbeSource::Instruction => "cpuid",
			ProbeSource::DefaultSingleThread => "default",
		}
	}
}

impl fmt::Display for ProbeSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A strategy for finding how many logical cpus share one frequency domain
pub trait TopologyProbe: Debug {
	/// Which source this probe represents
	fn source(&self) -> ProbeSource;

	/// Returns the number of logical cpus per scalable unit
	///
	/// `None` means the probe's data source does not exist on this system and the next probe
	/// should be tried. A returned count is final, even when the probe fell back to 1.
	fn threads_per_unit(&self, fs: &dyn SysfsAccess) -> Option<usize>;
}

/// Result of topology detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLayout {
	pub total_cpus: usize,
	pub threads_per_unit: usize,
	pub source: ProbeSource,
}

impl UnitLayout {
	pub fn unit_count(&self) -> usize {
		self.total_cpus / self.threads_per_unit
	}

	/// Leader (lowest cpu id) of the unit containing `cpu_id`
	pub fn leader_of(&self, cpu_id: usize) -> usize {
		(cpu_id / self.threads_per_unit) * self.threads_per_unit
	}
}

/// Probes tried in order on a live system
pub fn create_probes() -> Vec<Box<dyn TopologyProbe>> {
	vec![
		Box::new(sibling::SiblingListProbe),
		Box::new(cpuid::InstructionProbe),
	]
}

/// Works out the grouping of logical cpus into scalable units
///
/// A manual override wins, a single cpu is trivially its own unit, and otherwise the probes are
/// consulted in order. A result that does not divide `total_cpus` evenly is replaced by 1. This
/// never fails.
pub fn detect_unit_layout(
	total_cpus: usize,
	manual_override: Option<usize>,
	probes: &[Box<dyn TopologyProbe>],
	fs: &dyn SysfsAccess,
) -> UnitLayout {
	let total_cpus = total_cpus.max(1);

	let (threads, source) = if let Some(threads) = manual_override {
		(threads, ProbeSource::ManualOverride)
	} else if total_cpus == 1 {
		(1, ProbeSource::DefaultSingleThread)
	} else {
		probes
			.iter()
			.find_map(|probe| {
				let found = probe.threads_per_unit(fs);
				debug!(probe = %probe.source(), ?found, "topology probe");
				found.map(|threads| (threads, probe.source()))
			})
			.unwrap_or((1, ProbeSource::DefaultSingleThread))
	};

	let threads_per_unit = if threads == 0 || total_cpus % threads != 0 {
		warn!(
			"{} cpus is not a multiple of {} threads per unit ({}), assuming 1",
			total_cpus, threads, source
		);
		1
	} else {
		threads
	};

	UnitLayout {
		total_cpus,
		threads_per_unit,
		source,
	}
}

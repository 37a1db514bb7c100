use tracing::warn;

use crate::constants::AFFECTED_CPUS;
use crate::probe::{ProbeSource, TopologyProbe};
use crate::util::cpufreq_attr;
use crate::util::fs::SysfsAccess;

/// Counts the cpus listed in cpu0's `affected_cpus`
///
/// Every cpu in that list changes frequency together with cpu0; the count is assumed to hold for
/// the whole system.
#[derive(Debug, Clone)]
pub struct SiblingListProbe;

/// Number of entries in a sibling list, or 1 if the list does not start with cpu 0
pub fn count_siblings(list: &str) -> usize {
	let mut ids = list.split_whitespace().map(str::parse::<usize>);

	match ids.next() {
		Some(Ok(0)) => 1 + ids.take_while(Result::is_ok).count(),
		_ => {
			warn!("cpu0 scaling does not affect cpu0 ({:?}), assuming 1 thread per unit", list.trim());
			1
		},
	}
}

impl TopologyProbe for SiblingListProbe {
	fn source(&self) -> ProbeSource {
		ProbeSource::SiblingList
	}

	fn threads_per_unit(&self, fs: &dyn SysfsAccess) -> Option<usize> {
		let list = fs.read_to_string(&cpufreq_attr(0, AFFECTED_CPUS)).ok()?;
		Some(count_siblings(&list))
	}
}

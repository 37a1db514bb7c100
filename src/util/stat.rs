use crate::error::{GovernorError, Result};
use crate::snapshot::AccountingSnapshot;

/// Counters a kernel must report for a cpu line to be usable (user, nice, system, idle)
const REQUIRED_COUNTERS: usize = 4;

/// Extracts the accounting counters for `cpu_id` from the contents of `/proc/stat`
///
/// Kernels older than 2.6 only report the first four counters; the missing ones read as zero.
pub fn parse_cpu_line(stat: &str, cpu_id: usize) -> Result<AccountingSnapshot> {
	let label = format!("cpu{cpu_id}");

	let line = stat
		.lines()
		.find(|line| line.split_whitespace().next() == Some(label.as_str()))
		.ok_or_else(|| GovernorError::Parse(format!("no {label} line in /proc/stat")))?;

	let mut counters = [0u64; 7];
	let mut found = 0;
	for (slot, field) in counters.iter_mut().zip(line.split_whitespace().skip(1)) {
		*slot = field
			.parse()
			.map_err(|_| GovernorError::Parse(format!("bad counter {field:?} on {label} line")))?;
		found += 1;
	}

	if found < REQUIRED_COUNTERS {
		return Err(GovernorError::Parse(format!(
			"{label} line has {found} counters, expected at least {REQUIRED_COUNTERS}"
		)));
	}

	Ok(AccountingSnapshot::from_counters(counters))
}

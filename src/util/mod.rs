pub mod fs;
pub mod stat;

use std::path::PathBuf;

use crate::constants::SYSFS_CPU_TREE;

/// Path of the cpufreq control directory for a logical cpu
///
/// # Arguments
///
/// * `cpu_id` - The logical cpu number
///
/// # Returns
///
/// `sys/devices/system/cpu/cpu<id>/cpufreq`, relative to the filesystem root
pub fn cpufreq_dir(cpu_id: usize) -> PathBuf {
	PathBuf::from(SYSFS_CPU_TREE).join(format!("cpu{cpu_id}")).join("cpufreq")
}

/// Path of one cpufreq attribute file for a logical cpu
pub fn cpufreq_attr(cpu_id: usize, attr: &str) -> PathBuf {
	cpufreq_dir(cpu_id).join(attr)
}

/// Number of logical cpus configured in the system, whether or not this process may run on them
///
/// Affinity masks and cgroup quotas do not shrink the count, so every cpu gets governed.
pub fn configured_cpu_count() -> usize {
	// SAFETY: sysconf only reads a system constant.
	let raw = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };
	cpu_count_or_one(raw)
}

/// Turns a raw `sysconf` result into a cpu count, treating errors and nonsense as one cpu
fn cpu_count_or_one(raw: libc::c_long) -> usize {
	usize::try_from(raw).ok().filter(|&count| count >= 1).unwrap_or(1)
}

/// Parses the leading unsigned integer of a sysfs value, ignoring surrounding whitespace
pub fn parse_leading_u64(text: &str) -> Option<u64> {
	let trimmed = text.trim_start();
	let end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
	trimmed[..end].parse().ok()
}

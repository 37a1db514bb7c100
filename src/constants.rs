// Kernel interfaces, relative to the filesystem root so tests can supply their own tree
pub const PROC_STAT: &str = "proc/stat";
pub const SYSFS_CPU_TREE: &str = "sys/devices/system/cpu";

// Per-cpu cpufreq attributes
pub const CPUINFO_MAX_FREQ: &str = "cpuinfo_max_freq";
pub const CPUINFO_MIN_FREQ: &str = "cpuinfo_min_freq";
pub const SCALING_AVAILABLE_FREQUENCIES: &str = "scaling_available_frequencies";
pub const SCALING_GOVERNOR: &str = "scaling_governor";
pub const SCALING_SETSPEED: &str = "scaling_setspeed";
pub const AFFECTED_CPUS: &str = "affected_cpus";

pub const USERSPACE_GOVERNOR: &str = "userspace";

// Defaults for the tunables
pub const DEFAULT_STEP_KHZ: u32 = 100_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_HIGH_WATER_PCT: u8 = 80;
pub const DEFAULT_LOW_WATER_PCT: u8 = 20;

// Frequency table limits
pub const MAX_TABLE_ENTRIES: usize = 100;
/// Largest `cpuinfo_max_freq` still taken as MHz rather than kHz
pub const MHZ_DETECTION_LIMIT: u64 = 10_000;
pub const KHZ_PER_MHZ: u64 = 1000;

/// Longest uninterrupted sleep while waiting for the next poll, so termination is noticed quickly
pub const SHUTDOWN_CHECK_INTERVAL_MS: u64 = 100;

/// Scheduling priority adjustment applied to the daemon itself
pub const DAEMON_NICE_INCREMENT: i32 = 5;

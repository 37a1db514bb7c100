/// Cumulative time accounting for one logical cpu, in clock ticks
///
/// Mirrors the first seven counters of a `cpuN` line in `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountingSnapshot {
	pub user: u64,
	pub nice: u64,
	pub system: u64,
	pub idle: u64,
	pub iowait: u64,
	pub irq: u64,
	pub softirq: u64,
}

/// Ticks elapsed between two snapshots, split into busy and total time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickDelta {
	pub busy: u64,
	pub total: u64,
}

impl AccountingSnapshot {
	pub fn from_counters(counters: [u64; 7]) -> Self {
		let [user, nice, system, idle, iowait, irq, softirq] = counters;
		Self {
			user,
			nice,
			system,
			idle,
			iowait,
			irq,
			softirq,
		}
	}

	/// Ticks elapsed since `prev`
	///
	/// A counter that went backwards contributes nothing. Niced time is only counted as busy
	/// when `ignore_nice` is false; idle and iowait only ever count toward the total.
	pub fn delta_since(&self, prev: &AccountingSnapshot, ignore_nice: bool) -> TickDelta {
		let user = self.user.saturating_sub(prev.user);
		let nice = self.nice.saturating_sub(prev.nice);
		let system = self.system.saturating_sub(prev.system);
		let idle = self.idle.saturating_sub(prev.idle);
		let iowait = self.iowait.saturating_sub(prev.iowait);
		let irq = self.irq.saturating_sub(prev.irq);
		let softirq = self.softirq.saturating_sub(prev.softirq);

		let mut busy = user + system + irq + softirq;
		if !ignore_nice {
			busy += nice;
		}

		TickDelta {
			busy,
			total: user + nice + system + idle + iowait + irq + softirq,
		}
	}
}

impl TickDelta {
	/// Busy fraction of the interval, or `None` when no ticks elapsed
	pub fn usage_fraction(&self) -> Option<f64> {
		if self.total == 0 {
			return None;
		}
		Some(self.busy as f64 / self.total as f64)
	}
}

use std::ops::Range;
use std::rc::Rc;

use crate::freq_table::{FreqLimits, FreqScale, FrequencyTable};
use crate::probe::UnitLayout;
use crate::snapshot::{AccountingSnapshot, TickDelta};

/// Per-cpu state tracked by the governor
#[derive(Debug, Clone)]
pub struct LogicalCore {
	pub id: usize,

	/// Index of the owning unit in `CpuTopology::units`
	pub unit: usize,

	pub previous: AccountingSnapshot,
	pub current: AccountingSnapshot,

	/// Table shared with the other members of the unit
	pub table: Rc<FrequencyTable>,

	pub limits: FreqLimits,

	/// Last frequency written for this cpu's unit, in kHz
	pub current_speed: u64,
}

impl LogicalCore {
	/// Stores a fresh snapshot, keeping the previous one for the delta
	pub fn record(&mut self, snapshot: AccountingSnapshot) {
		self.previous = self.current;
		self.current = snapshot;
	}

	pub fn delta(&self, ignore_nice: bool) -> TickDelta {
		self.current.delta_since(&self.previous, ignore_nice)
	}
}

/// A run of logical cpus that share one frequency domain
#[derive(Debug, Clone)]
pub struct ScalableUnit {
	/// Lowest cpu id in the unit; all transitions are issued through it
	pub leader: usize,
	pub members: Range<usize>,
	pub table: Rc<FrequencyTable>,
	pub limits: FreqLimits,
	pub scale: FreqScale,

	/// Position of the current speed in `table`
	pub speed_index: usize,

	/// Governor that was active before the daemon took over
	pub original_governor: String,
}

impl ScalableUnit {
	pub fn current_target(&self) -> u64 {
		self.table.get(self.speed_index).unwrap_or_else(|| self.table.fastest())
	}
}

/// Frequency setup of one unit, gathered before the topology is assembled
#[derive(Debug, Clone)]
pub struct UnitSetup {
	pub limits: FreqLimits,
	pub scale: FreqScale,
	pub table: FrequencyTable,
	pub original_governor: String,
}

/// The cpus of the system grouped into scalable units
#[derive(Debug, Clone)]
pub struct CpuTopology {
	pub layout: UnitLayout,
	pub cores: Vec<LogicalCore>,
	pub units: Vec<ScalableUnit>,
}

impl CpuTopology {
	/// Assembles cores and units from a layout and one setup per unit, in unit order
	///
	/// Every unit starts at its fastest table entry, which is what the daemon assumes the
	/// hardware runs at when it takes over.
	pub fn assemble(layout: UnitLayout, setups: Vec<UnitSetup>) -> Self {
		let mut cores = Vec::with_capacity(layout.total_cpus);
		let mut units = Vec::with_capacity(setups.len());

		for (unit_idx, setup) in setups.into_iter().enumerate() {
			let leader = unit_idx * layout.threads_per_unit;
			let members = leader..leader + layout.threads_per_unit;
			let table = Rc::new(setup.table);

			for id in members.clone() {
				cores.push(LogicalCore {
					id,
					unit: unit_idx,
					previous: AccountingSnapshot::default(),
					current: AccountingSnapshot::default(),
					table: Rc::clone(&table),
					limits: setup.limits,
					current_speed: setup.limits.max,
				});
			}

			units.push(ScalableUnit {
				leader,
				members,
				table,
				limits: setup.limits,
				scale: setup.scale,
				speed_index: 0,
				original_governor: setup.original_governor,
			});
		}

		Self { layout, cores, units }
	}

	/// Unit led by `cpu_id`, if that cpu is a leader
	pub fn unit_led_by(&self, cpu_id: usize) -> Option<usize> {
		let core = self.cores.get(cpu_id)?;
		(self.layout.leader_of(cpu_id) == cpu_id).then_some(core.unit)
	}

	/// Number of logical cpus in the system
	pub fn cpu_count(&self) -> usize {
		self.cores.len()
	}
}

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::config::GovernorConfig;
use crate::constants::*;
use crate::cpufreq::{engage_userspace, read_unit_frequencies, write_governor};
use crate::decision::{self, Decision};
use crate::error::{GovernorError, Result};
use crate::policy::PolicyMode;
use crate::probe::{TopologyProbe, UnitLayout, create_probes, detect_unit_layout};
use crate::topology::{CpuTopology, LogicalCore, ScalableUnit, UnitSetup};
use crate::util::cpufreq_attr;
use crate::util::fs::SysfsAccess;
use crate::util::stat::parse_cpu_line;

/// Counters kept over the lifetime of the daemon
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
	/// Frequency writes the kernel accepted in full
	pub transitions: u64,
	pub started: Instant,
}

impl Statistics {
	fn new() -> Self {
		Self {
			transitions: 0,
			started: Instant::now(),
		}
	}
}

/// What the daemon reports when it stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
	pub elapsed: Duration,
	pub transitions: u64,
}

/// Position of the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
	/// Between cycles, waiting for the next poll
	Running,
	/// Collecting votes for the unit at this index
	EvaluatingUnit(usize),
	/// Carrying out a verdict for the unit at this index
	Applying(usize, Decision),
}

/// The governor: every piece of mutable state the daemon owns
#[derive(Debug)]
pub struct Governor {
	config: GovernorConfig,
	fs: Box<dyn SysfsAccess>,
	topology: CpuTopology,
	stats: Statistics,
}

impl Governor {
	/// Sets up the governor for a live system using the default topology probes
	pub fn new(config: GovernorConfig, fs: Box<dyn SysfsAccess>, total_cpus: usize) -> Result<Self> {
		Self::with_probes(config, fs, total_cpus, &create_probes())
	}

	/// Sets up the governor with an explicit list of topology probes
	///
	/// Detects the unit layout, builds each unit's frequency table, takes every unit over with
	/// the userspace governor and records a first accounting sample per cpu. Any failure here
	/// is fatal.
	pub fn with_probes(
		config: GovernorConfig,
		fs: Box<dyn SysfsAccess>,
		total_cpus: usize,
		probes: &[Box<dyn TopologyProbe>],
	) -> Result<Self> {
		config.validate()?;

		let layout = detect_unit_layout(total_cpus, config.threads_per_unit, probes, fs.as_ref());
		let topology = Self::probe_units(&config, fs.as_ref(), layout)?;

		let mut governor = Self {
			config,
			fs,
			topology,
			stats: Statistics::new(),
		};

		for cpu in 0..governor.topology.cpu_count() {
			governor.sample(cpu).map_err(|e| match e {
				GovernorError::Io(source) => GovernorError::probe(PROC_STAT, source),
				other => other,
			})?;
		}

		Ok(governor)
	}

	fn probe_units(config: &GovernorConfig, fs: &dyn SysfsAccess, layout: UnitLayout) -> Result<CpuTopology> {
		let step_override = config.step_khz.map(u64::from);
		let mut setups = Vec::with_capacity(layout.unit_count());

		for unit in 0..layout.unit_count() {
			let leader = unit * layout.threads_per_unit;
			let freqs = read_unit_frequencies(fs, leader, step_override, config.effective_step_khz())?;
			let original_governor = engage_userspace(fs, leader)?;

			setups.push(UnitSetup {
				limits: freqs.limits,
				scale: freqs.scale,
				table: freqs.table,
				original_governor,
			});
		}

		Ok(CpuTopology::assemble(layout, setups))
	}

	pub fn layout(&self) -> UnitLayout {
		self.topology.layout
	}

	pub fn cores(&self) -> &[LogicalCore] {
		&self.topology.cores
	}

	pub fn units(&self) -> &[ScalableUnit] {
		&self.topology.units
	}

	pub fn stats(&self) -> Statistics {
		self.stats
	}

	/// Takes a new accounting sample for `cpu` and returns its busy fraction since the last one
	///
	/// `None` means no ticks elapsed in between.
	pub fn sample(&mut self, cpu: usize) -> Result<Option<f64>> {
		let stat = self.fs.read_to_string(Path::new(PROC_STAT))?;
		let snapshot = parse_cpu_line(&stat, cpu)?;

		let core = &mut self.topology.cores[cpu];
		core.record(snapshot);
		Ok(core.delta(self.config.ignore_nice).usage_fraction())
	}

	/// Samples `cpu` and turns its usage into a vote
	pub fn decide(&mut self, cpu: usize) -> Result<Decision> {
		let usage = self.sample(cpu)?;
		let core = &self.topology.cores[cpu];
		let vote = decision::decide(
			usage,
			core.current_speed,
			core.limits.min,
			core.limits.max,
			self.config.thresholds(),
		);
		trace!(cpu = core.id, ?usage, ?vote, "vote");
		Ok(vote)
	}

	/// Collects the votes of every member of a unit
	///
	/// All members are sampled even when one of them fails, so their baselines stay current;
	/// the first failure is then returned and the unit sits this cycle out.
	pub fn aggregate(&mut self, unit: usize) -> Result<Decision> {
		let members = self.topology.units[unit].members.clone();
		let mut votes = Vec::with_capacity(members.len());
		let mut failure = None;

		for cpu in members {
			match self.decide(cpu) {
				Ok(vote) => votes.push(vote),
				Err(e) => {
					failure.get_or_insert(e);
				},
			}
		}

		match failure {
			Some(e) => Err(e),
			None => Ok(decision::aggregate(votes)),
		}
	}

	/// Moves the unit led by `cpu` according to `decision` under `mode`
	///
	/// Does nothing for a `Same` verdict or when `cpu` does not lead a unit. The new speed is
	/// committed only after the kernel accepted the whole write; a failed or short write leaves
	/// the unit where it was. Returns whether a transition happened.
	pub fn apply(&mut self, cpu: usize, decision: Decision, mode: PolicyMode) -> Result<bool> {
		if decision == Decision::Same {
			return Ok(false);
		}
		let Some(unit_idx) = self.topology.unit_led_by(cpu) else {
			return Ok(false);
		};

		let unit = &self.topology.units[unit_idx];
		let index = mode.next_index(unit.speed_index, unit.table.len(), decision);
		let target = unit.table.get(index).unwrap_or_else(|| unit.table.slowest());
		let line = format!("{}\n", unit.scale.from_khz(target));
		let path = cpufreq_attr(unit.leader, SCALING_SETSPEED);

		trace!(cpu, ?decision, %mode, index, target, "writing {}", path.display());
		let written = self.fs.write(&path, line.as_bytes())?;
		if written != line.len() {
			return Err(GovernorError::Io(io::Error::new(
				io::ErrorKind::WriteZero,
				format!("short write to {}: {} of {} bytes", path.display(), written, line.len()),
			)));
		}

		let members = unit.members.clone();
		self.topology.units[unit_idx].speed_index = index;
		for core in &mut self.topology.cores[members] {
			core.current_speed = target;
		}
		self.stats.transitions += 1;

		debug!("cpu{}: {:?} -> {} MHz", cpu, decision, target / KHZ_PER_MHZ);
		Ok(true)
	}

	/// Advances the poll loop by one state
	fn step(&mut self, state: LoopState) -> LoopState {
		match state {
			LoopState::Running => LoopState::EvaluatingUnit(0),
			LoopState::EvaluatingUnit(unit) if unit >= self.topology.units.len() => LoopState::Running,
			LoopState::EvaluatingUnit(unit) => match self.aggregate(unit) {
				Ok(Decision::Same) => LoopState::EvaluatingUnit(unit + 1),
				Ok(decision) => LoopState::Applying(unit, decision),
				Err(e) => {
					warn!("cpu{}: skipping this cycle: {}", self.topology.units[unit].leader, e);
					LoopState::EvaluatingUnit(unit + 1)
				},
			},
			LoopState::Applying(unit, decision) => {
				let leader = self.topology.units[unit].leader;
				if let Err(e) = self.apply(leader, decision, self.config.mode) {
					warn!("cpu{}: transition abandoned: {}", leader, e);
				}
				LoopState::EvaluatingUnit(unit + 1)
			},
		}
	}

	/// Runs one poll cycle over every unit, in ascending order
	pub fn cycle(&mut self) {
		let mut state = self.step(LoopState::Running);
		while state != LoopState::Running {
			state = self.step(state);
		}
	}

	/// Sleeps for one poll interval; returns false as soon as termination is requested
	fn wait_for_next_poll(&self, shutdown: &AtomicBool) -> bool {
		let slice = Duration::from_millis(SHUTDOWN_CHECK_INTERVAL_MS);
		let deadline = Instant::now() + self.config.poll_interval;

		loop {
			if shutdown.load(Ordering::SeqCst) {
				return false;
			}
			let now = Instant::now();
			if now >= deadline {
				return true;
			}
			thread::sleep(slice.min(deadline - now));
		}
	}

	/// Polls until `shutdown` is set
	///
	/// The flag is only honoured between cycles, so a transition is never cut short.
	pub fn run(&mut self, shutdown: &AtomicBool) {
		self.stats.started = Instant::now();
		info!(
			"Polling every {} ms in {} mode",
			self.config.poll_interval.as_millis(),
			self.config.mode
		);

		while self.wait_for_next_poll(shutdown) {
			self.cycle();
		}
	}

	/// Raises every unit to its fastest entry, whatever the configured mode
	pub fn restore_max_speed(&mut self) {
		for unit in 0..self.topology.units.len() {
			let leader = self.topology.units[unit].leader;
			if let Err(e) = self.apply(leader, Decision::Raise, PolicyMode::Leaps) {
				warn!("cpu{}: could not restore maximum speed: {}", leader, e);
			}
		}
	}

	/// Writes back the governors that were active before startup
	fn restore_governors(&self) {
		for unit in &self.topology.units {
			if unit.original_governor == USERSPACE_GOVERNOR {
				continue;
			}
			match write_governor(self.fs.as_ref(), unit.leader, &unit.original_governor) {
				Ok(()) => debug!("cpu{}: governor restored to {}", unit.leader, unit.original_governor),
				Err(e) => warn!("cpu{}: could not restore governor: {}", unit.leader, e),
			}
		}
	}

	/// Leaves every unit at full speed and releases all state
	pub fn shutdown(mut self) -> RunSummary {
		self.restore_max_speed();
		if self.config.restore_governor {
			self.restore_governors();
		}

		RunSummary {
			elapsed: self.stats.started.elapsed(),
			transitions: self.stats.transitions,
		}
	}
}

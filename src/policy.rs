use std::fmt;
use std::str::FromStr;

use crate::decision::Decision;

/// How far a unit moves through its frequency table on each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyMode {
	/// One step in either direction
	Sine,
	/// Straight to maximum on raise, one step down on lower
	#[default]
	Aggressive,
	/// One step up on raise, straight to minimum on lower
	Passive,
	/// Straight to the table ends in both directions
	Leaps,
}

impl PolicyMode {
	/// Returns the mode name as printed in the startup banner
	pub fn as_str(&self) -> &'static str {
		match self {
			PolicyMode::Sine => "SINE",
			PolicyMode::Aggressive => "AGGRESSIVE",
			PolicyMode::Passive => "PASSIVE",
			PolicyMode::Leaps => "LEAPS",
		}
	}

	/// Numeric code accepted on the command line
	pub fn code(&self) -> u8 {
		match self {
			PolicyMode::Sine => 0,
			PolicyMode::Aggressive => 1,
			PolicyMode::Passive => 2,
			PolicyMode::Leaps => 3,
		}
	}

	/// Computes the table index a unit moves to
	///
	/// Index 0 is the fastest entry and `table_len - 1` the slowest. `Same` never moves.
	pub fn next_index(&self, current: usize, table_len: usize, decision: Decision) -> usize {
		let last = table_len.saturating_sub(1);
		match decision {
			Decision::Same => current,
			Decision::Raise => match self {
				PolicyMode::Aggressive | PolicyMode::Leaps => 0,
				PolicyMode::Sine | PolicyMode::Passive => current.saturating_sub(1),
			},
			Decision::Lower => match self {
				PolicyMode::Passive | PolicyMode::Leaps => last,
				PolicyMode::Sine | PolicyMode::Aggressive => (current + 1).min(last),
			},
		}
	}
}

impl fmt::Display for PolicyMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl TryFrom<u8> for PolicyMode {
	type Error = String;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(PolicyMode::Sine),
			1 => Ok(PolicyMode::Aggressive),
			2 => Ok(PolicyMode::Passive),
			3 => Ok(PolicyMode::Leaps),
			_ => Err(format!("mode must be between 0 and 3, got {code}")),
		}
	}
}

impl FromStr for PolicyMode {
	type Err = String;

	/// Accepts either the numeric code or the mode name, case-insensitively
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Ok(code) = s.parse::<u8>() {
			return PolicyMode::try_from(code);
		}
		match s.to_ascii_lowercase().as_str() {
			"sine" => Ok(PolicyMode::Sine),
			"aggressive" => Ok(PolicyMode::Aggressive),
			"passive" => Ok(PolicyMode::Passive),
			"leaps" => Ok(PolicyMode::Leaps),
			_ => Err(format!("unknown mode {s:?} (expected 0-3 or sine, aggressive, passive, leaps)")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const LEN: usize = 13;

	#[test]
	fn test_sine_moves_one_step() {
		let mode = PolicyMode::Sine;
		assert_eq!(mode.next_index(5, LEN, Decision::Raise), 4);
		assert_eq!(mode.next_index(5, LEN, Decision::Lower), 6);
		assert_eq!(mode.next_index(0, LEN, Decision::Raise), 0);
		assert_eq!(mode.next_index(LEN - 1, LEN, Decision::Lower), LEN - 1);
	}

	#[test]
	fn test_aggressive_jumps_up_steps_down() {
		let mode = PolicyMode::Aggressive;
		assert_eq!(mode.next_index(9, LEN, Decision::Raise), 0);
		assert_eq!(mode.next_index(9, LEN, Decision::Lower), 10);
	}

	#[test]
	fn test_passive_steps_up_jumps_down() {
		let mode = PolicyMode::Passive;
		assert_eq!(mode.next_index(9, LEN, Decision::Raise), 8);
		assert_eq!(mode.next_index(2, LEN, Decision::Lower), LEN - 1);
	}

	#[test]
	fn test_leaps_jumps_both_ways() {
		let mode = PolicyMode::Leaps;
		assert_eq!(mode.next_index(6, LEN, Decision::Raise), 0);
		assert_eq!(mode.next_index(6, LEN, Decision::Lower), LEN - 1);
	}

	#[test]
	fn test_same_never_moves() {
		for mode in [PolicyMode::Sine, PolicyMode::Aggressive, PolicyMode::Passive, PolicyMode::Leaps] {
			assert_eq!(mode.next_index(4, LEN, Decision::Same), 4);
		}
	}

	#[test]
	fn test_single_entry_table() {
		assert_eq!(PolicyMode::Sine.next_index(0, 1, Decision::Lower), 0);
		assert_eq!(PolicyMode::Leaps.next_index(0, 1, Decision::Lower), 0);
	}

	#[test]
	fn test_parse_codes_and_names() {
		assert_eq!("0".parse::<PolicyMode>(), Ok(PolicyMode::Sine));
		assert_eq!("3".parse::<PolicyMode>(), Ok(PolicyMode::Leaps));
		assert_eq!("Passive".parse::<PolicyMode>(), Ok(PolicyMode::Passive));
		assert!("4".parse::<PolicyMode>().is_err());
		assert!("turbo".parse::<PolicyMode>().is_err());
		assert_eq!(PolicyMode::default(), PolicyMode::Aggressive);
		assert_eq!(PolicyMode::Passive.code(), 2);
	}
}

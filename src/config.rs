use std::time::Duration;

use crate::constants::*;
use crate::decision::Thresholds;
use crate::error::{GovernorError, Result};
use crate::policy::PolicyMode;

/// Tunables of the governor
#[derive(Debug, Clone, PartialEq)]
pub struct GovernorConfig {
	pub mode: PolicyMode,
	/// Explicit step in kHz; forces a synthesized table even when the driver lists frequencies
	pub step_khz: Option<u32>,
	pub poll_interval: Duration,
	/// Usage percentage at or above which a core asks for more speed
	pub high_water: u8,
	/// Usage percentage at or below which a core asks for less speed
	pub low_water: u8,
	pub threads_per_unit: Option<usize>,
	/// Leave niced processes out of the busy time
	pub ignore_nice: bool,
	/// Put back each unit's original scaling governor on shutdown
	pub restore_governor: bool,
}

impl Default for GovernorConfig {
	fn default() -> Self {
		Self {
			mode: PolicyMode::default(),
			step_khz: None,
			poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
			high_water: DEFAULT_HIGH_WATER_PCT,
			low_water: DEFAULT_LOW_WATER_PCT,
			threads_per_unit: None,
			ignore_nice: true,
			restore_governor: false,
		}
	}
}

impl GovernorConfig {
	pub fn validate(&self) -> Result<()> {
		if self.high_water > 100 {
			return Err(GovernorError::Config(format!(
				"upper limit must be between 0 and 100, got {}",
				self.high_water
			)));
		}

		if self.low_water > 100 {
			return Err(GovernorError::Config(format!(
				"lower limit must be between 0 and 100, got {}",
				self.low_water
			)));
		}

		if self.low_water > self.high_water {
			return Err(GovernorError::Config(format!(
				"lower limit ({}%) is higher than upper limit ({}%)",
				self.low_water, self.high_water
			)));
		}

		if self.step_khz == Some(0) {
			return Err(GovernorError::Config("step must be greater than 0".to_string()));
		}

		if self.poll_interval.is_zero() {
			return Err(GovernorError::Config("poll interval must be greater than 0".to_string()));
		}

		if self.threads_per_unit == Some(0) {
			return Err(GovernorError::Config(
				"threads per unit must be at least 1".to_string(),
			));
		}

		Ok(())
	}

	pub fn thresholds(&self) -> Thresholds {
		Thresholds::from_percent(self.high_water, self.low_water)
	}

	/// Step used when the table has to be synthesized
	pub fn effective_step_khz(&self) -> u64 {
		u64::from(self.step_khz.unwrap_or(DEFAULT_STEP_KHZ))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let config = GovernorConfig::default();
		assert!(config.validate().is_ok());
		assert_eq!(config.mode, PolicyMode::Aggressive);
		assert_eq!(config.effective_step_khz(), 100_000);
		assert_eq!(config.poll_interval, Duration::from_millis(1000));
		assert!(config.ignore_nice);
	}

	#[test]
	fn test_inverted_marks_rejected() {
		let config = GovernorConfig {
			high_water: 30,
			low_water: 40,
			..Default::default()
		};
		let err = config.validate().unwrap_err();
		assert!(matches!(err, GovernorError::Config(_)));
		assert!(err.to_string().contains("higher than upper"));
	}

	#[test]
	fn test_out_of_range_percentages_rejected() {
		let config = GovernorConfig {
			high_water: 101,
			..Default::default()
		};
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_zero_values_rejected() {
		for config in [
			GovernorConfig {
				step_khz: Some(0),
				..Default::default()
			},
			GovernorConfig {
				poll_interval: Duration::ZERO,
				..Default::default()
			},
			GovernorConfig {
				threads_per_unit: Some(0),
				..Default::default()
			},
		] {
			assert!(matches!(config.validate(), Err(GovernorError::Config(_))));
		}
	}

	#[test]
	fn test_thresholds_are_fractions() {
		let config = GovernorConfig::default();
		let marks = config.thresholds();
		assert!((marks.high - 0.8).abs() < f64::EPSILON);
		assert!((marks.low - 0.2).abs() < f64::EPSILON);
	}
}

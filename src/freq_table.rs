use crate::constants::{KHZ_PER_MHZ, MAX_TABLE_ENTRIES, MHZ_DETECTION_LIMIT};

/// Unit a cpufreq driver uses for its frequency attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreqScale {
	#[default]
	Khz,
	/// A few old drivers (longhaul) report and expect MHz
	Mhz,
}

impl FreqScale {
	/// Guesses the unit from `cpuinfo_max_freq`: nothing runs above 10 GHz, nothing below 10 MHz
	pub fn detect(max_reading: u64) -> Self {
		if max_reading <= MHZ_DETECTION_LIMIT {
			FreqScale::Mhz
		} else {
			FreqScale::Khz
		}
	}

	/// Converts a driver reading into kHz, or `None` if the result does not fit
	pub fn checked_to_khz(&self, reading: u64) -> Option<u64> {
		match self {
			FreqScale::Khz => Some(reading),
			FreqScale::Mhz => reading.checked_mul(KHZ_PER_MHZ),
		}
	}

	/// Converts a driver reading into kHz, saturating at `u64::MAX`
	pub fn to_khz(&self, reading: u64) -> u64 {
		self.checked_to_khz(reading).unwrap_or(u64::MAX)
	}

	/// Converts kHz into the value the driver expects
	pub fn from_khz(&self, khz: u64) -> u64 {
		match self {
			FreqScale::Khz => khz,
			FreqScale::Mhz => khz / KHZ_PER_MHZ,
		}
	}
}

/// Hardware frequency limits of a unit, in kHz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreqLimits {
	pub min: u64,
	pub max: u64,
}

/// Selectable frequencies of one scalable unit, fastest first, in kHz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
	entries: Vec<u64>,
}

impl FrequencyTable {
	/// Builds a table from explicit entries, sorting them fastest first
	///
	/// Duplicates are kept. Returns `None` for an empty list.
	pub fn from_entries(mut entries: Vec<u64>) -> Option<Self> {
		if entries.is_empty() {
			return None;
		}
		entries.sort_by(|a, b| b.cmp(a));
		Some(Self { entries })
	}

	/// Steps down from `limits.max` by `step_khz` until `limits.min`, both ends included
	///
	/// A step wider than the range is narrowed to the range, and a zero-width range gives a
	/// single entry. The last step may be shorter than the others so the table ends on the
	/// minimum exactly.
	pub fn synthesize(limits: FreqLimits, step_khz: u64) -> Self {
		let range = limits.max.saturating_sub(limits.min);
		if range == 0 || step_khz == 0 {
			return Self {
				entries: vec![limits.max],
			};
		}

		let step = step_khz.min(range);
		let len = range.div_ceil(step) + 1;
		let entries = (0..len)
			.map(|i| limits.max.saturating_sub(i * step).max(limits.min))
			.collect();

		Self { entries }
	}

	/// Parses the contents of `scaling_available_frequencies`
	///
	/// Values are runs of digits separated by anything else. Parsing stops at the first zero or
	/// unparsable value, at a value too large to express in kHz and after `MAX_TABLE_ENTRIES`
	/// entries. Each value is converted from the driver's `scale` into kHz. Returns `None` when
	/// the list yields no frequency at all.
	pub fn parse_available(text: &str, scale: FreqScale) -> Option<Self> {
		let entries = text
			.split(|c: char| !c.is_ascii_digit())
			.filter(|token| !token.is_empty())
			.map(|token| token.parse::<u64>().unwrap_or(0))
			.take_while(|&freq| freq > 0)
			.take(MAX_TABLE_ENTRIES)
			.map_while(|freq| scale.checked_to_khz(freq))
			.collect();

		Self::from_entries(entries)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Fastest entry
	pub fn fastest(&self) -> u64 {
		self.entries[0]
	}

	/// Slowest entry
	pub fn slowest(&self) -> u64 {
		self.entries[self.entries.len() - 1]
	}

	pub fn get(&self, index: usize) -> Option<u64> {
		self.entries.get(index).copied()
	}

	pub fn entries(&self) -> &[u64] {
		&self.entries
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_synthesized_reference_table() {
		let table = FrequencyTable::synthesize(
			FreqLimits {
				min: 800_000,
				max: 2_000_000,
			},
			100_000,
		);
		assert_eq!(table.len(), 13);
		let expected: Vec<u64> = (0..13).map(|i| 2_000_000 - i * 100_000).collect();
		assert_eq!(table.entries(), expected.as_slice());
	}

	#[test]
	fn test_uneven_step_ends_on_min() {
		let table = FrequencyTable::synthesize(
			FreqLimits {
				min: 1_000_000,
				max: 2_000_000,
			},
			300_000,
		);
		assert_eq!(table.entries(), &[2_000_000, 1_700_000, 1_400_000, 1_100_000, 1_000_000]);
	}

	#[test]
	fn test_oversized_step_is_clamped() {
		let table = FrequencyTable::synthesize(
			FreqLimits {
				min: 600_000,
				max: 1_000_000,
			},
			5_000_000,
		);
		assert_eq!(table.entries(), &[1_000_000, 600_000]);
	}

	#[test]
	fn test_flat_range_has_one_entry() {
		let table = FrequencyTable::synthesize(
			FreqLimits {
				min: 1_000_000,
				max: 1_000_000,
			},
			100_000,
		);
		assert_eq!(table.entries(), &[1_000_000]);
	}

	#[test]
	fn test_available_list_is_sorted_descending() {
		let table = FrequencyTable::parse_available("800000 1200000 1600000 2000000 \n", FreqScale::Khz).unwrap();
		assert_eq!(table.entries(), &[2_000_000, 1_600_000, 1_200_000, 800_000]);
		assert_eq!(table.fastest(), 2_000_000);
		assert_eq!(table.slowest(), 800_000);
	}

	#[test]
	fn test_available_list_keeps_duplicates() {
		let table = FrequencyTable::parse_available("1000 1000 800", FreqScale::Mhz).unwrap();
		assert_eq!(table.entries(), &[1_000_000, 1_000_000, 800_000]);
	}

	#[test]
	fn test_available_list_stops_at_zero() {
		let table = FrequencyTable::parse_available("2000000 0 1000000", FreqScale::Khz).unwrap();
		assert_eq!(table.entries(), &[2_000_000]);
	}

	#[test]
	fn test_available_list_is_capped() {
		let text: String = (1..=150).map(|i| format!("{} ", i * 10_000)).collect();
		let table = FrequencyTable::parse_available(&text, FreqScale::Khz).unwrap();
		assert_eq!(table.len(), MAX_TABLE_ENTRIES);
		assert_eq!(table.fastest(), 1_000_000);
	}

	#[test]
	fn test_empty_available_list() {
		assert_eq!(FrequencyTable::parse_available("\n", FreqScale::Khz), None);
		assert_eq!(FrequencyTable::parse_available("0 1200000", FreqScale::Khz), None);
	}

	#[test]
	fn test_oversized_mhz_value_ends_list() {
		let table = FrequencyTable::parse_available("900 18446744073709552 800", FreqScale::Mhz).unwrap();
		assert_eq!(table.entries(), &[900_000]);
		assert_eq!(FreqScale::Mhz.checked_to_khz(u64::MAX / 10), None);
		assert_eq!(FreqScale::Mhz.to_khz(u64::MAX / 10), u64::MAX);
	}

	#[test]
	fn test_scale_detection() {
		assert_eq!(FreqScale::detect(2_000_000), FreqScale::Khz);
		assert_eq!(FreqScale::detect(10_000), FreqScale::Mhz);
		assert_eq!(FreqScale::detect(1_800), FreqScale::Mhz);
		assert_eq!(FreqScale::Mhz.to_khz(1_800), 1_800_000);
		assert_eq!(FreqScale::Mhz.from_khz(1_800_000), 1_800);
		assert_eq!(FreqScale::Khz.from_khz(1_800_000), 1_800_000);
	}

	proptest! {
		#[test]
		fn prop_synthesized_table_shape(min in 1u64..5_000_000, width in 0u64..5_000_000, step in 1u64..1_000_000) {
			let limits = FreqLimits { min, max: min + width };
			let table = FrequencyTable::synthesize(limits, step);
			let entries = table.entries();

			prop_assert!(entries[0] <= limits.max);
			prop_assert!(*entries.last().unwrap() >= limits.min);
			prop_assert!(entries.windows(2).all(|w| w[0] >= w[1]));

			let expected_len = if width == 0 { 1 } else { width.div_ceil(step.min(width)) + 1 };
			prop_assert_eq!(entries.len() as u64, expected_len);
		}

		#[test]
		fn prop_parsed_list_is_sorted_copy(values in prop::collection::vec(1u64..5_000_000, 1..150)) {
			let text = values.iter().map(u64::to_string).collect::<Vec<_>>().join(" ");
			let table = FrequencyTable::parse_available(&text, FreqScale::Khz).unwrap();

			let mut expected: Vec<u64> = values.iter().copied().take(MAX_TABLE_ENTRIES).collect();
			expected.sort_by(|a, b| b.cmp(a));
			prop_assert_eq!(table.entries(), expected.as_slice());
		}
	}
}

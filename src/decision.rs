/// A core's vote on where its unit's clock should go
///
/// The variant order matters: aggregation takes the maximum, so a single `Raise` wins and a unit
/// only slows down when every member votes `Lower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decision {
	Lower,
	Same,
	Raise,
}

/// Usage fractions that trigger a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
	/// Usage at or above which a core votes `Raise`
	pub high: f64,
	/// Usage at or below which a core votes `Lower`
	pub low: f64,
}

impl Thresholds {
	/// Builds thresholds from whole percentages
	pub fn from_percent(high: u8, low: u8) -> Self {
		Self {
			high: f64::from(high) / 100.0,
			low: f64::from(low) / 100.0,
		}
	}
}

/// Turns one core's usage into a vote
///
/// `usage` is `None` when no ticks elapsed since the previous sample; such a core votes `Same`.
/// A raise is only possible below `max_speed` and a lower only above `min_speed`.
pub fn decide(usage: Option<f64>, current_speed: u64, min_speed: u64, max_speed: u64, thresholds: Thresholds) -> Decision {
	let Some(usage) = usage else {
		return Decision::Same;
	};

	if usage >= thresholds.high && current_speed != max_speed {
		Decision::Raise
	} else if usage <= thresholds.low && current_speed != min_speed {
		Decision::Lower
	} else {
		Decision::Same
	}
}

/// Combines the votes of every core in a unit
///
/// An empty unit yields `Same`.
pub fn aggregate<I>(votes: I) -> Decision
where
	I: IntoIterator<Item = Decision>,
{
	votes.into_iter().max().unwrap_or(Decision::Same)
}

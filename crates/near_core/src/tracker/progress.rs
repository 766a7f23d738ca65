//! Tracker bar progress.
//!
//! - `distance` mode shrinks the bar from the max fraction at the starting
//!   distance down to the min fraction at the zero point (0, or the minimum
//!   distance gate when configured so)
//! - `time` mode drains the bar from max to min as the timeout approaches
//! - anything else, or a mode whose prerequisites are missing, shows the max
//!   fraction
//!
//! The result is always within `[0, 1]`.

use std::time::Duration;

/// How the bar fill is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Distance,
    Time,
    /// Unrecognised mode name; always the max fraction
    Fixed,
}

impl ProgressMode {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "distance" => ProgressMode::Distance,
            "time" => ProgressMode::Time,
            _ => ProgressMode::Fixed,
        }
    }
}

/// Progress settings captured when a session starts. Fractions are `0..=1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressConfig {
    pub enabled: bool,
    pub mode: ProgressMode,
    pub min_fraction: f64,
    pub max_fraction: f64,
    /// Distance at which the bar reaches `min_fraction` in distance mode
    pub zero_distance: f64,
}

/// Inputs that change while a session runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressInput {
    pub distance: f64,
    pub initial_distance: f64,
    pub ignore_distance: bool,
    pub elapsed: Duration,
    pub timeout: Option<Duration>,
}

impl ProgressConfig {
    pub fn progress(&self, input: &ProgressInput) -> f64 {
        if !self.enabled {
            return 1.0;
        }

        let raw = match (self.mode, input.timeout) {
            (ProgressMode::Distance, _) if !input.ignore_distance => self.by_distance(input),
            (ProgressMode::Time, Some(timeout)) if !timeout.is_zero() => {
                self.by_time(input.elapsed, timeout)
            }
            _ => self.max_fraction,
        };

        clamp_unit(raw)
    }

    fn by_distance(&self, input: &ProgressInput) -> f64 {
        if input.distance >= input.initial_distance {
            return self.max_fraction;
        }

        let range = input.initial_distance - self.zero_distance;
        if !(range > 0.0) {
            return self.min_fraction;
        }

        let normalized = (input.distance - self.zero_distance).clamp(0.0, range);
        self.min_fraction + (self.max_fraction - self.min_fraction) * (normalized / range)
    }

    fn by_time(&self, elapsed: Duration, timeout: Duration) -> f64 {
        let fraction = (elapsed.as_secs_f64() / timeout.as_secs_f64()).clamp(0.0, 1.0);
        self.max_fraction - (self.max_fraction - self.min_fraction) * fraction
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

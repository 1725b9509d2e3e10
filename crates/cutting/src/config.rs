//! Guillotine engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of the guillotine engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GuillotineConfig {
    /// Machine time per straight cut, in seconds.
    pub seconds_per_cut: f64,
    /// Try the footprint rotated 90° about the vertical axis.
    pub allow_rotation: bool,
}

impl Default for GuillotineConfig {
    fn default() -> Self {
        Self {
            seconds_per_cut: 15.0,
            allow_rotation: true,
        }
    }
}

impl GuillotineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time per cut.
    pub fn with_seconds_per_cut(mut self, seconds: f64) -> Self {
        self.seconds_per_cut = seconds.max(0.0);
        self
    }

    /// Enables or disables footprint rotation.
    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }
}

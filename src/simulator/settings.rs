//! Static per-partition configuration shared by the engine and its iterations.
use serde::{Deserialize, Serialize};

use crate::{
    params::NamedParams,
    simulator::errors::{SimError, SimResult},
};

/// Per-partition configuration for one engine run.
///
/// Every `Vec` is indexed by partition and must have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub params: Vec<NamedParams>,
    pub init_state_values: Vec<Vec<f64>>,
    pub init_time_value: f64,
    pub seeds: Vec<u64>,
    pub state_widths: Vec<usize>,
    pub state_history_depths: Vec<usize>,
    pub timesteps_history_depth: usize,
}

impl Settings {
    pub fn partitions(&self) -> usize {
        self.params.len()
    }

    /// Check that all per-partition vectors line up.
    ///
    /// # Errors
    /// [`SimError::InvalidSettings`] describing the first inconsistency.
    pub fn validate(&self) -> SimResult<()> {
        let n = self.partitions();
        let lengths = [
            ("init_state_values", self.init_state_values.len()),
            ("seeds", self.seeds.len()),
            ("state_widths", self.state_widths.len()),
            ("state_history_depths", self.state_history_depths.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(SimError::InvalidSettings {
                    reason: format!("{name} has {len} entries for {n} partitions"),
                });
            }
        }
        for (index, (init, &width)) in
            self.init_state_values.iter().zip(&self.state_widths).enumerate()
        {
            if init.len() != width {
                return Err(SimError::InvalidSettings {
                    reason: format!(
                        "partition {index} initial state has width {}, expected {width}",
                        init.len()
                    ),
                });
            }
        }
        if let Some(index) = self.state_history_depths.iter().position(|&d| d == 0) {
            return Err(SimError::InvalidSettings {
                reason: format!("partition {index} has a zero state history depth"),
            });
        }
        if self.timesteps_history_depth == 0 {
            return Err(SimError::InvalidSettings {
                reason: "timesteps history depth must be positive".to_string(),
            });
        }
        for params in &self.params {
            params.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_partition() -> Settings {
        Settings {
            params: vec![NamedParams::new()],
            init_state_values: vec![vec![0.0, 1.0]],
            init_time_value: 0.0,
            seeds: vec![1],
            state_widths: vec![2],
            state_history_depths: vec![3],
            timesteps_history_depth: 3,
        }
    }

    #[test]
    fn consistent_settings_validate() {
        assert!(one_partition().validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Width and length disagreements are reported, not patched.
    fn mismatched_widths_and_lengths_are_rejected() {
        // Arrange
        let mut wrong_width = one_partition();
        wrong_width.state_widths = vec![3];
        let mut missing_seed = one_partition();
        missing_seed.seeds.clear();

        // Act / Assert
        assert!(matches!(wrong_width.validate(), Err(SimError::InvalidSettings { .. })));
        assert!(matches!(missing_seed.validate(), Err(SimError::InvalidSettings { .. })));
    }
}

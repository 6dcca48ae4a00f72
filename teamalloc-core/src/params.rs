use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Tunable parameters of the allocation engine.
///
/// The defaults mirror the deployed configuration: 9 options where the last
/// one is the reserved "unspecified" choice, project groups of 4 people with
/// leftover groups tolerated between 3 and 5.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Params {
    /// Number of options people can pick from, including the reserved
    /// "unspecified" option when `unspecified_option` is set.
    pub num_options: usize,
    /// Whether the last option means "no particular topic".
    pub unspecified_option: bool,
    /// Target size of a project group.
    pub group_size: u32,
    /// Smallest tolerated size for a leftover group.
    pub min_group_size: u32,
    /// Largest tolerated size for a leftover group.
    pub max_group_size: u32,
    /// Value gained by matching a group to its 1st, 2nd, ... choice.
    pub pref_values: Vec<i64>,
    /// Scale preference values by the number of people in the group rather
    /// than counting each group once.
    pub value_per_person: bool,
    /// Charged for every project group whose size differs from `group_size`.
    /// Typically negative.
    pub odd_size_penalty: i64,
    /// Number of independent randomized trials per solve.
    pub num_trials: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            num_options: 9,
            unspecified_option: true,
            group_size: 4,
            min_group_size: 3,
            max_group_size: 5,
            pref_values: vec![8, 4, 2],
            value_per_person: true,
            odd_size_penalty: -3,
            num_trials: 2,
        }
    }
}

impl Params {
    /// Number of actual topics, excluding the reserved "unspecified" option.
    pub fn num_topics(&self) -> usize {
        self.num_options - (self.unspecified_option as usize)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_topics() == 0 {
            return Err(anyhow!("No topics to allocate to"));
        }
        if self.group_size == 0 {
            return Err(anyhow!("group_size must be positive"));
        }
        if !(self.min_group_size <= self.group_size && self.group_size <= self.max_group_size) {
            return Err(anyhow!(
                "Group size bounds must satisfy min <= target <= max. Actual: {} <= {} <= {}",
                self.min_group_size,
                self.group_size,
                self.max_group_size
            ));
        }
        if self.pref_values.is_empty() {
            return Err(anyhow!("pref_values must contain at least one rank value"));
        }
        if self.num_trials == 0 {
            return Err(anyhow!("num_trials must be positive"));
        }
        Ok(())
    }
}

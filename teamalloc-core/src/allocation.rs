use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::{Instance, Params};

/// A finalized project group: which preference-groups it contains and which
/// topic it works on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup {
    /// Indices into `Instance::groups`.
    pub group_ids: Vec<usize>,
    pub topic: usize,
}

impl ProjectGroup {
    pub fn person_ids<'a>(&self, instance: &'a Instance) -> Vec<&'a str> {
        self.group_ids
            .iter()
            .flat_map(|&g| instance.groups[g].members.iter())
            .map(|&p| instance.people[p].as_str())
            .collect()
    }
}

/// A complete allocation of every preference-group into project groups.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Objective value reported by the solver.
    pub score: i64,
    pub project_groups: Vec<ProjectGroup>,
}

impl Allocation {
    /// Recomputes the objective value from scratch: the sum of each
    /// preference-group's value at its assigned topic, plus one odd-size
    /// penalty for every project group whose size differs from the target.
    pub fn score_of(&self, instance: &Instance, params: &Params) -> Result<i64> {
        let mut total = 0;
        for pg in &self.project_groups {
            let mut size = 0;
            for &g in &pg.group_ids {
                let group = &instance.groups[g];
                total += group.assignment_value(pg.topic, params).ok_or_else(|| {
                    anyhow!(
                        "Preference-group {} does not accept its assigned topic {}",
                        g,
                        pg.topic + 1
                    )
                })?;
                size += group.member_count();
            }
            if size != params.group_size {
                total += params.odd_size_penalty;
            }
        }
        Ok(total)
    }

    /// Checks every invariant a valid allocation must satisfy: exact
    /// partition of the preference-groups, size bounds, topic adherence, and
    /// agreement of the reported score with a recomputation.
    pub fn verify(&self, instance: &Instance, params: &Params) -> Result<()> {
        let mut seen = HashSet::new();
        for pg in &self.project_groups {
            if pg.topic >= params.num_topics() {
                return Err(anyhow!(
                    "Topic index {} out of range 0..{}",
                    pg.topic,
                    params.num_topics()
                ));
            }
            let mut size = 0;
            for &g in &pg.group_ids {
                let group = instance
                    .groups
                    .get(g)
                    .ok_or_else(|| anyhow!("Unknown preference-group id {}", g))?;
                if !seen.insert(g) {
                    return Err(anyhow!(
                        "Preference-group {} appears in more than one project group",
                        g
                    ));
                }
                if group.assignment_value(pg.topic, params).is_none() {
                    return Err(anyhow!(
                        "Preference-group {} assigned to topic {} it never chose",
                        g,
                        pg.topic + 1
                    ));
                }
                size += group.member_count();
            }
            if size < params.min_group_size || size > params.max_group_size {
                return Err(anyhow!(
                    "Project group of size {} violates bounds [{}, {}]",
                    size,
                    params.min_group_size,
                    params.max_group_size
                ));
            }
        }
        if seen.len() != instance.groups.len() {
            return Err(anyhow!(
                "Allocation covers {} of {} preference-groups",
                seen.len(),
                instance.groups.len()
            ));
        }
        let recomputed = self.score_of(instance, params)?;
        if recomputed != self.score {
            return Err(anyhow!(
                "Reported score {} does not match recomputed score {}",
                self.score,
                recomputed
            ));
        }
        Ok(())
    }
}

/// Writes the allocation in the report format consumed downstream: one line
/// per project group, member identifiers then the 1-based topic number.
pub fn write_report(path: &Path, instance: &Instance, allocation: &Allocation) -> Result<()> {
    let mut out = String::new();
    for pg in &allocation.project_groups {
        let mut fields: Vec<String> = pg
            .person_ids(instance)
            .into_iter()
            .map(str::to_string)
            .collect();
        fields.push((pg.topic + 1).to_string());
        out.push_str(&fields.join(", "));
        out.push('\n');
    }
    fs::write(path, out)
        .map_err(|e| anyhow!("Failed to write report {}: {}", path.display(), e))?;
    Ok(())
}

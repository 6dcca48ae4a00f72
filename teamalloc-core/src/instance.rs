use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::Params;

/// One entry of a preference list.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// A specific topic, by index.
    Topic(usize),
    /// The reserved "unspecified" option: any topic is acceptable, valued at
    /// this entry's rank.
    Any,
}

/// A pre-formed cluster of people submitting a joint preference list.
///
/// People who never submitted preferences are carried as singleton groups
/// whose choice list is exactly `[Any]`; such groups can go anywhere but gain
/// no preference value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PreferenceGroup {
    /// Person indices into `Instance::people`.
    pub members: Vec<usize>,
    /// Ranked choices, best first. At most one entry per rank value.
    pub choices: Vec<Choice>,
}

impl PreferenceGroup {
    pub fn member_count(&self) -> u32 {
        self.members.len() as u32
    }

    fn is_unsubmitted(&self) -> bool {
        self.choices == [Choice::Any]
    }

    /// Objective value gained by assigning this group to `topic`, or `None`
    /// if the topic is not acceptable to the group.
    pub fn assignment_value(&self, topic: usize, params: &Params) -> Option<i64> {
        if self.is_unsubmitted() {
            return Some(0);
        }
        let rank_of = |wanted: Choice| {
            self.choices
                .iter()
                .position(|&c| c == wanted)
                .map(|rank| params.pref_values[rank])
        };
        let value = match (rank_of(Choice::Any), rank_of(Choice::Topic(topic))) {
            (Some(floor), Some(matched)) => floor.max(matched),
            (Some(floor), None) => floor,
            (None, Some(matched)) => matched,
            (None, None) => return None,
        };
        Some(if params.value_per_person {
            value * self.members.len() as i64
        } else {
            value
        })
    }

    /// Topics this group may be assigned to. A group carrying the
    /// "unspecified" option anywhere in its list is unconstrained.
    pub fn candidate_topics(&self, params: &Params) -> Vec<usize> {
        if self.choices.iter().any(|&c| c == Choice::Any) {
            (0..params.num_topics()).collect()
        } else {
            self.choices
                .iter()
                .map(|&c| match c {
                    Choice::Topic(t) => t,
                    Choice::Any => unreachable!(),
                })
                .collect()
        }
    }
}

/// An immutable problem instance: the full roster plus all preference-groups.
/// Shared read-only across trials; only the processing order is permuted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Unique person identifiers; positions define person indices.
    pub people: Vec<String>,
    pub groups: Vec<PreferenceGroup>,
}

/// Reads the roster file: one identifier per line, blank lines skipped.
pub fn read_identities(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read roster file {}: {}", path.display(), e))?;
    let people: Vec<String> = contents
        .lines()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    let mut seen = HashSet::new();
    for id in &people {
        if !seen.insert(id.as_str()) {
            return Err(anyhow!("Duplicate identifier in roster: {}", id));
        }
    }
    Ok(people)
}

impl Instance {
    /// Loads an instance from a roster file and a preference file.
    ///
    /// Each preference line is comma-separated: the member identifiers of one
    /// preference-group followed by exactly `params.pref_values.len()` option
    /// numbers (1-based; the last option is "unspecified" when enabled).
    /// People absent from every preference line are appended as singleton
    /// groups with a lone `Any` choice.
    pub fn from_files(roster: &Path, preferences: &Path, params: &Params) -> Result<Self> {
        let people = read_identities(roster)?;
        let index_of: HashMap<&str, usize> = people
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let contents = fs::read_to_string(preferences).map_err(|e| {
            anyhow!(
                "Failed to read preference file {}: {}",
                preferences.display(),
                e
            )
        })?;

        let num_ranks = params.pref_values.len();
        let mut groups = Vec::new();
        let mut submitted = HashSet::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if fields.len() <= num_ranks {
                return Err(anyhow!(
                    "Line {}: expected at least one identifier and {} choices",
                    lineno + 1,
                    num_ranks
                ));
            }
            let (ids, options) = fields.split_at(fields.len() - num_ranks);

            let mut members = Vec::with_capacity(ids.len());
            for id in ids {
                let &index = index_of
                    .get(id)
                    .ok_or_else(|| anyhow!("Line {}: unknown identifier {}", lineno + 1, id))?;
                if !submitted.insert(index) {
                    return Err(anyhow!(
                        "Line {}: {} appears in more than one preference-group",
                        lineno + 1,
                        id
                    ));
                }
                members.push(index);
            }
            if members.len() as u32 > params.group_size {
                return Err(anyhow!(
                    "Line {}: preference-group larger than the target group size ({})",
                    lineno + 1,
                    params.group_size
                ));
            }

            let mut choices = Vec::with_capacity(num_ranks);
            for opt in options {
                let number: usize = opt
                    .parse()
                    .map_err(|_| anyhow!("Line {}: invalid option number {:?}", lineno + 1, opt))?;
                if number == 0 || number > params.num_options {
                    return Err(anyhow!(
                        "Line {}: option number {} out of range 1..={}",
                        lineno + 1,
                        number,
                        params.num_options
                    ));
                }
                choices.push(if params.unspecified_option && number == params.num_options {
                    Choice::Any
                } else {
                    Choice::Topic(number - 1)
                });
            }
            groups.push(PreferenceGroup { members, choices });
        }

        // People who never submitted can join any group on any topic.
        for index in 0..people.len() {
            if !submitted.contains(&index) {
                groups.push(PreferenceGroup {
                    members: vec![index],
                    choices: vec![Choice::Any],
                });
            }
        }

        Ok(Self { people, groups })
    }

    pub fn num_people(&self) -> usize {
        self.people.len()
    }

    /// Fail-fast check of the invariants the solver assumes: every person in
    /// exactly one preference-group, group sizes within the target, choice
    /// lists bounded by the rank table, topic indices in range.
    pub fn validate(&self, params: &Params) -> Result<()> {
        let mut seen = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.members.is_empty() {
                return Err(anyhow!("Preference-group {} has no members", i));
            }
            if group.member_count() > params.group_size {
                return Err(anyhow!(
                    "Preference-group {} exceeds the target group size ({} > {})",
                    i,
                    group.member_count(),
                    params.group_size
                ));
            }
            for &person in &group.members {
                if person >= self.people.len() {
                    return Err(anyhow!(
                        "Preference-group {} references unknown person index {}",
                        i,
                        person
                    ));
                }
                if !seen.insert(person) {
                    return Err(anyhow!(
                        "Person {} belongs to more than one preference-group",
                        self.people[person]
                    ));
                }
            }
            if group.choices.is_empty() || group.choices.len() > params.pref_values.len() {
                return Err(anyhow!(
                    "Preference-group {} has {} choices, expected 1..={}",
                    i,
                    group.choices.len(),
                    params.pref_values.len()
                ));
            }
            for &choice in &group.choices {
                if let Choice::Topic(t) = choice {
                    if t >= params.num_topics() {
                        return Err(anyhow!(
                            "Preference-group {} lists topic index {} out of range 0..{}",
                            i,
                            t,
                            params.num_topics()
                        ));
                    }
                }
            }
        }
        if seen.len() != self.people.len() {
            return Err(anyhow!(
                "{} of {} people belong to no preference-group",
                self.people.len() - seen.len(),
                self.people.len()
            ));
        }
        Ok(())
    }
}

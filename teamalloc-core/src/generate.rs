use anyhow::{anyhow, Result};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::{SmallRng, StdRng},
    Rng, SeedableRng,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::{Choice, Instance, Params, PreferenceGroup};

/// Knobs for the synthetic instance generator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenConfig {
    pub num_people: usize,
    /// Probability that a person teams up with a random partner.
    pub pair_probability: f64,
    /// Probability that a person (or pair) never submits preferences.
    pub skip_probability: f64,
    /// Relative popularity of each option, one weight per option (the last
    /// weight is for the "unspecified" option when enabled).
    pub option_weights: Vec<u32>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            num_people: 150,
            pair_probability: 0.5,
            skip_probability: 0.05,
            option_weights: vec![5, 30, 30, 20, 20, 10, 10, 8, 8],
        }
    }
}

fn rand_identifier(rng: &mut SmallRng) -> String {
    let len = rng.gen_range(3..=5);
    (0..len)
        .map(|_| (b'a' + rng.gen_range(0..26)) as char)
        .collect()
}

/// Samples `num_ranks` distinct options weighted by popularity.
fn rand_choices(
    rng: &mut SmallRng,
    weights: &WeightedIndex<u32>,
    params: &Params,
    num_ranks: usize,
) -> Vec<Choice> {
    let mut picked: Vec<usize> = Vec::with_capacity(num_ranks);
    while picked.len() < num_ranks {
        let option = weights.sample(rng);
        if !picked.contains(&option) {
            picked.push(option);
        }
    }
    picked
        .into_iter()
        .map(|option| {
            if params.unspecified_option && option == params.num_options - 1 {
                Choice::Any
            } else {
                Choice::Topic(option)
            }
        })
        .collect()
}

/// Generates a random instance: unique identifiers, random pairings, skewed
/// topic popularity, and a small fraction of people who never submit.
pub fn generate_instance(seed: &[u8; 32], config: &GenConfig, params: &Params) -> Result<Instance> {
    params.validate()?;
    if config.option_weights.len() != params.num_options {
        return Err(anyhow!(
            "Expected {} option weights, got {}",
            params.num_options,
            config.option_weights.len()
        ));
    }
    if config.num_people == 0 {
        return Err(anyhow!("num_people must be positive"));
    }
    let num_ranks = params.pref_values.len();
    let viable_options = config.option_weights.iter().filter(|&&w| w > 0).count();
    if num_ranks > viable_options {
        return Err(anyhow!(
            "Cannot pick {} distinct choices out of {} options with positive weight",
            num_ranks,
            viable_options
        ));
    }

    let mut rng = SmallRng::from_seed(StdRng::from_seed(*seed).gen());
    let weights = WeightedIndex::new(config.option_weights.iter().copied())?;

    let mut people = Vec::with_capacity(config.num_people);
    let mut used = HashSet::new();
    for _ in 0..config.num_people {
        let mut id = rand_identifier(&mut rng);
        while !used.insert(id.clone()) {
            id = rand_identifier(&mut rng);
        }
        people.push(id);
    }

    let mut remaining: Vec<usize> = (0..config.num_people).collect();
    let mut groups = Vec::new();
    let mut skipped = Vec::new();
    while !remaining.is_empty() {
        let mut members = vec![remaining[0]];
        let r: f64 = rng.gen();
        if remaining.len() > 1 && r < config.pair_probability {
            members.push(remaining[rng.gen_range(1..remaining.len())]);
        }
        remaining.retain(|p| !members.contains(p));
        if r < 1.0 - config.skip_probability {
            groups.push(PreferenceGroup {
                members,
                choices: rand_choices(&mut rng, &weights, params, num_ranks),
            });
        } else {
            skipped.extend(members);
        }
    }
    // Non-submitters come last, same as the loader synthesizes them.
    skipped.sort_unstable();
    for person in skipped {
        groups.push(PreferenceGroup {
            members: vec![person],
            choices: vec![Choice::Any],
        });
    }

    Ok(Instance { people, groups })
}

/// Writes an instance out as the two text files the loader consumes. Groups
/// synthesized for non-submitters are omitted from the preference file; the
/// loader recreates them.
pub fn write_input_files(
    roster: &Path,
    preferences: &Path,
    instance: &Instance,
    params: &Params,
) -> Result<()> {
    let mut out = instance.people.join("\n");
    out.push('\n');
    fs::write(roster, out)
        .map_err(|e| anyhow!("Failed to write roster {}: {}", roster.display(), e))?;

    let mut out = String::new();
    for group in &instance.groups {
        if group.choices == [Choice::Any] {
            continue;
        }
        let mut fields: Vec<String> = group
            .members
            .iter()
            .map(|&p| instance.people[p].clone())
            .collect();
        for &choice in &group.choices {
            fields.push(match choice {
                Choice::Topic(t) => (t + 1).to_string(),
                Choice::Any => params.num_options.to_string(),
            });
        }
        out.push_str(&fields.join(", "));
        out.push('\n');
    }
    fs::write(preferences, out).map_err(|e| {
        anyhow!(
            "Failed to write preferences {}: {}",
            preferences.display(),
            e
        )
    })?;
    Ok(())
}

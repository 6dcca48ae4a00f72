use rand::{rngs::SmallRng, seq::SliceRandom};
use std::collections::HashMap;

use crate::{final_adjustment, landing_counts, with_count, zero_state, State};
use teamalloc_core::{Instance, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The group joins the pending pool at the topic (rolling a complete
    /// group off when the pool overflows the target size).
    Join,
    /// The group seeds a fresh pool, closing whatever was pending before.
    Split,
}

/// The transition that achieved a state's table value. Both transition modes
/// touch a single topic, so the predecessor state is the achieved state with
/// `topic`'s count set back to `prev_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub prev_count: u32,
    pub topic: usize,
    pub mode: Mode,
}

/// Per-step snapshots of the DP. `values[step]` maps every reachable state
/// after the first `step` groups to the best cumulative objective value;
/// `decisions[step]` records the transition behind that value. Absence of a
/// state means it is unreachable.
pub struct DpTables {
    pub values: Vec<HashMap<State, i64>>,
    pub decisions: Vec<HashMap<State, Decision>>,
}

impl DpTables {
    pub fn final_values(&self) -> &HashMap<State, i64> {
        self.values.last().unwrap()
    }
}

/// Runs the DP over the groups in `order`. Topic and old-state exploration
/// within each step is shuffled from `rng`; this only breaks ties, never
/// feasibility. If the table empties at some step the remaining steps are
/// skipped (the trial is already infeasible).
pub fn run_dp(instance: &Instance, params: &Params, order: &[usize], rng: &mut SmallRng) -> DpTables {
    let mut tables = DpTables {
        values: vec![HashMap::from([(zero_state(params), 0)])],
        decisions: vec![HashMap::new()],
    };

    for (step, &g) in order.iter().enumerate() {
        let group = &instance.groups[g];
        let count = group.member_count();

        let mut topics = group.candidate_topics(params);
        topics.shuffle(rng);
        let mut old_states: Vec<State> = tables.values[step].keys().cloned().collect();
        // Map iteration order is not stable; sort before shuffling so runs
        // with the same seed explore identically.
        old_states.sort_unstable();
        old_states.shuffle(rng);

        let mut row: HashMap<State, i64> = HashMap::new();
        let mut row_decisions: HashMap<State, Decision> = HashMap::new();
        let mut offer = |next: State, value: i64, decision: Decision| {
            // Strict improvement only; ties keep the first decision found.
            match row.get(&next) {
                Some(&best) if best >= value => {}
                _ => {
                    row.insert(next.clone(), value);
                    row_decisions.insert(next, decision);
                }
            }
        };

        for old_state in &old_states {
            let base = tables.values[step][old_state];
            for &topic in &topics {
                let Some(gain) = group.assignment_value(topic, params) else {
                    continue;
                };

                // Join the pending pool at this topic.
                for next_count in landing_counts(old_state[topic] + count, params) {
                    offer(
                        with_count(old_state, topic, next_count),
                        base + gain,
                        Decision {
                            prev_count: old_state[topic],
                            topic,
                            mode: Mode::Join,
                        },
                    );
                }

                // Seed a fresh pool, closing the pending one. Only legal if
                // the pending pool can close (or there was none).
                let pending = old_state[topic];
                let closable = pending == 0
                    || (pending >= params.min_group_size && pending <= params.max_group_size);
                if closable {
                    let penalty = if pending != 0 && pending != params.group_size {
                        params.odd_size_penalty
                    } else {
                        0
                    };
                    for next_count in landing_counts(count, params) {
                        offer(
                            with_count(old_state, topic, next_count),
                            base + gain + penalty,
                            Decision {
                                prev_count: pending,
                                topic,
                                mode: Mode::Split,
                            },
                        );
                    }
                }
            }
        }

        let infeasible = row.is_empty();
        tables.values.push(row);
        tables.decisions.push(row_decisions);
        if infeasible {
            for _ in step + 1..order.len() {
                tables.values.push(HashMap::new());
                tables.decisions.push(HashMap::new());
            }
            break;
        }
    }
    tables
}

/// Applies the trailing-leftover adjustment to every reachable final state
/// and returns all states achieving the best adjusted value, or `None` when
/// no state survives (an infeasible trial).
pub fn best_final_states(
    final_values: &HashMap<State, i64>,
    params: &Params,
) -> Option<(Vec<State>, i64)> {
    let mut best: Option<(Vec<State>, i64)> = None;
    for (state, &value) in final_values {
        let Some(adjustment) = final_adjustment(state, params) else {
            continue;
        };
        let adjusted = value + adjustment;
        match &mut best {
            Some((states, max)) if adjusted == *max => states.push(state.clone()),
            Some((states, max)) if adjusted > *max => {
                *max = adjusted;
                states.clear();
                states.push(state.clone());
            }
            None => best = Some((vec![state.clone()], adjusted)),
            _ => {}
        }
    }
    // Stable order for the caller's tie-pick.
    if let Some((states, _)) = &mut best {
        states.sort_unstable();
    }
    best
}

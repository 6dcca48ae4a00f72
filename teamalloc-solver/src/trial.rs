use anyhow::Result;
use rand::{
    rngs::{SmallRng, StdRng},
    seq::SliceRandom,
    Rng, SeedableRng,
};

use crate::{best_final_states, reconstruct, run_dp};
use teamalloc_core::{Allocation, Instance, Params};

/// One randomized trial: shuffle the processing order, run the DP, pick a
/// best final state and trace it back. `None` means the trial was infeasible.
pub fn run_trial(instance: &Instance, params: &Params, seed: [u8; 32]) -> Option<Allocation> {
    let mut rng = SmallRng::from_seed(seed);
    let mut order: Vec<usize> = (0..instance.groups.len()).collect();
    order.shuffle(&mut rng);

    let tables = run_dp(instance, params, &order, &mut rng);
    let (states, score) = best_final_states(tables.final_values(), params)?;
    let final_state = states.choose(&mut rng).unwrap().clone();
    let project_groups = reconstruct(instance, params, &order, &tables, final_state);
    Some(Allocation {
        score,
        project_groups,
    })
}

/// Runs `params.num_trials` independent trials and keeps the best feasible
/// outcome. The DP is exact only for its chosen processing order, so repeated
/// reshuffles are a heuristic search over that order-sensitivity. Trials run
/// one after another so only a single trial's tables are ever alive at once;
/// `Ok(None)` means every trial was infeasible.
pub fn solve(instance: &Instance, params: &Params, seed: &[u8; 32]) -> Result<Option<Allocation>> {
    params.validate()?;
    instance.validate(params)?;

    let mut master = StdRng::from_seed(*seed);
    let mut best: Option<Allocation> = None;
    for _ in 0..params.num_trials {
        let trial_seed: [u8; 32] = master.gen();
        let Some(outcome) = run_trial(instance, params, trial_seed) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| outcome.score > b.score) {
            best = Some(outcome);
        }
    }
    Ok(best)
}

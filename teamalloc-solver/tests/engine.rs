use rand::{rngs::SmallRng, SeedableRng};
use std::collections::HashMap;
use teamalloc_core::{Choice, Instance, Params, PreferenceGroup};
use teamalloc_solver::{
    best_final_states, final_adjustment, landing_counts, reconstruct, run_dp, Decision, DpTables,
    Mode, State,
};

fn one_topic_params() -> Params {
    Params {
        num_options: 1,
        unspecified_option: false,
        ..Params::default()
    }
}

/// Groups of the given member counts, all wanting the sole topic.
fn one_topic_instance(member_counts: &[u32]) -> Instance {
    let mut groups = Vec::new();
    let mut person = 0;
    for &count in member_counts {
        groups.push(PreferenceGroup {
            members: (person..person + count as usize).collect(),
            choices: vec![Choice::Topic(0)],
        });
        person += count as usize;
    }
    Instance {
        people: (0..person).map(|p| format!("p{}", p)).collect(),
        groups,
    }
}

#[test]
fn test_landing_counts() {
    let params = Params::default(); // target 4, leftover bounds [3, 5]
    assert_eq!(landing_counts(2, &params), vec![2]);
    assert_eq!(landing_counts(4, &params), vec![4]);
    // 5 pending people can stand as-is or roll a complete group off.
    assert_eq!(landing_counts(5, &params), vec![5, 1]);
    // 6 or 7 must roll over.
    assert_eq!(landing_counts(6, &params), vec![2]);
    assert_eq!(landing_counts(7, &params), vec![3]);
}

#[test]
fn test_final_adjustment() {
    let params = Params::default();
    assert_eq!(final_adjustment(&vec![0, 4, 0], &params), Some(0));
    // Legal leftover groups each cost the odd-size penalty.
    assert_eq!(final_adjustment(&vec![3, 4, 5], &params), Some(-6));
    // A pending pool of 1 or 2 can never close.
    assert_eq!(final_adjustment(&vec![1, 0, 0], &params), None);
    assert_eq!(final_adjustment(&vec![0, 2, 4], &params), None);
}

#[test]
fn test_dp_four_singletons() {
    let params = one_topic_params();
    let instance = one_topic_instance(&[1, 1, 1, 1]);
    let order: Vec<usize> = (0..4).collect();
    let mut rng = SmallRng::seed_from_u64(7);
    let tables = run_dp(&instance, &params, &order, &mut rng);

    // Either all four accumulate (value 32), or the last one splits off a
    // pool of 3 (24 + 8 - 3 = 29).
    let expected: HashMap<State, i64> = HashMap::from([(vec![4], 32), (vec![1], 29)]);
    assert_eq!(tables.final_values(), &expected);

    let (states, score) = best_final_states(tables.final_values(), &params).unwrap();
    assert_eq!(states, vec![vec![4]]);
    assert_eq!(score, 32);

    let project_groups = reconstruct(&instance, &params, &order, &tables, vec![4]);
    assert_eq!(project_groups.len(), 1);
    let mut ids = project_groups[0].group_ids.clone();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(project_groups[0].topic, 0);
}

#[test]
fn test_dp_is_reproducible_for_fixed_seed() {
    let params = Params::default();
    let instance = one_topic_instance(&[2, 1, 2, 1, 2, 2]);
    // Give every group free topic choice to get a non-trivial table.
    let instance = Instance {
        people: instance.people,
        groups: instance
            .groups
            .into_iter()
            .map(|g| PreferenceGroup {
                members: g.members,
                choices: vec![Choice::Topic(0), Choice::Topic(3), Choice::Any],
            })
            .collect(),
    };
    let order: Vec<usize> = (0..instance.groups.len()).collect();

    let a = run_dp(&instance, &params, &order, &mut SmallRng::seed_from_u64(11));
    let b = run_dp(&instance, &params, &order, &mut SmallRng::seed_from_u64(11));
    assert_eq!(a.values, b.values);
    assert_eq!(a.decisions, b.decisions);
}

#[test]
fn test_dp_abandons_infeasible_step() {
    let params = one_topic_params();
    // Once a step produces no reachable state, the rest of the run is
    // skipped and the trial reports infeasibility.
    let instance = Instance {
        people: (0..2).map(|p| format!("p{}", p)).collect(),
        groups: vec![
            PreferenceGroup {
                members: vec![0],
                choices: vec![Choice::Topic(0)],
            },
            // This group refuses the only topic: no transition exists.
            PreferenceGroup {
                members: vec![1],
                choices: vec![],
            },
        ],
    };
    let order = vec![0, 1];
    let tables = run_dp(&instance, &params, &order, &mut SmallRng::seed_from_u64(3));
    assert!(tables.final_values().is_empty());
    assert!(best_final_states(tables.final_values(), &params).is_none());
}

#[test]
fn test_best_final_states_ties() {
    let params = one_topic_params();
    let finals: HashMap<State, i64> = HashMap::from([(vec![0], 10), (vec![4], 10), (vec![3], 12)]);
    // The pool of 3 is adjusted down to 9; the other two tie at 10.
    let (states, score) = best_final_states(&finals, &params).unwrap();
    assert_eq!(score, 10);
    assert_eq!(states, vec![vec![0], vec![4]]);
}

/// Hand-built decision history with no ambiguity: accumulate, split, then
/// accumulate again.
#[test]
fn test_traceback_split() {
    let params = one_topic_params();
    let instance = one_topic_instance(&[2, 2, 2, 2]);
    let order: Vec<usize> = (0..4).collect();
    let join = |prev_count: u32| Decision {
        prev_count,
        topic: 0,
        mode: Mode::Join,
    };
    let tables = DpTables {
        values: vec![HashMap::new(); 5],
        decisions: vec![
            HashMap::new(),
            HashMap::from([(vec![2], join(0))]),
            HashMap::from([(vec![4], join(2))]),
            HashMap::from([(
                vec![2],
                Decision {
                    prev_count: 4,
                    topic: 0,
                    mode: Mode::Split,
                },
            )]),
            HashMap::from([(vec![4], join(2))]),
        ],
    };
    let mut groups = reconstruct(&instance, &params, &order, &tables, vec![4]);
    for pg in &mut groups {
        pg.group_ids.sort_unstable();
    }
    groups.sort_by(|a, b| a.group_ids.cmp(&b.group_ids));
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].group_ids, vec![0, 1]);
    assert_eq!(groups[1].group_ids, vec![2, 3]);
}

/// A roll-down history (pool of 3 dropping to 1): the closed group of four
/// must take the current pair plus two people of the old pool, leaving the
/// old pool's one-person group behind. Forward: g0 (1 person) -> pool 1,
/// g1 (pair) -> pool 3, g2 (pair) -> rollover to 1, g3 (pair) -> pool 3.
#[test]
fn test_traceback_roll_down_swaps_in_singleton() {
    let params = one_topic_params();
    let instance = one_topic_instance(&[1, 2, 2, 2]);
    let order: Vec<usize> = (0..4).collect();
    let join = |prev_count: u32| Decision {
        prev_count,
        topic: 0,
        mode: Mode::Join,
    };
    let tables = DpTables {
        values: vec![HashMap::new(); 5],
        decisions: vec![
            HashMap::new(),
            HashMap::from([(vec![1], join(0))]),
            HashMap::from([(vec![3], join(1))]),
            HashMap::from([(vec![1], join(3))]),
            HashMap::from([(vec![3], join(1))]),
        ],
    };
    let mut groups = reconstruct(&instance, &params, &order, &tables, vec![3]);
    for pg in &mut groups {
        pg.group_ids.sort_unstable();
    }
    groups.sort_by(|a, b| a.group_ids.cmp(&b.group_ids));
    assert_eq!(groups.len(), 2);
    // The singleton g0 ends up with g3 (3 people), g1 with g2 (4 people).
    assert_eq!(groups[0].group_ids, vec![0, 3]);
    assert_eq!(groups[1].group_ids, vec![1, 2]);
}

/// An over-full pool shrinking (5 -> 3) defers its closure until the walk
/// reaches the step where the pool last stood at the target size. Forward:
/// g0 (pair) -> 2, g1 (pair) -> 4, g2 (1 person) -> 5, g3 (pair) -> 7 rolls
/// over to 3.
#[test]
fn test_traceback_overfull_carry() {
    let params = one_topic_params();
    let instance = one_topic_instance(&[2, 2, 1, 2]);
    let order: Vec<usize> = (0..4).collect();
    let join = |prev_count: u32| Decision {
        prev_count,
        topic: 0,
        mode: Mode::Join,
    };
    let tables = DpTables {
        values: vec![HashMap::new(); 5],
        decisions: vec![
            HashMap::new(),
            HashMap::from([(vec![2], join(0))]),
            HashMap::from([(vec![4], join(2))]),
            HashMap::from([(vec![5], join(4))]),
            HashMap::from([(vec![3], join(5))]),
        ],
    };
    let mut groups = reconstruct(&instance, &params, &order, &tables, vec![3]);
    for pg in &mut groups {
        pg.group_ids.sort_unstable();
    }
    groups.sort_by(|a, b| a.group_ids.cmp(&b.group_ids));
    assert_eq!(groups.len(), 2);
    // The group of four that closed at the rollover is g0 + g1; the trailing
    // pool of three is g2 + g3.
    assert_eq!(groups[0].group_ids, vec![0, 1]);
    assert_eq!(groups[1].group_ids, vec![2, 3]);
}

use teamalloc_core::Params;

/// One pending count per topic: how many people are routed toward the topic
/// but not yet closed into a finished project group. Counts never exceed
/// `max_group_size`.
pub type State = Vec<u32>;

pub fn zero_state(params: &Params) -> State {
    vec![0; params.num_topics()]
}

/// Valid pending counts after `amount` people have accumulated at a topic.
///
/// The count stands as-is while it fits under `max_group_size`; once it
/// exceeds the target size there is also the rollover reading, where exactly
/// `group_size` of the accumulated people close off into a finished group and
/// the remainder keeps accumulating. Both are offered as successors.
pub fn landing_counts(amount: u32, params: &Params) -> Vec<u32> {
    let mut counts = Vec::with_capacity(2);
    if amount <= params.max_group_size {
        counts.push(amount);
    }
    if amount > params.group_size {
        counts.push(amount % params.group_size);
    }
    counts
}

pub fn with_count(state: &State, topic: usize, count: u32) -> State {
    let mut next = state.clone();
    next[topic] = count;
    next
}

/// Trailing adjustment for a final state: complete or empty topics cost
/// nothing, a legal leftover group costs the odd-size penalty, and anything
/// else makes the state infeasible.
pub fn final_adjustment(state: &State, params: &Params) -> Option<i64> {
    let mut adjustment = 0;
    for &count in state {
        if count == 0 || count == params.group_size {
            continue;
        }
        if count >= params.min_group_size && count <= params.max_group_size {
            adjustment += params.odd_size_penalty;
        } else {
            return None;
        }
    }
    Some(adjustment)
}

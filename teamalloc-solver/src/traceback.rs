use crate::{DpTables, Mode, State};
use teamalloc_core::{Instance, Params, ProjectGroup};

/// Backward bookkeeping for one topic.
///
/// `pending` holds the preference-groups of the pool currently being
/// reassembled, most recently walked first. The two deferral fields carry the
/// rollover ambiguities across steps:
///
/// * `deferred` is armed by a roll-down join (a pending count dropping below
///   its predecessor without passing the target size). The forward run must
///   have contained a one-person group among the old pool; until the backward
///   walk meets it, the outer pool waits here.
/// * `carry` is armed when an over-full pool shrinks (e.g. 5 -> 2): its
///   closure belongs to an earlier step that will show a full pending count.
#[derive(Debug, Default)]
struct TopicTrace {
    pending: Vec<usize>,
    deferred: Option<Vec<usize>>,
    carry: bool,
}

impl TopicTrace {
    /// Closes the whole pending stack as one finished project group.
    fn close(&mut self, topic: usize, out: &mut Vec<ProjectGroup>) {
        if !self.pending.is_empty() {
            out.push(ProjectGroup {
                group_ids: std::mem::take(&mut self.pending),
                topic,
            });
        }
    }
}

/// Walks the decision history backward from `final_state`, reassembling the
/// concrete project groups behind the DP solution. `order` is the processing
/// order the DP ran with; entries of the result refer to instance group ids.
pub fn reconstruct(
    instance: &Instance,
    params: &Params,
    order: &[usize],
    tables: &DpTables,
    final_state: State,
) -> Vec<ProjectGroup> {
    let mut out = Vec::new();
    let mut traces: Vec<TopicTrace> = (0..params.num_topics())
        .map(|_| TopicTrace::default())
        .collect();

    let mut state = final_state;
    for step in (0..order.len()).rev() {
        let decision = tables.decisions[step + 1][&state];
        let topic = decision.topic;
        let gid = order[step];
        let old = decision.prev_count;
        let new = state[topic];
        let trace = &mut traces[topic];

        // A one-person group resolves an armed roll-down: it completes the
        // deferred outer pool instead of the current one.
        if trace.deferred.is_some() && instance.groups[gid].member_count() == 1 {
            let mut outer = trace.deferred.take().unwrap();
            outer.push(gid);
            out.push(ProjectGroup {
                group_ids: outer,
                topic,
            });
        } else {
            trace.pending.push(gid);
        }

        match decision.mode {
            Mode::Split => trace.close(topic, &mut out),
            Mode::Join => {
                if old == 0 {
                    trace.close(topic, &mut out);
                } else if old == params.group_size {
                    if new < old {
                        // Rollover: the pool this group seeded is complete.
                        trace.close(topic, &mut out);
                    } else if trace.carry {
                        // The over-full pool whose closure was deferred.
                        trace.close(topic, &mut out);
                        trace.carry = false;
                    }
                } else if old < params.group_size
                    && ((0 < new && new < old) || (new > params.group_size && trace.carry))
                {
                    // Roll-down from a partial count: an earlier rollover
                    // split a backlog across two pools, one of which must end
                    // in a one-person group.
                    if trace.deferred.is_some() {
                        // Another roll-down before a one-person group showed
                        // up: rotate, closing everything below the current
                        // group, and keep waiting.
                        let current = trace.pending.pop().unwrap();
                        trace.close(topic, &mut out);
                        trace.pending.push(current);
                    } else {
                        let outer = trace.pending[..trace.pending.len() - 1].to_vec();
                        trace.deferred = Some(outer);
                        trace.pending = vec![gid];
                    }
                    if new > params.group_size && trace.carry {
                        trace.carry = false;
                    }
                } else if old > params.group_size && new < old {
                    trace.carry = true;
                }
            }
        }

        state[topic] = decision.prev_count;
    }

    // A correct history leaves only plain pending pools; flush them (and any
    // still-armed deferred stack) so no group is ever dropped.
    for (topic, trace) in traces.iter_mut().enumerate() {
        trace.close(topic, &mut out);
        if let Some(deferred) = trace.deferred.take() {
            if !deferred.is_empty() {
                out.push(ProjectGroup {
                    group_ids: deferred,
                    topic,
                });
            }
        }
    }
    out
}

//! Step-indexed reachability over kept edges, pruned by a distance floor.
//!
//! `R[i][v]` says "v is reachable from the root crossing at most i kept
//! edges". The variable only exists where the floor allows it: anything the
//! metric proves farther than `i` raw hops can never be reached by step `i`,
//! so whole shells of variables and clauses drop out before the engine sees
//! them. Within the ball, forward clauses push reachability outward and a
//! keyed reached-through witness per (root, step, neighbor, node) caps it
//! from above, so asserting either polarity of `R` is sound. Every rail is
//! keyed by its root: encoding demands for several roots into one formula
//! shares only the kept-edge vars, never the reachability vars.

use std::collections::{HashMap, VecDeque};

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use unordered_pair::UnorderedPair;

use crate::formula::{Formula, Key};
use crate::net::NodeId;

/// A conservative floor on kept-edge distance, used to prune the
/// step-indexed reachability encoding.
///
/// `floor(from, to)` must never exceed the true shortest-path hop count from
/// `from` to `to` over any *subset* of the adjacency. Raw-adjacency BFS is
/// the exact such floor and the default; lattice shapes offer cheaper
/// geometric ones like [`Manhattan`](crate::lattice::Manhattan).
pub trait LowerBound {
    /// The bound. Return [`u32::MAX`] for "provably unreachable".
    fn floor(&self, from: NodeId, to: NodeId) -> u32;
}

impl<F> LowerBound for F
where
    F: Fn(NodeId, NodeId) -> u32,
{
    fn floor(&self, from: NodeId, to: NodeId) -> u32 {
        self(from, to)
    }
}

/// The default floor: exact BFS over the raw adjacency from one source.
///
/// Kept edges are a subset of the adjacency, so this is always sound, and no
/// sound floor prunes harder. Distances from any other source answer 0.
pub(crate) struct AdjacencyFloor {
    from: NodeId,
    dist: HashMap<NodeId, u32>,
}

impl AdjacencyFloor {
    pub(crate) fn new(graph: &UnGraphMap<NodeId, ()>, from: NodeId) -> Self {
        let mut dist = HashMap::new();
        let mut queue = VecDeque::new();
        if graph.contains_node(from) {
            dist.insert(from, 0);
            queue.push_back(from);
        }
        while let Some(node) = queue.pop_front() {
            let here = dist[&node];
            for next in graph.neighbors(node) {
                if !dist.contains_key(&next) {
                    dist.insert(next, here + 1);
                    queue.push_back(next);
                }
            }
        }

        Self { from, dist }
    }
}

impl LowerBound for AdjacencyFloor {
    fn floor(&self, from: NodeId, to: NodeId) -> u32 {
        if from == self.from {
            self.dist.get(&to).copied().unwrap_or(u32::MAX)
        } else {
            0
        }
    }
}

/// Encode reachability demands measured from `root`.
///
/// `min_distance` entries `(target, d)` assert the target is *not* reachable
/// within `d - 1` kept edges, i.e. its BFS distance is at least `d` (or it is
/// unreachable outright). `reach_within` entries `(target, d)` assert the
/// target *is* reachable within `d` kept edges. Distances beyond the node
/// count clamp to "unreachable at all" / "reachable at all"; demands the
/// floor already guarantees are dropped; demands the floor refutes poison
/// the formula.
pub(crate) fn encode(
    formula: &mut Formula,
    graph: &UnGraphMap<NodeId, ()>,
    root: NodeId,
    min_distance: &[(NodeId, u32)],
    reach_within: &[(NodeId, u32)],
    floor: &dyn LowerBound,
) {
    let n = graph.node_count() as u32;
    let floors: HashMap<NodeId, u32> = graph.nodes()
        .map(|node| (node, floor.floor(root, node)))
        .collect();

    // (target, step) pairs to refute / to assert once steps are built
    let mut refute = Vec::new();
    for &(target, d) in min_distance {
        if d == 0 {
            continue;
        }
        let step = d.min(n) - 1;
        if floors[&target] > step {
            // the metric already puts the target out of range
            continue;
        }
        refute.push((target, step));
    }

    let mut affirm = Vec::new();
    for &(target, d) in reach_within {
        let step = d.min(n.saturating_sub(1));
        if floors[&target] > step {
            formula.poison(format!("node {target} cannot be reached within {step} edges"));
            continue;
        }
        affirm.push((target, step));
    }

    let max_step = match refute.iter().chain(&affirm).map(|&(_, step)| step).max() {
        None => return,
        Some(max) => max,
    };

    // step 0: the root alone
    for node in graph.nodes().filter(|node| floors[node] == 0) {
        let reached = formula.var(Key::Reach { root, step: 0, node });
        formula.add_clause([reached.lit(node == root)]);
    }

    for step in 1..=max_step {
        let shell = graph.nodes().filter(|node| floors[node] <= step).collect_vec();
        for node in shell {
            let reached = formula.var(Key::Reach { root, step, node }).positive();
            let mut sources = vec![!reached];

            if floors[&node] <= step - 1 {
                // once reached, stays reached
                let before = formula.var(Key::Reach { root, step: step - 1, node }).positive();
                formula.implies(before, reached);
                sources.push(before);
            }

            for via in graph.neighbors(node).filter(|via| floors[via] <= step - 1).collect_vec() {
                let via_before = formula.var(Key::Reach { root, step: step - 1, node: via }).positive();
                let kept = formula.var(Key::Kept(UnorderedPair(via, node))).positive();

                // a reached neighbor with a kept edge reaches this node
                formula.add_clause([!via_before, !kept, reached]);

                // and conversely, being reached names a witness
                let through = formula.var(Key::Through { root, step, via, node }).positive();
                formula.implies(through, via_before);
                formula.implies(through, kept);
                sources.push(through);
            }

            formula.add_clause(sources);
        }
    }

    for (target, step) in refute {
        let reached = formula.var(Key::Reach { root, step, node: target });
        formula.add_clause([reached.negative()]);
    }
    for (target, step) in affirm {
        let reached = formula.var(Key::Reach { root, step, node: target });
        formula.add_clause([reached.positive()]);
    }
}
